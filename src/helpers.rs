use macroquad::prelude::*;

/// Offset that centers something of size `inner` inside `outer`.
pub fn calc_center(inner: Vec2, outer: Vec2) -> Vec2 {
    outer / 2.0 - inner / 2.0
}

/// Grid coordinates to pixels.
pub fn calc_scaled_pos(x: f32, y: f32, scale: f32) -> Vec2 {
    vec2(x * scale, y * scale)
}

pub fn random_true(chance: f32) -> bool {
    macroquad::rand::gen_range(0.0, 1.0) < chance
}

/// Translucent red box over a bounding box.
pub fn draw_hitbox(hitbox: Rect) {
    draw_rectangle(hitbox.x, hitbox.y, hitbox.w, hitbox.h, Color::new(1.0, 0.0, 0.0, 0.3));
    draw_rectangle_lines(hitbox.x, hitbox.y, hitbox.w, hitbox.h, 0.5, RED);
}

/// Stable flat color for a frame name, used in place of sprite art.
pub fn frame_color(frame: &str) -> Color {
    let hash = frame
        .bytes()
        .fold(0x811c_9dc5_u32, |acc, b| (acc ^ u32::from(b)).wrapping_mul(0x0100_0193));
    let channel = |shift: u32| 0.25 + ((hash >> shift) & 0xFF) as f32 / 255.0 * 0.6;
    Color::new(channel(0), channel(8), channel(16), 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn centers_inner_box() {
        assert_eq!(calc_center(vec2(10.0, 4.0), vec2(16.0, 16.0)), vec2(3.0, 6.0));
        assert_eq!(calc_center(Vec2::ZERO, vec2(16.0, 8.0)), vec2(8.0, 4.0));
    }

    #[test]
    fn scales_grid_position() {
        assert_eq!(calc_scaled_pos(2.0, 6.0, 16.0), vec2(32.0, 96.0));
    }

    #[test]
    fn random_true_extremes() {
        assert!(!random_true(0.0));
        assert!(random_true(1.0));
    }

    #[test]
    fn frame_color_is_stable() {
        assert_eq!(frame_color("wall"), frame_color("wall"));
        assert_ne!(frame_color("wall"), frame_color("floor_tile"));
    }
}
