use macroquad::prelude::*;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GridIndex {
    pub x: i32,
    pub y: i32,
}

impl GridIndex {
    pub fn new(position: Vec2, tile_size: f32) -> Self {
        Self {
            x: (position.x / tile_size).floor() as i32,
            y: (position.y / tile_size).floor() as i32,
        }
    }
}

/// Playable area in tiles. Moving bodies are kept inside it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MapBounds {
    pub width: usize,
    pub height: usize,
    pub tile_size: f32,
}

impl MapBounds {
    pub fn new(width: usize, height: usize, tile_size: f32) -> Self {
        Self {
            width,
            height,
            tile_size,
        }
    }

    pub fn pixel_size(&self) -> Vec2 {
        vec2(
            self.width as f32 * self.tile_size,
            self.height as f32 * self.tile_size,
        )
    }

    pub fn rect(&self) -> Rect {
        let size = self.pixel_size();
        Rect::new(0.0, 0.0, size.x, size.y)
    }

    pub fn tile_bounds(&self, x: usize, y: usize) -> Rect {
        Rect::new(
            x as f32 * self.tile_size,
            y as f32 * self.tile_size,
            self.tile_size,
            self.tile_size,
        )
    }

    pub fn grid_index(&self, position: Vec2) -> Option<GridIndex> {
        let idx = GridIndex::new(position, self.tile_size);
        if idx.x < 0 || idx.y < 0 {
            return None;
        }
        let (x, y) = (idx.x as usize, idx.y as usize);
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(idx)
    }

    /// Position that keeps a bounding box of `size`, sitting at `offset`
    /// from the entity origin, inside the map. The left/top edge wins when
    /// the box is larger than the map.
    pub fn clamp_position(&self, pos: Vec2, size: Vec2, offset: Vec2) -> Vec2 {
        let map = self.pixel_size();
        vec2(
            pos.x.min(map.x - size.x + offset.x).max(offset.x),
            pos.y.min(map.y - size.y + offset.y).max(offset.y),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_index_rejects_outside_points() {
        let bounds = MapBounds::new(4, 3, 16.0);
        assert_eq!(bounds.grid_index(vec2(17.0, 47.9)), Some(GridIndex { x: 1, y: 2 }));
        assert_eq!(bounds.grid_index(vec2(-0.1, 0.0)), None);
        assert_eq!(bounds.grid_index(vec2(64.0, 0.0)), None);
    }

    #[test]
    fn clamp_accounts_for_box_offset() {
        let bounds = MapBounds::new(10, 8, 16.0);
        let offset = vec2(-2.0, 0.0);
        let size = vec2(13.0, 16.0);

        assert_eq!(bounds.clamp_position(vec2(200.0, 50.0), size, offset), vec2(160.0 - 13.0 - 2.0, 50.0));
        assert_eq!(bounds.clamp_position(vec2(-5.0, -1.0), size, offset), vec2(-2.0, 0.0));
        assert_eq!(bounds.clamp_position(vec2(40.0, 40.0), size, offset), vec2(40.0, 40.0));
    }

    #[test]
    fn oversized_box_sticks_to_origin() {
        let bounds = MapBounds::new(1, 1, 16.0);
        assert_eq!(bounds.clamp_position(vec2(5.0, 5.0), vec2(32.0, 32.0), Vec2::ZERO), Vec2::ZERO);
    }
}
