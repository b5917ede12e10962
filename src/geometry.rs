//! Positioned, sized scene entities and their optional visual delegate.

use macroquad::prelude::*;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_NAME: AtomicU64 = AtomicU64::new(0);

fn generated_name() -> String {
    format!("entity-{}", NEXT_NAME.fetch_add(1, Ordering::Relaxed))
}

/// Stand-in for a sprite: the renderer draws it, the runtime reads and writes
/// geometry through it.
#[derive(Clone, Debug, PartialEq)]
pub struct VisualProxy {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub z: f32,
    pub scale: Vec2,
    pub frame: String,
}

impl VisualProxy {
    pub fn new(frame: impl Into<String>, rect: Rect) -> Self {
        Self {
            x: rect.x,
            y: rect.y,
            width: rect.w,
            height: rect.h,
            z: 0.0,
            scale: Vec2::ONE,
            frame: frame.into(),
        }
    }
}

/// `z = round((y + height) * multiplier) + offset`
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ZBinding {
    pub multiplier: f32,
    pub offset: f32,
}

impl Default for ZBinding {
    fn default() -> Self {
        Self {
            multiplier: 1.0,
            offset: 0.0,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Geometry {
    pub x: Option<f32>,
    pub y: Option<f32>,
    pub width: Option<f32>,
    pub height: Option<f32>,
    pub z: Option<f32>,
}

impl Geometry {
    pub fn from_rect(rect: Rect) -> Self {
        Self {
            x: Some(rect.x),
            y: Some(rect.y),
            width: Some(rect.w),
            height: Some(rect.h),
            z: None,
        }
    }
}

#[derive(Clone, Copy)]
enum Field {
    X,
    Y,
    Width,
    Height,
    Z,
}

#[derive(Clone, Debug)]
pub struct SceneEntity {
    name: String,
    ident: Option<String>,
    geometry: Geometry,
    proxy: Option<VisualProxy>,
    mirror_target: Option<Vec2>,
    visible: bool,
    z_binding: Option<ZBinding>,
    force_z_int: bool,
}

impl Default for SceneEntity {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneEntity {
    pub fn new() -> Self {
        Self {
            name: generated_name(),
            ident: None,
            geometry: Geometry::default(),
            proxy: None,
            mirror_target: None,
            visible: true,
            z_binding: None,
            force_z_int: true,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_ident(mut self, ident: impl Into<String>) -> Self {
        self.ident = Some(ident.into());
        self
    }

    pub fn with_geometry(mut self, rect: Rect) -> Self {
        self.geometry = Geometry::from_rect(rect);
        self
    }

    pub fn with_proxy(mut self, proxy: VisualProxy) -> Self {
        self.proxy = Some(proxy);
        self
    }

    /// Mirroring flips this scale instead of the proxy's, e.g. an inner sprite.
    pub fn with_mirror_target(mut self, scale: Vec2) -> Self {
        self.mirror_target = Some(scale);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ident(&self) -> Option<&str> {
        self.ident.as_deref()
    }

    pub fn set_ident(&mut self, ident: Option<String>) {
        self.ident = ident;
    }

    pub fn proxy(&self) -> Option<&VisualProxy> {
        self.proxy.as_ref()
    }

    pub fn proxy_mut(&mut self) -> Option<&mut VisualProxy> {
        self.proxy.as_mut()
    }

    pub fn frame(&self) -> Option<&str> {
        self.proxy.as_ref().map(|proxy| proxy.frame.as_str())
    }

    /// Own geometry only, without falling back to the proxy.
    pub fn geometry(&self) -> Geometry {
        self.geometry
    }

    fn read(&self, field: Field) -> f32 {
        let own = match field {
            Field::X => self.geometry.x,
            Field::Y => self.geometry.y,
            Field::Width => self.geometry.width,
            Field::Height => self.geometry.height,
            Field::Z => self.geometry.z,
        };
        own.or_else(|| {
            self.proxy.as_ref().map(|proxy| match field {
                Field::X => proxy.x,
                Field::Y => proxy.y,
                Field::Width => proxy.width,
                Field::Height => proxy.height,
                Field::Z => proxy.z,
            })
        })
        .unwrap_or(0.0)
    }

    fn write(&mut self, field: Field, value: f32) {
        if let Some(proxy) = self.proxy.as_mut() {
            match field {
                Field::X => proxy.x = value,
                Field::Y => proxy.y = value,
                Field::Width => proxy.width = value,
                Field::Height => proxy.height = value,
                Field::Z => proxy.z = value,
            }
            return;
        }
        let slot = match field {
            Field::X => &mut self.geometry.x,
            Field::Y => &mut self.geometry.y,
            Field::Width => &mut self.geometry.width,
            Field::Height => &mut self.geometry.height,
            Field::Z => &mut self.geometry.z,
        };
        *slot = Some(value);
    }

    pub fn x(&self) -> f32 {
        self.read(Field::X)
    }

    pub fn y(&self) -> f32 {
        self.read(Field::Y)
    }

    pub fn width(&self) -> f32 {
        self.read(Field::Width)
    }

    pub fn height(&self) -> f32 {
        self.read(Field::Height)
    }

    pub fn z(&self) -> f32 {
        self.read(Field::Z)
    }

    pub fn set_x(&mut self, x: f32) {
        self.write(Field::X, x);
    }

    pub fn set_y(&mut self, y: f32) {
        self.write(Field::Y, y);
    }

    pub fn set_width(&mut self, width: f32) {
        self.write(Field::Width, width);
    }

    pub fn set_height(&mut self, height: f32) {
        self.write(Field::Height, height);
    }

    pub fn set_z(&mut self, z: f32) {
        let z = if self.force_z_int { z.round() } else { z };
        self.write(Field::Z, z);
    }

    pub fn set_force_z_int(&mut self, force: bool) {
        self.force_z_int = force;
    }

    pub fn position(&self) -> Vec2 {
        vec2(self.x(), self.y())
    }

    pub fn set_position(&mut self, pos: Vec2) {
        self.set_x(pos.x);
        self.set_y(pos.y);
    }

    pub fn rect(&self) -> Rect {
        Rect::new(self.x(), self.y(), self.width(), self.height())
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    /// Scale whose sign says which way the entity faces.
    pub fn facing_scale(&self) -> Vec2 {
        self.mirror_target
            .or_else(|| self.proxy.as_ref().map(|proxy| proxy.scale))
            .unwrap_or(Vec2::ONE)
    }

    fn facing_scale_mut(&mut self) -> Option<&mut Vec2> {
        match (&mut self.mirror_target, &mut self.proxy) {
            (Some(scale), _) => Some(scale),
            (None, Some(proxy)) => Some(&mut proxy.scale),
            (None, None) => None,
        }
    }

    /// Flips horizontally. With `Some(sign)` the scale is only flipped when its
    /// sign differs from `sign`. Returns whether anything flipped.
    pub fn mirror_x(&mut self, sign: Option<f32>) -> bool {
        let Some(scale) = self.facing_scale_mut() else {
            return false;
        };
        if let Some(sign) = sign {
            if sign == 0.0 || scale.x.signum() == sign.signum() {
                return false;
            }
        }
        scale.x = -scale.x;
        true
    }

    pub fn bind_z_to_y(&mut self, binding: ZBinding) {
        self.z_binding = Some(binding);
        self.update_bound_z();
    }

    pub fn unbind_z(&mut self) {
        self.z_binding = None;
    }

    pub fn z_binding(&self) -> Option<ZBinding> {
        self.z_binding
    }

    /// Recomputes z from the current bottom edge when bound.
    pub fn update_bound_z(&mut self) -> bool {
        let Some(binding) = self.z_binding else {
            return false;
        };
        let z = ((self.y() + self.height()) * binding.multiplier).round() + binding.offset;
        self.set_z(z);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_fall_back_to_proxy_then_zero() {
        let bare = SceneEntity::new();
        assert_eq!(bare.rect(), Rect::new(0.0, 0.0, 0.0, 0.0));

        let proxied = SceneEntity::new().with_proxy(VisualProxy::new("torch", Rect::new(3.0, 4.0, 16.0, 32.0)));
        assert_eq!(proxied.rect(), Rect::new(3.0, 4.0, 16.0, 32.0));
        assert_eq!(proxied.frame(), Some("torch"));
    }

    #[test]
    fn writes_go_to_proxy_when_present() {
        let mut entity = SceneEntity::new().with_proxy(VisualProxy::new("wall", Rect::new(0.0, 0.0, 16.0, 16.0)));
        entity.set_position(vec2(8.0, 12.0));

        assert_eq!(entity.geometry(), Geometry::default());
        assert_eq!(entity.proxy().map(|p| (p.x, p.y)), Some((8.0, 12.0)));
        assert_eq!(entity.position(), vec2(8.0, 12.0));
    }

    #[test]
    fn own_geometry_wins_over_proxy() {
        let entity = SceneEntity::new()
            .with_proxy(VisualProxy::new("floor", Rect::new(0.0, 0.0, 16.0, 16.0)))
            .with_geometry(Rect::new(1.0, 2.0, 3.0, 4.0));
        assert_eq!(entity.rect(), Rect::new(1.0, 2.0, 3.0, 4.0));
    }

    #[test]
    fn default_names_are_unique() {
        let a = SceneEntity::new();
        let b = SceneEntity::new();
        assert_ne!(a.name(), b.name());
        assert_eq!(SceneEntity::new().with_name("door").name(), "door");
    }

    #[test]
    fn mirror_prefers_target_and_respects_sign() {
        let mut entity = SceneEntity::new()
            .with_proxy(VisualProxy::new("player", Rect::new(0.0, 0.0, 16.0, 16.0)))
            .with_mirror_target(Vec2::ONE);

        assert!(!entity.mirror_x(Some(1.0)));
        assert!(entity.mirror_x(Some(-1.0)));
        assert_eq!(entity.facing_scale().x, -1.0);
        assert_eq!(entity.proxy().map(|p| p.scale.x), Some(1.0));
        assert!(entity.mirror_x(None));
        assert_eq!(entity.facing_scale().x, 1.0);

        assert!(!SceneEntity::new().mirror_x(None));
    }

    #[test]
    fn bound_z_follows_bottom_edge() {
        let mut entity = SceneEntity::new().with_proxy(VisualProxy::new("npc", Rect::new(0.0, 10.3, 16.0, 16.0)));
        entity.bind_z_to_y(ZBinding { multiplier: 1.0, offset: 2.0 });
        assert_eq!(entity.z(), 28.0);

        entity.set_y(40.0);
        assert!(entity.update_bound_z());
        assert_eq!(entity.z(), 58.0);

        entity.unbind_z();
        entity.set_y(0.0);
        assert!(!entity.update_bound_z());
        assert_eq!(entity.z(), 58.0);
    }
}
