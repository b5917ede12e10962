use macroquad::prelude::*;
use serde::Deserialize;
use std::f32::consts::FRAC_PI_4;

use crate::event::{Callback, EventKind, ListenerId, ListenerOptions, Listeners, VelocityAxes};
use crate::geometry::SceneEntity;

/// Tiles per second on each axis.
#[derive(Clone, Copy, Debug, Default, PartialEq, Deserialize)]
pub struct Velocity {
    pub vx: f32,
    pub vy: f32,
}

impl Velocity {
    pub const ZERO: Velocity = Velocity { vx: 0.0, vy: 0.0 };
    pub const UNBOUNDED: Velocity = Velocity {
        vx: f32::INFINITY,
        vy: f32::INFINITY,
    };

    pub const fn new(vx: f32, vy: f32) -> Self {
        Self { vx, vy }
    }

    pub fn is_zero(self) -> bool {
        self.vx == 0.0 && self.vy == 0.0
    }

    /// Scales diagonal movement so it is not faster than straight movement.
    pub fn smooth_circular(self) -> Self {
        if self.vx != 0.0 && self.vy != 0.0 {
            Self::new(self.vx * FRAC_PI_4, self.vy * FRAC_PI_4)
        } else {
            self
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoundingBoxMode {
    /// Values replace the entity's own rectangle.
    #[default]
    Absolute,
    /// Position is added to the entity's, size replaces it.
    Relative,
    /// Every value is added to the entity's rectangle; mirroring reflects the inset.
    Offset,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct BoundingBoxSpec {
    pub x: Option<f32>,
    pub y: Option<f32>,
    pub width: Option<f32>,
    pub height: Option<f32>,
}

impl BoundingBoxSpec {
    pub fn inset(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            width: Some(width),
            height: Some(height),
        }
    }

    fn merge(&mut self, other: BoundingBoxSpec) {
        self.x = other.x.or(self.x);
        self.y = other.y.or(self.y);
        self.width = other.width.or(self.width);
        self.height = other.height.or(self.height);
    }
}

/// A scene entity that moves, has a bounding box and receives events.
#[derive(Debug)]
pub struct InteractableEntity {
    base: SceneEntity,
    velocity: Velocity,
    pub max_velocity: Velocity,
    bbox: BoundingBoxSpec,
    bbox_mode: BoundingBoxMode,
    collidable: bool,
    listeners: Listeners,
}

impl Default for InteractableEntity {
    fn default() -> Self {
        Self::new()
    }
}

impl InteractableEntity {
    pub fn new() -> Self {
        Self::from_scene(SceneEntity::new())
    }

    pub fn from_scene(base: SceneEntity) -> Self {
        Self {
            base,
            velocity: Velocity::ZERO,
            max_velocity: Velocity::UNBOUNDED,
            bbox: BoundingBoxSpec::default(),
            bbox_mode: BoundingBoxMode::Absolute,
            collidable: true,
            listeners: Listeners::default(),
        }
    }

    pub fn with_bounding_box(mut self, spec: BoundingBoxSpec, mode: BoundingBoxMode) -> Self {
        self.set_bounding_box(spec, mode);
        self
    }

    pub fn with_max_velocity(mut self, max: Velocity) -> Self {
        self.max_velocity = max;
        self
    }

    pub fn base(&self) -> &SceneEntity {
        &self.base
    }

    pub fn base_mut(&mut self) -> &mut SceneEntity {
        &mut self.base
    }

    pub fn position(&self) -> Vec2 {
        self.base.position()
    }

    pub fn set_position(&mut self, pos: Vec2) {
        self.base.set_position(pos);
    }

    pub fn is_visible(&self) -> bool {
        self.base.is_visible()
    }

    pub fn is_collidable(&self) -> bool {
        self.collidable
    }

    pub fn set_collidable(&mut self, collidable: bool) {
        self.collidable = collidable;
    }

    pub fn velocity(&self) -> Velocity {
        self.velocity
    }

    /// Assigns both components. Dispatching the change event is up to the arena.
    pub fn set_velocity(&mut self, velocity: Velocity) -> VelocityAxes {
        let changed = VelocityAxes {
            x: velocity.vx != self.velocity.vx,
            y: velocity.vy != self.velocity.vy,
        };
        self.velocity = velocity;
        changed
    }

    pub fn set_vx(&mut self, vx: f32) -> VelocityAxes {
        self.set_velocity(Velocity::new(vx, self.velocity.vy))
    }

    pub fn set_vy(&mut self, vy: f32) -> VelocityAxes {
        self.set_velocity(Velocity::new(self.velocity.vx, vy))
    }

    /// Advances by velocity, clamped per axis by `max_velocity`. Returns
    /// whether the position changed.
    pub fn move_by(&mut self, delta: f32, tile_size: f32) -> bool {
        let old = self.position();
        let Velocity { vx, vy } = self.velocity;
        if vx != 0.0 {
            let vx = vx.min(self.max_velocity.vx).max(-self.max_velocity.vx);
            self.base.set_x(old.x + vx * tile_size * delta);
        }
        if vy != 0.0 {
            let vy = vy.min(self.max_velocity.vy).max(-self.max_velocity.vy);
            self.base.set_y(old.y + vy * tile_size * delta);
        }
        self.position() != old
    }

    /// Merges the given values into the current spec and switches mode.
    pub fn set_bounding_box(&mut self, spec: BoundingBoxSpec, mode: BoundingBoxMode) {
        self.bbox.merge(spec);
        self.bbox_mode = mode;
    }

    pub fn bounding_box_mode(&self) -> BoundingBoxMode {
        self.bbox_mode
    }

    pub fn bounding_box(&self) -> Rect {
        let own = self.base.rect();
        let spec = self.bbox;
        match self.bbox_mode {
            BoundingBoxMode::Absolute => Rect::new(
                spec.x.unwrap_or(own.x),
                spec.y.unwrap_or(own.y),
                spec.width.unwrap_or(own.w),
                spec.height.unwrap_or(own.h),
            ),
            BoundingBoxMode::Relative => Rect::new(
                own.x + spec.x.unwrap_or(0.0),
                own.y + spec.y.unwrap_or(0.0),
                spec.width.unwrap_or(own.w),
                spec.height.unwrap_or(own.h),
            ),
            BoundingBoxMode::Offset => {
                let inset = vec2(spec.x.unwrap_or(0.0), spec.y.unwrap_or(0.0));
                let w = own.w + spec.width.unwrap_or(0.0);
                let h = own.h + spec.height.unwrap_or(0.0);
                let facing = self.base.facing_scale();
                let x = if facing.x < 0.0 {
                    own.x + own.w - inset.x - w
                } else {
                    own.x + inset.x
                };
                let y = if facing.y < 0.0 {
                    own.y + own.h - inset.y - h
                } else {
                    own.y + inset.y
                };
                Rect::new(x, y, w, h)
            }
        }
    }

    /// Entity origin minus bounding box origin.
    pub fn bounding_box_offset(&self, bbox: Rect) -> Vec2 {
        self.position() - bbox.point()
    }

    pub fn listeners(&self) -> &Listeners {
        &self.listeners
    }

    pub(crate) fn listeners_mut(&mut self) -> &mut Listeners {
        &mut self.listeners
    }

    pub fn add_event_listener(&mut self, kind: EventKind, callback: Callback, opts: ListenerOptions) -> ListenerId {
        self.listeners.add(kind, callback, opts)
    }

    pub fn remove_event_listener(&mut self, kind: EventKind, id: ListenerId) -> bool {
        self.listeners.remove(kind, id)
    }
}
