//! Axis-aligned rectangle overlap classification.
//!
//! `classify` is the single place that decides whether two boxes overlap and
//! which face of the first box was struck. Detection and resolution both go
//! through it.

use macroquad::prelude::*;
use std::collections::BTreeMap;

use crate::entity::EntityId;
use crate::interactable::Velocity;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Side {
    Left,
    Right,
    Up,
    Down,
}

impl Side {
    pub const ALL: [Side; 4] = [Side::Left, Side::Right, Side::Up, Side::Down];

    pub const fn bit(self) -> u8 {
        match self {
            Self::Left => 0b0001,
            Self::Right => 0b0010,
            Self::Up => 0b0100,
            Self::Down => 0b1000,
        }
    }
}

/// Set of struck faces, packed the same way as the map's collider pins.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Sides(u8);

impl Sides {
    pub const NONE: Sides = Sides(0);
    pub const LEFT: Sides = Sides(0b0001);
    pub const RIGHT: Sides = Sides(0b0010);
    pub const UP: Sides = Sides(0b0100);
    pub const DOWN: Sides = Sides(0b1000);
    pub const X: Sides = Sides(0b0011);
    pub const Y: Sides = Sides(0b1100);

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn from_bits(bits: u8) -> Self {
        Self(bits & 0x0F)
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub const fn contains(self, side: Side) -> bool {
        self.0 & side.bit() != 0
    }

    pub const fn intersects(self, other: Sides) -> bool {
        self.0 & other.0 != 0
    }

    pub fn insert(&mut self, other: Sides) {
        self.0 |= other.0;
    }

    pub fn iter(self) -> impl Iterator<Item = Side> {
        Side::ALL.into_iter().filter(move |side| self.contains(*side))
    }
}

impl From<Side> for Sides {
    fn from(side: Side) -> Self {
        Self(side.bit())
    }
}

impl std::ops::BitOr for Sides {
    type Output = Sides;

    fn bitor(self, rhs: Sides) -> Sides {
        Sides(self.0 | rhs.0)
    }
}

/// Tests `a` against `b` and reports which side of `a` was struck.
///
/// Boxes that only touch along an edge do not overlap. When the overlap is
/// clearly horizontal or vertical the side follows the relative position of
/// the centers. Anything else, corners and overlaps deeper than half of `a`,
/// is separated along the axis with the shallower penetration. Ties go to
/// the horizontal side.
pub fn classify(a: Rect, b: Rect) -> (bool, Sides) {
    let a_half = vec2(a.w / 2.0, a.h / 2.0);
    let b_half = vec2(b.w / 2.0, b.h / 2.0);
    let a_center = vec2(a.x, a.y) + a_half;
    let b_center = vec2(b.x, b.y) + b_half;

    let vx = a_center.x - b_center.x;
    let vy = a_center.y - b_center.y;
    let combined = a_half + b_half;

    if vx.abs() >= combined.x || vy.abs() >= combined.y {
        return (false, Sides::NONE);
    }

    let ox = vx.abs() - a_half.x;
    let oy = vy.abs() - a_half.y;

    let side = if oy > 0.0 && ox < 0.0 {
        if a_center.y > b_center.y { Side::Up } else { Side::Down }
    } else if oy < 0.0 && ox > 0.0 {
        if a_center.x > b_center.x { Side::Left } else { Side::Right }
    } else if combined.y - vy.abs() < combined.x - vx.abs() {
        if vy < 0.0 { Side::Down } else { Side::Up }
    } else if vx < 0.0 {
        Side::Right
    } else {
        Side::Left
    };

    (true, side.into())
}

/// A struck object as it was when detection ran.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Collider {
    pub id: EntityId,
    pub rect: Rect,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CollisionResult {
    pub entity: EntityId,
    pub occurred: bool,
    pub sides: Sides,
    /// Velocity of `entity` at detection time.
    pub velocity: Velocity,
    pub collisions: BTreeMap<Side, Vec<Collider>>,
}

impl CollisionResult {
    pub fn new(entity: EntityId, velocity: Velocity) -> Self {
        Self {
            entity,
            occurred: false,
            sides: Sides::NONE,
            velocity,
            collisions: BTreeMap::new(),
        }
    }

    pub fn record(&mut self, sides: Sides, collider: Collider) {
        self.occurred = true;
        self.sides.insert(sides);
        for side in sides.iter() {
            self.collisions.entry(side).or_default().push(collider);
        }
    }

    pub fn colliders(&self, side: Side) -> &[Collider] {
        self.collisions.get(&side).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Colliders on both faces of an axis, left/up first.
    pub fn axis_colliders(&self, axis: Sides) -> impl Iterator<Item = &Collider> {
        axis.iter().flat_map(move |side| self.colliders(side).iter())
    }

    pub fn all_colliders(&self) -> impl Iterator<Item = &Collider> {
        self.collisions.values().flatten()
    }

    pub fn collided_with(&self, id: EntityId) -> bool {
        self.all_colliders().any(|collider| collider.id == id)
    }
}
