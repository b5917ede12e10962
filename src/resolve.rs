//! Pushes a moved body back out of what it hit.

use crate::collision::{CollisionResult, Side, Sides, classify};
use crate::entity::Entities;
use crate::interactable::{InteractableEntity, Velocity};

/// Moves `result.entity` out of the colliders recorded in `result`.
///
/// Faces are handled in the order left, up, right, down, each only when the
/// snapshotted velocity is not moving away from it. Afterwards each axis is
/// retried at its pre-resolution coordinate and kept there when that no
/// longer overlaps the axis' colliders, so sliding along a wall diagonally
/// does not stall on the neighbouring tile's corner.
pub fn resolve(entities: &mut Entities, result: &CollisionResult) {
    if !result.occurred || result.velocity.is_zero() {
        return;
    }
    let Some(body) = entities.body_mut(result.entity) else {
        return;
    };

    let Velocity { vx, vy } = result.velocity;
    let start = body.position();

    if vx <= 0.0 {
        push_out(body, result, Side::Left);
    }
    if vy <= 0.0 {
        push_out(body, result, Side::Up);
    }
    if vx >= 0.0 {
        push_out(body, result, Side::Right);
    }
    if vy >= 0.0 {
        push_out(body, result, Side::Down);
    }

    let resolved = body.position();
    body.base_mut().set_x(start.x);
    if still_overlaps(body, result, Sides::X) {
        body.base_mut().set_x(resolved.x);
    }
    body.base_mut().set_y(start.y);
    if still_overlaps(body, result, Sides::Y) {
        body.base_mut().set_y(resolved.y);
    }
}

fn push_out(body: &mut InteractableEntity, result: &CollisionResult, side: Side) {
    if !result.sides.contains(side) {
        return;
    }
    let colliders = result.colliders(side);
    debug_assert!(!colliders.is_empty(), "side {side:?} set without colliders");
    if colliders.is_empty() {
        return;
    }

    let bbox = body.bounding_box();
    let offset = body.bounding_box_offset(bbox);
    let pos = body.position();
    let rects = colliders.iter().map(|collider| collider.rect);

    match side {
        Side::Left => {
            let edge = rects.map(|rect| rect.right()).fold(f32::NEG_INFINITY, f32::max);
            body.base_mut().set_x(pos.x.max(edge + offset.x));
        }
        Side::Up => {
            let edge = rects.map(|rect| rect.bottom()).fold(f32::NEG_INFINITY, f32::max);
            body.base_mut().set_y(pos.y.max(edge + offset.y));
        }
        Side::Right => {
            let edge = rects.map(|rect| rect.left()).fold(f32::INFINITY, f32::min);
            body.base_mut().set_x(pos.x.min(edge - bbox.w + offset.x));
        }
        Side::Down => {
            let edge = rects.map(|rect| rect.top()).fold(f32::INFINITY, f32::min);
            body.base_mut().set_y(pos.y.min(edge - bbox.h + offset.y));
        }
    }
}

fn still_overlaps(body: &InteractableEntity, result: &CollisionResult, axis: Sides) -> bool {
    let bbox = body.bounding_box();
    result
        .axis_colliders(axis)
        .any(|collider| classify(bbox, collider.rect).0)
}
