//! Narrow-phase collision detection over a candidate pool.

use crate::collision::{Collider, CollisionResult, classify};
use crate::entity::{Collidable, Entities, EntityId};
use crate::interactable::Velocity;

/// Tests every active entity against `pool`.
///
/// Results come back in `active` order, one per active entity, followed by
/// one reactive result for each struck physics body that was not itself
/// active, in the order they were first struck.
pub fn detect(entities: &Entities, active: &[EntityId], pool: &[EntityId]) -> Vec<CollisionResult> {
    let mut results = Vec::with_capacity(active.len());
    let mut struck = Vec::new();

    for &id in active {
        if let Some(result) = detect_one(entities, id, pool, &mut struck) {
            results.push(result);
        }
    }

    let mut reactive: Vec<EntityId> = Vec::new();
    for id in struck {
        if active.contains(&id) || reactive.contains(&id) || entities.body(id).is_none() {
            continue;
        }
        reactive.push(id);
    }

    let mut scratch = Vec::new();
    for id in reactive {
        if let Some(result) = detect_one(entities, id, pool, &mut scratch) {
            results.push(result);
        }
    }
    results
}

fn detect_one(
    entities: &Entities,
    id: EntityId,
    pool: &[EntityId],
    struck: &mut Vec<EntityId>,
) -> Option<CollisionResult> {
    let object = entities.get(id)?;
    let velocity = object.body().map_or(Velocity::ZERO, |body| body.velocity());
    let bbox = object.bounding_box();
    let mut result = CollisionResult::new(id, velocity);

    for &other_id in pool {
        if other_id == id {
            continue;
        }
        let Some(other) = entities.get(other_id) else {
            continue;
        };
        if !other.is_visible() || !other.participates() {
            continue;
        }
        let rect = other.bounding_box();
        let (hit, sides) = classify(bbox, rect);
        if hit {
            result.record(sides, Collider { id: other_id, rect });
            struck.push(other_id);
        }
    }
    Some(result)
}
