use std::collections::HashMap;

use crate::collision::Side;
use crate::entity::{Entities, EntityId};
use crate::event::{Event, EventKind, ListenerError, ListenerOptions};

pub type BehaviorParams = HashMap<String, f32>;

/// Sets a body going and wires whatever listeners keep it going.
pub type BehaviorFn = fn(&mut Entities, EntityId, &BehaviorParams) -> Result<(), ListenerError>;

const EDGE_EPSILON: f32 = 0.001;

pub struct BehaviorRegistry {
    fns: HashMap<String, BehaviorFn>,
}

impl Default for BehaviorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl BehaviorRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            fns: HashMap::new(),
        };
        registry.register("idle", behavior_idle);
        registry.register("patrol_x", behavior_patrol_x);
        registry.register("patrol_y", behavior_patrol_y);
        registry
    }

    pub fn register(&mut self, name: &str, func: BehaviorFn) {
        self.fns.insert(name.to_string(), func);
    }

    /// Unknown names fall back to `idle`.
    pub fn resolve(&self, name: &str) -> BehaviorFn {
        self.fns.get(name).copied().unwrap_or_else(|| {
            log::warn!("unknown behavior '{name}', using idle");
            behavior_idle
        })
    }

    pub fn attach(
        &self,
        entities: &mut Entities,
        id: EntityId,
        name: &str,
        params: &BehaviorParams,
    ) -> Result<(), ListenerError> {
        (self.resolve(name))(entities, id, params)
    }
}

fn speed(params: &BehaviorParams) -> f32 {
    params.get("speed").copied().unwrap_or(1.0)
}

pub fn behavior_idle(entities: &mut Entities, id: EntityId, _params: &BehaviorParams) -> Result<(), ListenerError> {
    entities.set_vx(id, 0.0)?;
    entities.set_vy(id, 0.0)?;
    Ok(())
}

fn turn_x(entities: &mut Entities, id: EntityId, vx: f32) -> Result<(), ListenerError> {
    entities.set_vx(id, vx)?;
    if let Some(object) = entities.get_mut(id) {
        object.scene_mut().mirror_x(Some(vx));
    }
    Ok(())
}

pub fn behavior_patrol_x(entities: &mut Entities, id: EntityId, params: &BehaviorParams) -> Result<(), ListenerError> {
    turn_x(entities, id, speed(params))?;

    entities.add_event_listener(
        id,
        EventKind::Collision,
        Box::new(|entities, id, event| {
            let Some(result) = event.collision() else {
                return Ok(());
            };
            let vx = entities.body(id).map_or(0.0, |body| body.velocity().vx);
            let blocked = (vx > 0.0 && result.sides.contains(Side::Right))
                || (vx < 0.0 && result.sides.contains(Side::Left));
            if blocked {
                turn_x(entities, id, -vx)?;
            }
            Ok(())
        }),
        ListenerOptions::default(),
    );
    entities.add_event_listener(
        id,
        EventKind::SceneBoundary,
        Box::new(|entities, id, event| {
            let Event::SceneBoundary(bounds) = event else {
                return Ok(());
            };
            let Some(body) = entities.body(id) else {
                return Ok(());
            };
            let (bbox, vx) = (body.bounding_box(), body.velocity().vx);
            let at_right = bbox.right() >= bounds.pixel_size().x - EDGE_EPSILON;
            let at_left = bbox.left() <= EDGE_EPSILON;
            if (vx > 0.0 && at_right) || (vx < 0.0 && at_left) {
                turn_x(entities, id, -vx)?;
            }
            Ok(())
        }),
        ListenerOptions::default(),
    );
    Ok(())
}

pub fn behavior_patrol_y(entities: &mut Entities, id: EntityId, params: &BehaviorParams) -> Result<(), ListenerError> {
    entities.set_vy(id, speed(params))?;

    entities.add_event_listener(
        id,
        EventKind::Collision,
        Box::new(|entities, id, event| {
            let Some(result) = event.collision() else {
                return Ok(());
            };
            let vy = entities.body(id).map_or(0.0, |body| body.velocity().vy);
            let blocked = (vy > 0.0 && result.sides.contains(Side::Down))
                || (vy < 0.0 && result.sides.contains(Side::Up));
            if blocked {
                entities.set_vy(id, -vy)?;
            }
            Ok(())
        }),
        ListenerOptions::default(),
    );
    entities.add_event_listener(
        id,
        EventKind::SceneBoundary,
        Box::new(|entities, id, event| {
            let Event::SceneBoundary(bounds) = event else {
                return Ok(());
            };
            let Some(body) = entities.body(id) else {
                return Ok(());
            };
            let (bbox, vy) = (body.bounding_box(), body.velocity().vy);
            let at_bottom = bbox.bottom() >= bounds.pixel_size().y - EDGE_EPSILON;
            let at_top = bbox.top() <= EDGE_EPSILON;
            if (vy > 0.0 && at_bottom) || (vy < 0.0 && at_top) {
                entities.set_vy(id, -vy)?;
            }
            Ok(())
        }),
        ListenerOptions::default(),
    );
    Ok(())
}
