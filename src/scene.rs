use log::debug;
use macroquad::prelude::*;

use crate::collision::CollisionResult;
use crate::detect::detect;
use crate::entity::{Collidable, Entities, EntityId, SceneObject};
use crate::event::{Event, ListenerError};
use crate::map::MapBounds;
use crate::resolve::resolve;

pub type TickCallback = Box<dyn FnMut(f32)>;

/// What happened during one [`Scene::tick`].
#[derive(Debug, Default)]
pub struct TickReport {
    pub moved: Vec<EntityId>,
    pub clamped: Vec<EntityId>,
    /// Results that had at least one overlap, in dispatch order.
    pub collisions: Vec<CollisionResult>,
}

pub struct Scene {
    entities: Entities,
    solids: Vec<EntityId>,
    actions: Vec<EntityId>,
    bounds: MapBounds,
    tick_callbacks: Vec<TickCallback>,
    hovered: Option<EntityId>,
}

impl Scene {
    pub fn new(bounds: MapBounds) -> Self {
        Self {
            entities: Entities::new(),
            solids: Vec::new(),
            actions: Vec::new(),
            bounds,
            tick_callbacks: Vec::new(),
            hovered: None,
        }
    }

    pub fn entities(&self) -> &Entities {
        &self.entities
    }

    pub fn entities_mut(&mut self) -> &mut Entities {
        &mut self.entities
    }

    pub fn bounds(&self) -> MapBounds {
        self.bounds
    }

    pub fn spawn(&mut self, object: SceneObject) -> EntityId {
        self.entities.spawn(object)
    }

    /// Objects that block and get struck.
    pub fn add_solid(&mut self, id: EntityId) {
        if !self.solids.contains(&id) {
            self.solids.push(id);
        }
    }

    pub fn solids(&self) -> &[EntityId] {
        &self.solids
    }

    /// Trigger zones tested against the solid pool every tick, moving or not,
    /// while they are visible and collidable.
    pub fn add_action(&mut self, id: EntityId) {
        if !self.actions.contains(&id) {
            self.actions.push(id);
        }
    }

    pub fn actions(&self) -> &[EntityId] {
        &self.actions
    }

    pub fn on_tick(&mut self, callback: TickCallback) {
        self.tick_callbacks.push(callback);
    }

    /// Advances the simulation by `delta` seconds.
    ///
    /// Bodies move, moved ones are kept inside the map, then moved bodies and
    /// action zones are tested against the solids. Listeners see every
    /// collision before any of them is resolved.
    pub fn tick(&mut self, delta: f32) -> Result<TickReport, ListenerError> {
        let mut report = TickReport::default();
        let tile_size = self.bounds.tile_size;

        for id in self.entities.ids() {
            if let Some(body) = self.entities.body_mut(id) {
                if body.move_by(delta, tile_size) {
                    report.moved.push(id);
                }
            }
        }

        for &id in &report.moved {
            if self.clamp_to_bounds(id) {
                report.clamped.push(id);
                self.entities.dispatch(id, &Event::SceneBoundary(self.bounds))?;
            }
        }

        let mut active = report.moved.clone();
        for &id in &self.actions {
            // spent zones are hidden or switched off
            let live = self
                .entities
                .get(id)
                .is_some_and(|object| object.is_visible() && object.participates());
            if live && !active.contains(&id) {
                active.push(id);
            }
        }

        report.collisions = detect(&self.entities, &active, &self.solids)
            .into_iter()
            .filter(|result| result.occurred)
            .collect();

        for result in &report.collisions {
            self.entities.dispatch(result.entity, &Event::Collision(result.clone()))?;
        }
        for result in &report.collisions {
            resolve(&mut self.entities, result);
        }

        for id in self.entities.ids() {
            if let Some(object) = self.entities.get_mut(id) {
                object.scene_mut().update_bound_z();
            }
        }

        for callback in &mut self.tick_callbacks {
            callback(delta);
        }
        Ok(report)
    }

    fn clamp_to_bounds(&mut self, id: EntityId) -> bool {
        let bounds = self.bounds;
        let Some(body) = self.entities.body_mut(id) else {
            return false;
        };
        let bbox = body.bounding_box();
        let offset = body.bounding_box_offset(bbox);
        let pos = body.position();
        let clamped = bounds.clamp_position(pos, bbox.size(), offset);
        if clamped == pos {
            return false;
        }
        debug!("clamped {} to map edge at ({:.1}, {:.1})", body.base().name(), clamped.x, clamped.y);
        body.set_position(clamped);
        true
    }

    /// Topmost visible physics body whose bounding box contains `point`.
    pub fn pick(&self, point: Vec2) -> Option<EntityId> {
        self.entities
            .iter()
            .filter(|(_, object)| object.body().is_some() && object.is_visible())
            .filter(|(_, object)| object.bounding_box().contains(point))
            .max_by(|(_, a), (_, b)| a.scene().z().total_cmp(&b.scene().z()))
            .map(|(id, _)| id)
    }

    pub fn hovered(&self) -> Option<EntityId> {
        self.hovered
    }

    /// Tracks the pointer and dispatches hover enter/exit when the topmost
    /// body under it changes.
    pub fn pointer_moved(&mut self, point: Vec2) -> Result<(), ListenerError> {
        let target = self.pick(point);
        if target == self.hovered {
            return Ok(());
        }
        let previous = std::mem::replace(&mut self.hovered, target);
        if let Some(previous) = previous {
            self.entities.dispatch(previous, &Event::HoverExit(point))?;
        }
        if let Some(target) = target {
            self.entities.dispatch(target, &Event::HoverEnter(point))?;
        }
        Ok(())
    }

    pub fn click(&mut self, point: Vec2) -> Result<Option<EntityId>, ListenerError> {
        let Some(target) = self.pick(point) else {
            return Ok(None);
        };
        self.entities.dispatch(target, &Event::Click(point))?;
        Ok(Some(target))
    }
}
