use macroquad::prelude::*;
use std::fmt;

use crate::character::CharacterEntity;
use crate::event::{Callback, Event, ListenerError, ListenerId, ListenerOptions, EventKind, VelocityAxes};
use crate::geometry::SceneEntity;
use crate::interactable::{InteractableEntity, Velocity};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntityId(u32);

impl EntityId {
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Anything that can be tested for overlap.
pub trait Collidable {
    fn bounding_box(&self) -> Rect;
    fn is_visible(&self) -> bool;
    /// Whether others collide with this object at all.
    fn participates(&self) -> bool;
}

impl Collidable for SceneEntity {
    fn bounding_box(&self) -> Rect {
        self.rect()
    }

    fn is_visible(&self) -> bool {
        SceneEntity::is_visible(self)
    }

    fn participates(&self) -> bool {
        true
    }
}

impl Collidable for InteractableEntity {
    fn bounding_box(&self) -> Rect {
        InteractableEntity::bounding_box(self)
    }

    fn is_visible(&self) -> bool {
        InteractableEntity::is_visible(self)
    }

    fn participates(&self) -> bool {
        self.is_collidable()
    }
}

impl Collidable for CharacterEntity {
    fn bounding_box(&self) -> Rect {
        self.body().bounding_box()
    }

    fn is_visible(&self) -> bool {
        self.body().is_visible()
    }

    fn participates(&self) -> bool {
        self.body().is_collidable()
    }
}

#[derive(Debug)]
pub enum SceneObject {
    Static(SceneEntity),
    Interactable(InteractableEntity),
    Character(CharacterEntity),
}

impl SceneObject {
    pub fn scene(&self) -> &SceneEntity {
        match self {
            Self::Static(entity) => entity,
            Self::Interactable(body) => body.base(),
            Self::Character(character) => character.body().base(),
        }
    }

    pub fn scene_mut(&mut self) -> &mut SceneEntity {
        match self {
            Self::Static(entity) => entity,
            Self::Interactable(body) => body.base_mut(),
            Self::Character(character) => character.body_mut().base_mut(),
        }
    }

    /// The physics body, if this object has one.
    pub fn body(&self) -> Option<&InteractableEntity> {
        match self {
            Self::Static(_) => None,
            Self::Interactable(body) => Some(body),
            Self::Character(character) => Some(character.body()),
        }
    }

    pub fn body_mut(&mut self) -> Option<&mut InteractableEntity> {
        match self {
            Self::Static(_) => None,
            Self::Interactable(body) => Some(body),
            Self::Character(character) => Some(character.body_mut()),
        }
    }

    pub fn character(&self) -> Option<&CharacterEntity> {
        match self {
            Self::Character(character) => Some(character),
            _ => None,
        }
    }

    pub fn character_mut(&mut self) -> Option<&mut CharacterEntity> {
        match self {
            Self::Character(character) => Some(character),
            _ => None,
        }
    }

    fn collidable(&self) -> &dyn Collidable {
        match self {
            Self::Static(entity) => entity,
            Self::Interactable(body) => body,
            Self::Character(character) => character,
        }
    }
}

impl Collidable for SceneObject {
    fn bounding_box(&self) -> Rect {
        self.collidable().bounding_box()
    }

    fn is_visible(&self) -> bool {
        self.collidable().is_visible()
    }

    fn participates(&self) -> bool {
        self.collidable().participates()
    }
}

/// Owns every object in a scene. Ids are never reused.
#[derive(Debug, Default)]
pub struct Entities {
    objects: Vec<SceneObject>,
}

impl Entities {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn(&mut self, object: SceneObject) -> EntityId {
        let id = EntityId::new(self.objects.len() as u32);
        self.objects.push(object);
        id
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn ids(&self) -> Vec<EntityId> {
        (0..self.objects.len() as u32).map(EntityId::new).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &SceneObject)> {
        self.objects
            .iter()
            .enumerate()
            .map(|(index, object)| (EntityId::new(index as u32), object))
    }

    pub fn get(&self, id: EntityId) -> Option<&SceneObject> {
        self.objects.get(id.index())
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut SceneObject> {
        self.objects.get_mut(id.index())
    }

    pub fn body(&self, id: EntityId) -> Option<&InteractableEntity> {
        self.get(id)?.body()
    }

    pub fn body_mut(&mut self, id: EntityId) -> Option<&mut InteractableEntity> {
        self.get_mut(id)?.body_mut()
    }

    pub fn character(&self, id: EntityId) -> Option<&CharacterEntity> {
        self.get(id)?.character()
    }

    pub fn character_mut(&mut self, id: EntityId) -> Option<&mut CharacterEntity> {
        self.get_mut(id)?.character_mut()
    }

    pub fn find_by_ident(&self, ident: &str) -> Option<EntityId> {
        self.iter()
            .find(|(_, object)| object.scene().ident() == Some(ident))
            .map(|(id, _)| id)
    }

    pub fn find_by_name(&self, name: &str) -> Option<EntityId> {
        self.iter()
            .find(|(_, object)| object.scene().name() == name)
            .map(|(id, _)| id)
    }

    /// `None` when `id` has no physics body to listen on.
    pub fn add_event_listener(
        &mut self,
        id: EntityId,
        kind: EventKind,
        callback: Callback,
        opts: ListenerOptions,
    ) -> Option<ListenerId> {
        Some(self.body_mut(id)?.add_event_listener(kind, callback, opts))
    }

    pub fn remove_event_listener(&mut self, id: EntityId, kind: EventKind, listener: ListenerId) -> bool {
        self.body_mut(id)
            .is_some_and(|body| body.remove_event_listener(kind, listener))
    }

    /// Runs `id`'s listeners for the event's kind in registration order.
    ///
    /// The list is detached while it runs so callbacks can touch any entity,
    /// this one included. Listeners added meanwhile are kept for the next
    /// dispatch. The first error stops the run.
    pub fn dispatch(&mut self, id: EntityId, event: &Event) -> Result<(), ListenerError> {
        let kind = event.kind();
        let Some(body) = self.body_mut(id) else {
            return Ok(());
        };
        let mut queue = body.listeners_mut().take(kind).into_iter();
        let mut kept = Vec::new();
        let mut outcome = Ok(());

        while let Some(mut entry) = queue.next() {
            let removed = self.body(id).is_some_and(|body| body.listeners().is_removed(entry.id));
            if removed {
                if let Some(body) = self.body_mut(id) {
                    body.listeners_mut().settle(kind, entry.id);
                }
                continue;
            }
            if let Some(predicate) = &entry.predicate {
                if !predicate(self, id, event) {
                    kept.push(entry);
                    continue;
                }
            }
            let once = entry.once;
            if once {
                if let Some(body) = self.body_mut(id) {
                    body.listeners_mut().settle(kind, entry.id);
                }
            }
            let result = (entry.callback)(self, id, event);
            if !once {
                kept.push(entry);
            }
            if let Err(err) = result {
                outcome = Err(err);
                break;
            }
        }

        kept.extend(queue);
        if let Some(body) = self.body_mut(id) {
            body.listeners_mut().restore(kind, kept);
        }
        outcome
    }

    /// Sets velocity and synchronously notifies `VelocityChange` listeners
    /// when a component changed.
    pub fn set_velocity(&mut self, id: EntityId, velocity: Velocity) -> Result<VelocityAxes, ListenerError> {
        let Some(body) = self.body_mut(id) else {
            return Ok(VelocityAxes::default());
        };
        let changed = body.set_velocity(velocity);
        if changed.any() {
            self.dispatch(id, &Event::VelocityChange(changed))?;
        }
        Ok(changed)
    }

    pub fn set_vx(&mut self, id: EntityId, vx: f32) -> Result<VelocityAxes, ListenerError> {
        let vy = self.body(id).map_or(0.0, |body| body.velocity().vy);
        self.set_velocity(id, Velocity::new(vx, vy))
    }

    pub fn set_vy(&mut self, id: EntityId, vy: f32) -> Result<VelocityAxes, ListenerError> {
        let vx = self.body(id).map_or(0.0, |body| body.velocity().vx);
        self.set_velocity(id, Velocity::new(vx, vy))
    }
}
