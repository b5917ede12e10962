//! Typed event listeners attached to interactable entities.
//!
//! Listeners are stored per [`EventKind`] in registration order. Dispatch
//! itself lives on [`Entities`](crate::entity::Entities) because callbacks
//! receive the whole arena and may mutate any entity, including the one the
//! event is being dispatched on.

use macroquad::prelude::*;
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

use crate::collision::CollisionResult;
use crate::entity::{Entities, EntityId};
use crate::inventory::InventoryError;
use crate::map::MapBounds;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    Collision,
    SceneBoundary,
    VelocityChange,
    Click,
    HoverEnter,
    HoverExit,
}

/// Which velocity components changed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct VelocityAxes {
    pub x: bool,
    pub y: bool,
}

impl VelocityAxes {
    pub const fn any(self) -> bool {
        self.x || self.y
    }
}

#[derive(Clone, Debug)]
pub enum Event {
    Collision(CollisionResult),
    SceneBoundary(MapBounds),
    VelocityChange(VelocityAxes),
    Click(Vec2),
    HoverEnter(Vec2),
    HoverExit(Vec2),
}

impl Event {
    pub const fn kind(&self) -> EventKind {
        match self {
            Self::Collision(_) => EventKind::Collision,
            Self::SceneBoundary(_) => EventKind::SceneBoundary,
            Self::VelocityChange(_) => EventKind::VelocityChange,
            Self::Click(_) => EventKind::Click,
            Self::HoverEnter(_) => EventKind::HoverEnter,
            Self::HoverExit(_) => EventKind::HoverExit,
        }
    }

    pub const fn collision(&self) -> Option<&CollisionResult> {
        match self {
            Self::Collision(result) => Some(result),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum ListenerError {
    #[error("listener on {entity} failed: {reason}")]
    Failed { entity: EntityId, reason: String },
    #[error(transparent)]
    Inventory(#[from] InventoryError),
}

impl ListenerError {
    pub fn failed(entity: EntityId, reason: impl Into<String>) -> Self {
        Self::Failed {
            entity,
            reason: reason.into(),
        }
    }
}

pub type Callback = Box<dyn FnMut(&mut Entities, EntityId, &Event) -> Result<(), ListenerError>>;
pub type Predicate = Box<dyn Fn(&Entities, EntityId, &Event) -> bool>;

#[derive(Default)]
pub struct ListenerOptions {
    pub once: bool,
    pub predicate: Option<Predicate>,
}

impl ListenerOptions {
    pub fn once() -> Self {
        Self {
            once: true,
            predicate: None,
        }
    }

    /// Only fire when `predicate` holds. A failed check leaves the listener armed.
    pub fn when(
        mut self,
        predicate: impl Fn(&Entities, EntityId, &Event) -> bool + 'static,
    ) -> Self {
        self.predicate = Some(Box::new(predicate));
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

pub(crate) struct ListenerEntry {
    pub(crate) id: ListenerId,
    pub(crate) callback: Callback,
    pub(crate) once: bool,
    pub(crate) predicate: Option<Predicate>,
}

#[derive(Default)]
pub struct Listeners {
    next_id: u64,
    by_kind: HashMap<EventKind, Vec<ListenerEntry>>,
    dispatching: Vec<EventKind>,
    // taken by a running dispatch and still due to be put back
    in_flight: Vec<(EventKind, ListenerId)>,
    removed: Vec<ListenerId>,
}

impl Listeners {
    pub fn add(&mut self, kind: EventKind, callback: Callback, opts: ListenerOptions) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.by_kind.entry(kind).or_default().push(ListenerEntry {
            id,
            callback,
            once: opts.once,
            predicate: opts.predicate,
        });
        id
    }

    pub fn remove(&mut self, kind: EventKind, id: ListenerId) -> bool {
        if let Some(list) = self.by_kind.get_mut(&kind) {
            if let Some(pos) = list.iter().position(|entry| entry.id == id) {
                list.remove(pos);
                return true;
            }
        }
        // The listener may be sitting in a dispatch queue for this kind.
        if self.in_flight.contains(&(kind, id)) && !self.removed.contains(&id) {
            self.removed.push(id);
            return true;
        }
        false
    }

    pub fn len(&self, kind: EventKind) -> usize {
        self.by_kind.get(&kind).map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.by_kind.values().all(Vec::is_empty)
    }

    pub(crate) fn take(&mut self, kind: EventKind) -> Vec<ListenerEntry> {
        self.dispatching.push(kind);
        let taken = self.by_kind.remove(&kind).unwrap_or_default();
        self.in_flight.extend(taken.iter().map(|entry| (kind, entry.id)));
        taken
    }

    /// Marks a taken entry as gone for good: fired once or skipped.
    pub(crate) fn settle(&mut self, kind: EventKind, id: ListenerId) {
        if let Some(pos) = self.in_flight.iter().position(|pending| *pending == (kind, id)) {
            self.in_flight.remove(pos);
        }
    }

    pub(crate) fn is_removed(&self, id: ListenerId) -> bool {
        self.removed.contains(&id)
    }

    /// Puts back the survivors of a dispatch ahead of anything registered
    /// while it ran.
    pub(crate) fn restore(&mut self, kind: EventKind, mut kept: Vec<ListenerEntry>) {
        for entry in &kept {
            self.settle(kind, entry.id);
        }
        kept.retain(|entry| !self.removed.contains(&entry.id));
        if let Some(added) = self.by_kind.remove(&kind) {
            kept.extend(added);
        }
        if !kept.is_empty() {
            self.by_kind.insert(kind, kept);
        }
        if let Some(pos) = self.dispatching.iter().rposition(|k| *k == kind) {
            self.dispatching.remove(pos);
        }
        if self.dispatching.is_empty() {
            self.removed.clear();
        }
    }
}

impl fmt::Debug for Listeners {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut counts: Vec<(EventKind, usize)> = self
            .by_kind
            .iter()
            .map(|(kind, list)| (*kind, list.len()))
            .collect();
        counts.sort_by_key(|(kind, _)| format!("{kind:?}"));
        f.debug_struct("Listeners").field("counts", &counts).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::SceneObject;
    use crate::interactable::{InteractableEntity, Velocity};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn arena() -> (Entities, EntityId) {
        let mut entities = Entities::new();
        let id = entities.spawn(SceneObject::Interactable(InteractableEntity::new()));
        (entities, id)
    }

    fn counter(log: &Rc<RefCell<Vec<&'static str>>>, tag: &'static str) -> Callback {
        let log = Rc::clone(log);
        Box::new(move |_, _, _| {
            log.borrow_mut().push(tag);
            Ok(())
        })
    }

    fn click() -> Event {
        Event::Click(Vec2::ZERO)
    }

    #[test]
    fn listeners_fire_in_registration_order() {
        let (mut entities, id) = arena();
        let log = Rc::new(RefCell::new(Vec::new()));
        entities.add_event_listener(id, EventKind::Click, counter(&log, "a"), ListenerOptions::default());
        entities.add_event_listener(id, EventKind::Click, counter(&log, "b"), ListenerOptions::default());
        entities.add_event_listener(id, EventKind::HoverEnter, counter(&log, "hover"), ListenerOptions::default());

        entities.dispatch(id, &click()).unwrap();
        entities.dispatch(id, &click()).unwrap();

        assert_eq!(*log.borrow(), vec!["a", "b", "a", "b"]);
    }

    #[test]
    fn once_listener_is_removed_after_first_call() {
        let (mut entities, id) = arena();
        let log = Rc::new(RefCell::new(Vec::new()));
        entities.add_event_listener(id, EventKind::Click, counter(&log, "once"), ListenerOptions::once());

        entities.dispatch(id, &click()).unwrap();
        entities.dispatch(id, &click()).unwrap();

        assert_eq!(*log.borrow(), vec!["once"]);
        assert_eq!(entities.body(id).unwrap().listeners().len(EventKind::Click), 0);
    }

    #[test]
    fn failed_predicate_does_not_consume_once() {
        let (mut entities, id) = arena();
        let log = Rc::new(RefCell::new(Vec::new()));
        let gate = Rc::new(RefCell::new(false));
        let gate_check = Rc::clone(&gate);
        entities.add_event_listener(
            id,
            EventKind::Click,
            counter(&log, "fired"),
            ListenerOptions::once().when(move |_, _, _| *gate_check.borrow()),
        );

        entities.dispatch(id, &click()).unwrap();
        assert!(log.borrow().is_empty());
        assert_eq!(entities.body(id).unwrap().listeners().len(EventKind::Click), 1);

        *gate.borrow_mut() = true;
        entities.dispatch(id, &click()).unwrap();
        entities.dispatch(id, &click()).unwrap();
        assert_eq!(*log.borrow(), vec!["fired"]);
    }

    #[test]
    fn remove_by_id() {
        let (mut entities, id) = arena();
        let log = Rc::new(RefCell::new(Vec::new()));
        let first = entities
            .add_event_listener(id, EventKind::Click, counter(&log, "a"), ListenerOptions::default())
            .unwrap();
        entities.add_event_listener(id, EventKind::Click, counter(&log, "b"), ListenerOptions::default());

        assert!(entities.remove_event_listener(id, EventKind::Click, first));
        assert!(!entities.remove_event_listener(id, EventKind::Click, first));
        entities.dispatch(id, &click()).unwrap();

        assert_eq!(*log.borrow(), vec!["b"]);
    }

    fn rearming(log: Rc<RefCell<u32>>) -> Callback {
        Box::new(move |entities, id, event| {
            let Event::Click(pos) = event else {
                return Ok(());
            };
            *log.borrow_mut() += 1;
            if pos.x < 0.0 {
                // wrong condition, wait for the next one
                entities.add_event_listener(id, EventKind::Click, rearming(Rc::clone(&log)), ListenerOptions::once());
            }
            Ok(())
        })
    }

    #[test]
    fn once_listener_can_rearm_itself() {
        let (mut entities, id) = arena();
        let calls = Rc::new(RefCell::new(0));
        entities.add_event_listener(id, EventKind::Click, rearming(Rc::clone(&calls)), ListenerOptions::once());

        entities.dispatch(id, &Event::Click(vec2(-1.0, 0.0))).unwrap();
        assert_eq!(entities.body(id).unwrap().listeners().len(EventKind::Click), 1);
        entities.dispatch(id, &Event::Click(vec2(-1.0, 0.0))).unwrap();
        entities.dispatch(id, &Event::Click(vec2(1.0, 0.0))).unwrap();
        entities.dispatch(id, &Event::Click(vec2(1.0, 0.0))).unwrap();

        assert_eq!(*calls.borrow(), 3);
        assert_eq!(entities.body(id).unwrap().listeners().len(EventKind::Click), 0);
    }

    #[test]
    fn listener_removed_mid_dispatch_is_skipped() {
        let (mut entities, id) = arena();
        let log = Rc::new(RefCell::new(Vec::new()));
        let victim = Rc::new(RefCell::new(None));
        let victim_ref = Rc::clone(&victim);
        entities.add_event_listener(
            id,
            EventKind::Click,
            Box::new(move |entities, id, _| {
                if let Some(target) = *victim_ref.borrow() {
                    entities.remove_event_listener(id, EventKind::Click, target);
                }
                Ok(())
            }),
            ListenerOptions::default(),
        );
        let target = entities
            .add_event_listener(id, EventKind::Click, counter(&log, "victim"), ListenerOptions::default())
            .unwrap();
        *victim.borrow_mut() = Some(target);

        entities.dispatch(id, &click()).unwrap();

        assert!(log.borrow().is_empty());
        assert_eq!(entities.body(id).unwrap().listeners().len(EventKind::Click), 1);
    }

    #[test]
    fn mid_dispatch_remove_only_reports_queued_listeners() {
        let (mut entities, id) = arena();
        let log = Rc::new(RefCell::new(Vec::new()));
        let answers = Rc::new(RefCell::new(Vec::new()));
        let ids = Rc::new(RefCell::new(Vec::new()));
        let (seen, targets) = (Rc::clone(&answers), Rc::clone(&ids));
        let me = entities
            .add_event_listener(
                id,
                EventKind::Click,
                Box::new(move |entities, id, _| {
                    for &target in targets.borrow().iter() {
                        seen.borrow_mut().push(entities.remove_event_listener(id, EventKind::Click, target));
                    }
                    Ok(())
                }),
                ListenerOptions::once(),
            )
            .unwrap();
        let queued = entities
            .add_event_listener(id, EventKind::Click, counter(&log, "queued"), ListenerOptions::default())
            .unwrap();
        ids.borrow_mut().extend([me, ListenerId(999), queued, queued]);

        entities.dispatch(id, &click()).unwrap();

        assert_eq!(*answers.borrow(), vec![false, false, true, false]);
        assert!(log.borrow().is_empty());
        assert!(entities.body(id).unwrap().listeners().is_empty());
    }

    #[test]
    fn errors_propagate_and_keep_listeners() {
        let (mut entities, id) = arena();
        let log = Rc::new(RefCell::new(Vec::new()));
        entities.add_event_listener(
            id,
            EventKind::Click,
            Box::new(|_, id, _| Err(ListenerError::failed(id, "broken script"))),
            ListenerOptions::default(),
        );
        entities.add_event_listener(id, EventKind::Click, counter(&log, "after"), ListenerOptions::default());

        let err = entities.dispatch(id, &click()).unwrap_err();
        assert!(err.to_string().contains("broken script"));
        assert!(log.borrow().is_empty());
        assert_eq!(entities.body(id).unwrap().listeners().len(EventKind::Click), 2);
    }

    #[test]
    fn velocity_change_reports_changed_axes() {
        let (mut entities, id) = arena();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        entities.add_event_listener(
            id,
            EventKind::VelocityChange,
            Box::new(move |_, _, event| {
                if let Event::VelocityChange(axes) = event {
                    sink.borrow_mut().push(*axes);
                }
                Ok(())
            }),
            ListenerOptions::default(),
        );

        entities.set_vx(id, 1.0).unwrap();
        entities.set_vx(id, 1.0).unwrap();
        entities.set_velocity(id, Velocity::new(1.0, -2.0)).unwrap();
        entities.set_velocity(id, Velocity::new(0.0, 0.0)).unwrap();

        assert_eq!(
            *seen.borrow(),
            vec![
                VelocityAxes { x: true, y: false },
                VelocityAxes { x: false, y: true },
                VelocityAxes { x: true, y: true },
            ]
        );
    }
}
