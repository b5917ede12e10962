use std::collections::HashMap;

use log::{info, warn};

use crate::character::PLAYER_IDENT;
use crate::collision::CollisionResult;
use crate::entity::{Entities, EntityId};
use crate::event::{Event, EventKind, ListenerError, ListenerId, ListenerOptions};
use crate::inventory::ItemInstance;

/// Data a trigger zone hands to its actions.
#[derive(Clone, Debug, Default)]
pub struct ActionContext {
    pub trigger: String,
    pub targets: Vec<EntityId>,
    pub item: Option<ItemInstance>,
}

pub type ActionFn = fn(&mut Entities, EntityId, &CollisionResult, &ActionContext) -> Result<(), ListenerError>;

pub struct ActionRegistry {
    funcs: HashMap<String, ActionFn>,
}

impl Default for ActionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ActionRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            funcs: HashMap::new(),
        };
        registry.register("log", action_log);
        registry.register("open_door", action_open_door);
        registry.register("pick_up_item", action_pick_up_item);
        registry
    }

    pub fn register(&mut self, name: &str, func: ActionFn) {
        self.funcs.insert(name.to_string(), func);
    }

    pub fn get(&self, name: &str) -> Option<ActionFn> {
        self.funcs.get(name).copied()
    }

    /// Installs `names` on `zone` as a single one-shot collision listener.
    ///
    /// With `player_only` the listener stays armed until the player is among
    /// the colliders. A zone carrying an item also waits for a collider with
    /// room for it. Unknown names are skipped with a warning.
    pub fn install(
        &self,
        entities: &mut Entities,
        zone: EntityId,
        names: &[String],
        ctx: ActionContext,
        player_only: bool,
    ) -> Option<ListenerId> {
        let mut funcs = Vec::with_capacity(names.len());
        for name in names {
            match self.get(name) {
                Some(func) => funcs.push(func),
                None => warn!("unknown action '{}' on '{}'", name, ctx.trigger),
            }
        }
        if funcs.is_empty() {
            return None;
        }

        let mut opts = ListenerOptions::once();
        let item = ctx.item.clone();
        if player_only || item.is_some() {
            opts = opts.when(move |entities, _, event| {
                let Some(result) = event.collision() else {
                    return false;
                };
                match &item {
                    Some(item) if player_only => {
                        player_collider(entities, result).is_some_and(|id| has_room(entities, id, item))
                    }
                    Some(item) => item_taker(entities, result, item).is_some(),
                    None => player_collider(entities, result).is_some(),
                }
            });
        }

        entities.add_event_listener(
            zone,
            EventKind::Collision,
            Box::new(move |entities, id, event: &Event| {
                let Some(result) = event.collision() else {
                    return Ok(());
                };
                for func in &funcs {
                    func(entities, id, result, &ctx)?;
                }
                Ok(())
            }),
            opts,
        )
    }
}

/// The player among `result`'s colliders, if present.
pub fn player_collider(entities: &Entities, result: &CollisionResult) -> Option<EntityId> {
    result
        .all_colliders()
        .map(|collider| collider.id)
        .find(|id| {
            entities
                .get(*id)
                .is_some_and(|object| object.scene().ident() == Some(PLAYER_IDENT))
        })
}

fn has_room(entities: &Entities, id: EntityId, item: &ItemInstance) -> bool {
    entities
        .character(id)
        .is_some_and(|character| character.inventory().can_add(item).is_ok())
}

/// The collider that would receive `item`: the player first, then any other
/// character, skipping those whose inventory refuses it.
pub fn item_taker(entities: &Entities, result: &CollisionResult, item: &ItemInstance) -> Option<EntityId> {
    player_collider(entities, result)
        .filter(|id| has_room(entities, *id, item))
        .or_else(|| {
            result
                .all_colliders()
                .map(|collider| collider.id)
                .find(|id| has_room(entities, *id, item))
        })
}

fn action_log(
    entities: &mut Entities,
    zone: EntityId,
    result: &CollisionResult,
    ctx: &ActionContext,
) -> Result<(), ListenerError> {
    let names: Vec<&str> = result
        .all_colliders()
        .filter_map(|collider| entities.get(collider.id))
        .map(|object| object.scene().name())
        .collect();
    info!("trigger '{}' ({zone}) touched by {}", ctx.trigger, names.join(", "));
    Ok(())
}

fn action_open_door(
    entities: &mut Entities,
    _zone: EntityId,
    _result: &CollisionResult,
    ctx: &ActionContext,
) -> Result<(), ListenerError> {
    for &target in &ctx.targets {
        let Some(object) = entities.get_mut(target) else {
            continue;
        };
        if let Some(proxy) = object.scene_mut().proxy_mut() {
            if proxy.frame.starts_with("door") {
                proxy.frame = format!("open_{}", proxy.frame);
            }
        }
        if let Some(body) = object.body_mut() {
            body.set_collidable(false);
        }
    }
    info!("'{}' opened {} door tiles", ctx.trigger, ctx.targets.len());
    Ok(())
}

fn action_pick_up_item(
    entities: &mut Entities,
    zone: EntityId,
    result: &CollisionResult,
    ctx: &ActionContext,
) -> Result<(), ListenerError> {
    let Some(item) = ctx.item.clone() else {
        return Err(ListenerError::failed(zone, format!("'{}' has no item to pick up", ctx.trigger)));
    };
    let Some(taker) = item_taker(entities, result, &item) else {
        return Ok(());
    };
    if let Some(character) = entities.character_mut(taker) {
        character.give(item)?;
    }
    if let Some(body) = entities.body_mut(zone) {
        body.base_mut().set_visible(false);
        body.set_collidable(false);
    }
    Ok(())
}
