//! Level files and turning them into a populated [`Scene`].

use log::{debug, info, warn};
use macroquad::prelude::*;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

use crate::action::{ActionContext, ActionRegistry};
use crate::behavior::{BehaviorParams, BehaviorRegistry};
use crate::character::{CharacterEntity, PLAYER_IDENT};
use crate::config::GameConfig;
use crate::entity::{EntityId, SceneObject};
use crate::event::ListenerError;
use crate::geometry::{SceneEntity, VisualProxy, ZBinding};
use crate::helpers::{calc_scaled_pos, random_true};
use crate::interactable::{BoundingBoxMode, BoundingBoxSpec, InteractableEntity, Velocity};
use crate::inventory::{ItemDatabase, ItemInstance};
use crate::map::MapBounds;
use crate::scene::Scene;

pub const EMPTY_TILE: u8 = u8::MAX;

#[derive(Debug, Error)]
pub enum LevelError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("layer '{layer}' has {found} tiles, expected {expected}")]
    LayerSize {
        layer: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("tile id {0} is not in the palette")]
    UnknownTile(u8),
    #[error("missing item definition '{0}'")]
    MissingItem(String),
    #[error(transparent)]
    Listener(#[from] ListenerError),
}

#[derive(Clone, Debug, Deserialize)]
pub struct TileInfo {
    pub id: u8,
    pub frame: String,
    /// Blocking tiles join the solid pool. Others are drawn above characters.
    #[serde(default)]
    pub solid: bool,
}

#[derive(Clone, Debug, Deserialize)]
pub struct CrackedFloor {
    pub from: u8,
    pub to: u8,
    pub chance: f32,
}

fn default_size() -> [f32; 2] {
    [16.0, 16.0]
}

fn default_speed() -> f32 {
    1.0
}

fn default_true() -> bool {
    true
}

fn default_qty() -> u32 {
    1
}

#[derive(Clone, Debug, Deserialize)]
pub struct ActorFile {
    pub name: String,
    pub frame: String,
    /// Position in tiles.
    pub tile: [f32; 2],
    #[serde(default = "default_size")]
    pub size: [f32; 2],
    #[serde(default)]
    pub bounding_box: BoundingBoxSpec,
    #[serde(default)]
    pub mode: BoundingBoxMode,
    #[serde(default)]
    pub facing_left: bool,
    #[serde(default)]
    pub behavior: Option<String>,
    #[serde(default = "default_speed")]
    pub speed: f32,
}

#[derive(Clone, Debug, Deserialize)]
pub struct PropFile {
    pub name: String,
    pub frame: String,
    pub tile: [f32; 2],
    #[serde(default = "default_size")]
    pub size: [f32; 2],
    #[serde(default)]
    pub bounding_box: BoundingBoxSpec,
    #[serde(default)]
    pub mode: BoundingBoxMode,
    #[serde(default = "default_true")]
    pub solid: bool,
}

#[derive(Clone, Debug, Deserialize)]
pub struct TriggerFile {
    pub name: String,
    /// `[x, y, width, height]` in tiles.
    pub area: [f32; 4],
    pub actions: Vec<String>,
    /// Frame prefix of the tiles the actions work on.
    #[serde(default)]
    pub targets: Option<String>,
    #[serde(default)]
    pub player_only: bool,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ItemDropFile {
    pub item: String,
    pub tile: [f32; 2],
    #[serde(default = "default_qty")]
    pub qty: u32,
}

#[derive(Clone, Debug, Deserialize)]
pub struct LevelFile {
    pub id: String,
    pub width: usize,
    pub height: usize,
    pub tiles: Vec<TileInfo>,
    pub floor: Vec<u8>,
    #[serde(default)]
    pub walls: Vec<u8>,
    #[serde(default)]
    pub cracked_floor: Option<CrackedFloor>,
    pub player: ActorFile,
    #[serde(default)]
    pub npcs: Vec<ActorFile>,
    #[serde(default)]
    pub props: Vec<PropFile>,
    #[serde(default)]
    pub triggers: Vec<TriggerFile>,
    #[serde(default)]
    pub items: Vec<ItemDropFile>,
}

impl LevelFile {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LevelError> {
        let path = path.as_ref();
        let level: LevelFile = serde_json::from_str(&std::fs::read_to_string(path)?)?;
        level.validate()?;
        info!("loaded level '{}' from {}", level.id, path.display());
        Ok(level)
    }

    pub fn validate(&self) -> Result<(), LevelError> {
        let expected = self.width * self.height;
        for (layer, tiles) in [("floor", &self.floor), ("walls", &self.walls)] {
            if !tiles.is_empty() && tiles.len() != expected {
                return Err(LevelError::LayerSize {
                    layer,
                    expected,
                    found: tiles.len(),
                });
            }
            if let Some(&id) = tiles
                .iter()
                .find(|&&id| id != EMPTY_TILE && !self.tiles.iter().any(|tile| tile.id == id))
            {
                return Err(LevelError::UnknownTile(id));
            }
        }
        Ok(())
    }
}

/// A built scene and its player.
pub struct Level {
    pub scene: Scene,
    pub player: EntityId,
}

const FLOOR_Z: f32 = 0.0;
const WALL_Z: f32 = 1.0;
const UPPER_Z: f32 = 10_000.0;

pub struct LevelBuilder<'a> {
    pub config: &'a GameConfig,
    pub items: &'a ItemDatabase,
    pub actions: &'a ActionRegistry,
    pub behaviors: &'a BehaviorRegistry,
}

impl LevelBuilder<'_> {
    pub fn build(&self, file: &LevelFile) -> Result<Level, LevelError> {
        file.validate()?;
        let tile_size = self.config.tile_size;
        let mut scene = Scene::new(MapBounds::new(file.width, file.height, tile_size));
        let palette: HashMap<u8, &TileInfo> = file.tiles.iter().map(|tile| (tile.id, tile)).collect();

        self.build_floor(&mut scene, file, &palette);
        self.build_walls(&mut scene, file, &palette);

        for prop in &file.props {
            let rect = self.tile_rect(prop.tile, prop.size);
            let body = InteractableEntity::from_scene(
                SceneEntity::new()
                    .with_name(&prop.name)
                    .with_proxy(VisualProxy::new(&prop.frame, rect)),
            )
            .with_bounding_box(prop.bounding_box, prop.mode);
            let id = scene.spawn(SceneObject::Interactable(body));
            self.bind_z(&mut scene, id);
            if prop.solid {
                scene.add_solid(id);
            }
        }

        let player = self.spawn_actor(&mut scene, &file.player, true)?;
        for npc in &file.npcs {
            self.spawn_actor(&mut scene, npc, false)?;
        }

        for trigger in &file.triggers {
            self.build_trigger(&mut scene, trigger);
        }
        for drop in &file.items {
            self.build_item(&mut scene, drop)?;
        }

        info!(
            "built level '{}': {} objects, {} solid, {} action zones",
            file.id,
            scene.entities().len(),
            scene.solids().len(),
            scene.actions().len()
        );
        Ok(Level { scene, player })
    }

    fn tile_rect(&self, tile: [f32; 2], size: [f32; 2]) -> Rect {
        let pos = calc_scaled_pos(tile[0], tile[1], self.config.tile_size);
        Rect::new(pos.x, pos.y, size[0], size[1])
    }

    fn bind_z(&self, scene: &mut Scene, id: EntityId) {
        if let Some(object) = scene.entities_mut().get_mut(id) {
            object.scene_mut().bind_z_to_y(ZBinding {
                multiplier: self.config.z_multiplier,
                offset: self.config.z_offset,
            });
        }
    }

    fn build_floor(&self, scene: &mut Scene, file: &LevelFile, palette: &HashMap<u8, &TileInfo>) {
        let bounds = scene.bounds();
        for (index, &raw) in file.floor.iter().enumerate() {
            if raw == EMPTY_TILE {
                continue;
            }
            let id = match &file.cracked_floor {
                Some(cracked) if raw == cracked.from && random_true(cracked.chance) => cracked.to,
                _ => raw,
            };
            let Some(tile) = palette.get(&id) else {
                continue;
            };
            let rect = bounds.tile_bounds(index % file.width, index / file.width);
            let mut entity = SceneEntity::new().with_proxy(VisualProxy::new(&tile.frame, rect));
            entity.set_z(FLOOR_Z);
            scene.spawn(SceneObject::Static(entity));
        }
    }

    fn build_walls(&self, scene: &mut Scene, file: &LevelFile, palette: &HashMap<u8, &TileInfo>) {
        let bounds = scene.bounds();
        for (index, &raw) in file.walls.iter().enumerate() {
            let Some(tile) = palette.get(&raw) else {
                continue;
            };
            let rect = bounds.tile_bounds(index % file.width, index / file.width);
            let mut body = InteractableEntity::from_scene(
                SceneEntity::new()
                    .with_name(format!("{}@{},{}", tile.frame, index % file.width, index / file.width))
                    .with_proxy(VisualProxy::new(&tile.frame, rect)),
            );
            body.set_collidable(tile.solid);
            body.base_mut().set_z(if tile.solid { WALL_Z } else { UPPER_Z });
            let id = scene.spawn(SceneObject::Interactable(body));
            scene.add_solid(id);
        }
    }

    fn spawn_actor(&self, scene: &mut Scene, actor: &ActorFile, is_player: bool) -> Result<EntityId, LevelError> {
        let rect = self.tile_rect(actor.tile, actor.size);
        let mut base = SceneEntity::new()
            .with_name(&actor.name)
            .with_proxy(VisualProxy::new(&actor.frame, rect))
            .with_mirror_target(Vec2::ONE);
        if is_player {
            base = base.with_ident(PLAYER_IDENT);
        }
        if actor.facing_left {
            base.mirror_x(Some(-1.0));
        }

        let mut body = InteractableEntity::from_scene(base).with_bounding_box(actor.bounding_box, actor.mode);
        if is_player {
            let max = self.config.player_max_velocity;
            body = body.with_max_velocity(Velocity::new(max, max));
        }
        let id = scene.spawn(SceneObject::Character(CharacterEntity::new(body)));
        self.bind_z(scene, id);
        scene.add_solid(id);

        if let Some(name) = &actor.behavior {
            let params = BehaviorParams::from([("speed".to_string(), actor.speed)]);
            self.behaviors.attach(scene.entities_mut(), id, name, &params)?;
            debug!("{} runs behavior '{name}'", actor.name);
        }
        Ok(id)
    }

    fn build_trigger(&self, scene: &mut Scene, trigger: &TriggerFile) {
        let [x, y, w, h] = trigger.area.map(|v| v * self.config.tile_size);
        let zone = scene.spawn(SceneObject::Interactable(InteractableEntity::from_scene(
            SceneEntity::new()
                .with_name(&trigger.name)
                .with_geometry(Rect::new(x, y, w, h)),
        )));
        scene.add_action(zone);

        let targets: Vec<EntityId> = match &trigger.targets {
            Some(prefix) => scene
                .entities()
                .iter()
                .filter(|(_, object)| object.scene().frame().is_some_and(|frame| frame.starts_with(prefix.as_str())))
                .map(|(id, _)| id)
                .collect(),
            None => Vec::new(),
        };
        let ctx = ActionContext {
            trigger: trigger.name.clone(),
            targets,
            item: None,
        };
        if self
            .actions
            .install(scene.entities_mut(), zone, &trigger.actions, ctx, trigger.player_only)
            .is_none()
        {
            warn!("trigger '{}' has no usable actions", trigger.name);
        }
    }

    fn build_item(&self, scene: &mut Scene, drop: &ItemDropFile) -> Result<(), LevelError> {
        let def = self
            .items
            .get(&drop.item)
            .ok_or_else(|| LevelError::MissingItem(drop.item.clone()))?;
        let frame = def.sprite.clone().unwrap_or_else(|| def.id.clone());
        let rect = self.tile_rect(drop.tile, [self.config.tile_size, self.config.tile_size]);
        let inset = self.config.tile_size / 4.0;
        let body = InteractableEntity::from_scene(
            SceneEntity::new()
                .with_name(format!("item:{}", def.id))
                .with_proxy(VisualProxy::new(frame, rect)),
        )
        .with_bounding_box(
            BoundingBoxSpec::inset(inset, inset, -2.0 * inset, -2.0 * inset),
            BoundingBoxMode::Offset,
        );
        let zone = scene.spawn(SceneObject::Interactable(body));
        self.bind_z(scene, zone);
        scene.add_action(zone);

        let ctx = ActionContext {
            trigger: def.name.clone(),
            targets: Vec::new(),
            item: Some(ItemInstance::from_definition(def, drop.qty)),
        };
        self.actions
            .install(scene.entities_mut(), zone, &["pick_up_item".to_string()], ctx, true);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::ItemDefinition;

    const SMALL: &str = r#"{
        "id": "small",
        "width": 3,
        "height": 3,
        "tiles": [
            { "id": 0, "frame": "floor_tile" },
            { "id": 2, "frame": "wall_top" },
            { "id": 3, "frame": "wall", "solid": true },
            { "id": 7, "frame": "door_bottom_left", "solid": true }
        ],
        "floor": [255, 255, 255, 0, 0, 0, 0, 0, 0],
        "walls": [2, 2, 2, 3, 7, 3, 255, 255, 255],
        "player": { "name": "hero", "frame": "character_beard", "tile": [0, 2] },
        "triggers": [
            { "name": "door", "area": [1, 2, 1, 0.5], "actions": ["open_door"], "targets": "door", "player_only": true }
        ],
        "items": [ { "item": "coin", "tile": [2, 2], "qty": 3 } ]
    }"#;

    fn items() -> ItemDatabase {
        let mut db = ItemDatabase::empty();
        db.insert(ItemDefinition {
            id: "coin".into(),
            name: "Gold Coin".into(),
            max_qty: 99,
            sprite: Some("item_coin".into()),
        })
        .unwrap();
        db
    }

    fn build(raw: &str, items: &ItemDatabase) -> Result<Level, LevelError> {
        let file: LevelFile = serde_json::from_str(raw)?;
        let config = GameConfig::default();
        LevelBuilder {
            config: &config,
            items,
            actions: &ActionRegistry::new(),
            behaviors: &BehaviorRegistry::new(),
        }
        .build(&file)
    }

    #[test]
    fn builds_tiles_actors_and_zones() {
        let level = build(SMALL, &items()).unwrap();
        let entities = level.scene.entities();

        // 6 floor, 6 walls, player, trigger, item
        assert_eq!(entities.len(), 15);
        assert_eq!(level.scene.solids().len(), 7);
        assert_eq!(level.scene.actions().len(), 2);
        assert_eq!(entities.find_by_ident(PLAYER_IDENT), Some(level.player));

        let upper = entities.find_by_name("wall_top@0,0").unwrap();
        assert!(!entities.body(upper).unwrap().is_collidable());
        let door = entities.find_by_name("door_bottom_left@1,1").unwrap();
        assert!(entities.body(door).unwrap().is_collidable());

        let player = entities.body(level.player).unwrap();
        assert_eq!(player.position(), vec2(0.0, 32.0));
        assert_eq!(player.max_velocity, Velocity::new(3.0, 3.0));
    }

    #[test]
    fn missing_item_definition_fails() {
        let err = build(SMALL, &ItemDatabase::empty()).err().unwrap();
        assert!(matches!(err, LevelError::MissingItem(id) if id == "coin"));
    }

    #[test]
    fn layer_size_is_checked() {
        let raw = SMALL.replace("[255, 255, 255, 0, 0, 0, 0, 0, 0]", "[0, 0]");
        let err = build(&raw, &items()).err().unwrap();
        assert!(matches!(err, LevelError::LayerSize { layer: "floor", expected: 9, found: 2 }));
    }

    #[test]
    fn unknown_tile_ids_are_rejected() {
        let raw = SMALL.replace("[2, 2, 2, 3, 7, 3,", "[2, 9, 2, 3, 7, 3,");
        assert!(matches!(build(&raw, &items()).err().unwrap(), LevelError::UnknownTile(9)));
    }

    #[test]
    fn bundled_dungeon_builds() {
        let file = LevelFile::load(concat!(env!("CARGO_MANIFEST_DIR"), "/src/level/dungeon.json")).unwrap();
        let items = ItemDatabase::load_from(concat!(env!("CARGO_MANIFEST_DIR"), "/src/item")).unwrap();
        let config = GameConfig::default();
        let level = LevelBuilder {
            config: &config,
            items: &items,
            actions: &ActionRegistry::new(),
            behaviors: &BehaviorRegistry::new(),
        }
        .build(&file)
        .unwrap();
        assert!(level.scene.entities().find_by_name("torch").is_some());
    }
}
