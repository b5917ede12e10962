use macroquad::prelude::*;
use tiledelve::action::ActionRegistry;
use tiledelve::behavior::BehaviorRegistry;
use tiledelve::config::GameConfig;
use tiledelve::entity::{Collidable, EntityId};
use tiledelve::game::{Game, GameMode};
use tiledelve::inventory::ItemDatabase;
use tiledelve::level::{Level, LevelBuilder, LevelFile};

const DOOR_TILES: [&str; 2] = ["door_bottom_left@4,1", "door_bottom_right@5,1"];

fn dungeon() -> Level {
    let file = LevelFile::load(concat!(env!("CARGO_MANIFEST_DIR"), "/src/level/dungeon.json")).unwrap();
    let items = ItemDatabase::load_from(concat!(env!("CARGO_MANIFEST_DIR"), "/src/item")).unwrap();
    let config = GameConfig::default();
    LevelBuilder {
        config: &config,
        items: &items,
        actions: &ActionRegistry::new(),
        behaviors: &BehaviorRegistry::new(),
    }
    .build(&file)
    .unwrap()
}

fn playing() -> Game {
    let mut game = Game::new(4.0);
    game.start(dungeon());
    game
}

fn npc(game: &Game) -> EntityId {
    game.scene().unwrap().entities().find_by_name("eye_patch").unwrap()
}

fn door_is_open(game: &Game) -> bool {
    let entities = game.scene().unwrap().entities();
    DOOR_TILES.iter().all(|name| {
        let door = entities.find_by_name(name).unwrap();
        let body = entities.body(door).unwrap();
        !body.is_collidable() && body.base().frame().is_some_and(|frame| frame.starts_with("open_door"))
    })
}

fn place(game: &mut Game, id: EntityId, pos: Vec2) {
    let scene = game.scene_mut().unwrap();
    scene.entities_mut().body_mut(id).unwrap().set_position(pos);
}

#[test]
fn patrolling_npc_stays_on_the_map() {
    let mut game = playing();
    let npc = npc(&game);
    let start = game.scene().unwrap().entities().body(npc).unwrap().position();

    for _ in 0..240 {
        game.tick(1.0 / 60.0).unwrap();
    }

    let scene = game.scene().unwrap();
    let map = scene.bounds().rect();
    let bbox = scene.entities().get(npc).unwrap().bounding_box();
    assert!(bbox.left() >= 0.0 && bbox.right() <= map.right());
    assert_ne!(scene.entities().body(npc).unwrap().position(), start);
}

#[test]
fn door_opens_for_the_player_not_the_npc() {
    let mut game = playing();
    let npc = npc(&game);
    let player = game.player().unwrap();

    place(&mut game, npc, vec2(70.0, 28.0));
    game.tick(0.001).unwrap();
    assert!(!door_is_open(&game));

    place(&mut game, npc, vec2(96.0, 64.0));
    place(&mut game, player, vec2(72.0, 33.0));
    game.tick(0.001).unwrap();
    assert!(door_is_open(&game));
}

#[test]
fn paused_game_does_not_advance() {
    let mut game = playing();
    let npc = npc(&game);
    let start = game.scene().unwrap().entities().body(npc).unwrap().position();

    game.toggle_pause();
    assert_eq!(game.mode(), GameMode::Paused);
    assert!(game.tick(0.5).unwrap().is_none());
    assert_eq!(game.scene().unwrap().entities().body(npc).unwrap().position(), start);
}

#[test]
fn walking_onto_an_item_picks_it_up() {
    let mut game = playing();
    let player = game.player().unwrap();

    // key lies on tile (1, 6)
    place(&mut game, player, vec2(16.0, 96.0));
    game.tick(0.001).unwrap();

    let scene = game.scene().unwrap();
    let inventory = scene.entities().character(player).unwrap().inventory();
    assert_eq!(inventory.len(), 1);
    assert_eq!(inventory.item_in_slot(0).unwrap().definition.id, "key");
}
