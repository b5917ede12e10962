use std::cell::Cell;
use std::rc::Rc;

use log::{error, info, warn};
use macroquad::prelude::*;

use tiledelve::action::ActionRegistry;
use tiledelve::behavior::BehaviorRegistry;
use tiledelve::config::GameConfig;
use tiledelve::controls::Controls;
use tiledelve::entity::Collidable;
use tiledelve::game::{Game, GameMode};
use tiledelve::helpers::{calc_center, draw_hitbox, frame_color};
use tiledelve::inventory::ItemDatabase;
use tiledelve::level::{Level, LevelBuilder, LevelFile, LevelError};
use tiledelve::logging;

const CONFIG_PATH: &str = "src/config.yaml";
const CAMERA_DRAG: f32 = 5.0;
const FLICKER_SPEED: f32 = 7.0;
const HUD_FONT_SIZE: f32 = 24.0;
const BANNER_FONT_SIZE: f32 = 48.0;

fn window_conf() -> Conf {
    Conf {
        window_title: "tiledelve".to_owned(),
        sample_count: 1,
        ..Default::default()
    }
}

fn load_config() -> GameConfig {
    match GameConfig::load(CONFIG_PATH) {
        Ok(config) => {
            logging::init(config.verbose);
            config
        }
        Err(err) => {
            logging::init(false);
            warn!("config load failed, using defaults: {err}");
            GameConfig::default()
        }
    }
}

fn load_level(config: &GameConfig) -> Result<Level, LevelError> {
    let items = ItemDatabase::load_from(&config.item_dir).unwrap_or_else(|err| {
        warn!("item load failed: {err}");
        ItemDatabase::empty()
    });
    let actions = ActionRegistry::new();
    let behaviors = BehaviorRegistry::new();
    let file = LevelFile::load(&config.level_path)?;
    LevelBuilder {
        config,
        items: &items,
        actions: &actions,
        behaviors: &behaviors,
    }
    .build(&file)
}

fn camera_zoom(world_scale: f32) -> Vec2 {
    vec2(
        world_scale * 2.0 / screen_width().max(1.0),
        world_scale * 2.0 / screen_height().max(1.0),
    )
}

fn draw_banner(label: &str) {
    let size = measure_text(label, None, BANNER_FONT_SIZE as u16, 1.0);
    let pos = calc_center(vec2(size.width, size.height), vec2(screen_width(), screen_height()));
    draw_rectangle(0.0, 0.0, screen_width(), screen_height(), Color::new(0.0, 0.0, 0.0, 0.5));
    draw_text(label, pos.x, pos.y + size.offset_y, BANNER_FONT_SIZE, WHITE);
}

fn draw_scene(game: &Game, config: &GameConfig, glow: f32) {
    let Some(scene) = game.scene() else {
        return;
    };
    let mut order: Vec<_> = scene
        .entities()
        .iter()
        .filter(|(_, object)| object.is_visible())
        .collect();
    order.sort_by(|(_, a), (_, b)| a.scene().z().total_cmp(&b.scene().z()));

    for (_, object) in &order {
        let base = object.scene();
        let rect = base.rect();
        // trigger zones have no frame and stay invisible
        if let Some(frame) = base.frame() {
            let mut color = frame_color(frame);
            if base.name() == "torch" {
                color = Color::new(color.r * glow, color.g * glow, color.b * 0.6 * glow, 1.0);
            }
            draw_rectangle(rect.x, rect.y, rect.w, rect.h, color);
        }
        // facing marker: a dark stripe on the leading half
        if object.character().is_some() {
            let half = rect.w * 0.5;
            let x = if base.facing_scale().x < 0.0 { rect.x } else { rect.x + half };
            draw_line(x, rect.y + 2.0, x + half, rect.y + 2.0, 1.0, BLACK);
        }
        if config.debug_hitboxes && object.body().is_some_and(|body| body.is_collidable()) {
            draw_hitbox(object.bounding_box());
        }
    }
}

fn draw_hud(game: &Game) {
    let (Some(scene), Some(player)) = (game.scene(), game.player()) else {
        return;
    };
    let Some(character) = scene.entities().character(player) else {
        return;
    };
    let mut y = HUD_FONT_SIZE;
    for (slot, item) in character.inventory().iter().enumerate() {
        draw_text(&format!("{}: {} x{}", slot + 1, item.name(), item.qty), 12.0, y, HUD_FONT_SIZE, WHITE);
        y += HUD_FONT_SIZE;
    }
    if let Some(hovered) = scene.hovered().and_then(|id| scene.entities().get(id)) {
        draw_text(hovered.scene().name(), 12.0, screen_height() - 12.0, HUD_FONT_SIZE, YELLOW);
    }
}

#[macroquad::main(window_conf)]
async fn main() {
    let config = load_config();
    let mut game = Game::new(config.world_scale);
    let mut controls = Controls::new(config.player_max_velocity, config.zoom_step);

    clear_background(BLACK);
    draw_banner("Loading");
    next_frame().await;

    let flicker = Rc::new(Cell::new(0.0f32));
    match load_level(&config) {
        Ok(mut level) => {
            let phase = Rc::clone(&flicker);
            level.scene.on_tick(Box::new(move |dt: f32| phase.set(phase.get() + dt * FLICKER_SPEED)));
            game.start(level);
        }
        Err(err) => error!("level load failed: {err}"),
    }

    let mut camera = Camera2D {
        zoom: camera_zoom(game.world_scale()),
        ..Default::default()
    };
    if let Some(rect) = game.scene().map(|scene| scene.bounds().rect()) {
        camera.target = rect.center();
    }

    loop {
        let dt = get_frame_time();

        for (action, pressed) in controls.poll() {
            if let Err(err) = controls.apply(&mut game, action, pressed) {
                error!("input listener failed: {err}");
                game.pause();
            }
        }

        if let Err(err) = game.tick(dt) {
            error!("tick failed: {err}");
            game.pause();
        }

        camera.zoom = camera_zoom(game.world_scale());
        let focus = game
            .player()
            .zip(game.scene())
            .and_then(|(player, scene)| scene.entities().body(player))
            .map(|body| body.bounding_box().center());
        if let Some(focus) = focus {
            let follow = 1.0 - (-CAMERA_DRAG * dt).exp();
            camera.target += (focus - camera.target) * follow;
        }

        if game.mode() == GameMode::Playing {
            let (mx, my) = mouse_position();
            let world = camera.screen_to_world(vec2(mx, my));
            if let Some(scene) = game.scene_mut() {
                let mut result = scene.pointer_moved(world).map(|_| None);
                if is_mouse_button_pressed(MouseButton::Left) && result.is_ok() {
                    result = scene.click(world);
                }
                match result {
                    Ok(Some(target)) => info!("clicked {target}"),
                    Ok(None) => {}
                    Err(err) => {
                        error!("pointer listener failed: {err}");
                        game.pause();
                    }
                }
            }
        }

        clear_background(BLACK);
        set_camera(&camera);
        let glow = 0.85 + 0.15 * flicker.get().sin();
        draw_scene(&game, &config, glow);

        set_default_camera();
        draw_hud(&game);
        match game.mode() {
            GameMode::Loading => draw_banner("Loading"),
            GameMode::Paused => draw_banner("Paused"),
            GameMode::Playing => {}
        }

        next_frame().await;
    }
}
