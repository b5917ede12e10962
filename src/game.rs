use log::info;

use crate::entity::EntityId;
use crate::event::ListenerError;
use crate::level::Level;
use crate::scene::{Scene, TickReport};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum GameMode {
    #[default]
    Loading,
    Playing,
    Paused,
}

pub const MIN_WORLD_SCALE: f32 = 0.5;

pub struct Game {
    mode: GameMode,
    scene: Option<Scene>,
    player: Option<EntityId>,
    world_scale: f32,
}

impl Game {
    pub fn new(world_scale: f32) -> Self {
        Self {
            mode: GameMode::Loading,
            scene: None,
            player: None,
            world_scale: world_scale.max(MIN_WORLD_SCALE),
        }
    }

    pub fn start(&mut self, level: Level) {
        info!("starting level with {} objects", level.scene.entities().len());
        self.scene = Some(level.scene);
        self.player = Some(level.player);
        self.set_mode(GameMode::Playing);
    }

    pub fn mode(&self) -> GameMode {
        self.mode
    }

    fn set_mode(&mut self, mode: GameMode) {
        if self.mode != mode {
            info!("game mode {:?} -> {:?}", self.mode, mode);
            self.mode = mode;
        }
    }

    pub fn pause(&mut self) {
        if self.mode == GameMode::Playing {
            self.set_mode(GameMode::Paused);
        }
    }

    pub fn resume(&mut self) {
        if self.mode == GameMode::Paused {
            self.set_mode(GameMode::Playing);
        }
    }

    /// Loading stays loading.
    pub fn toggle_pause(&mut self) {
        match self.mode {
            GameMode::Playing => self.pause(),
            GameMode::Paused => self.resume(),
            GameMode::Loading => {}
        }
    }

    pub fn scene(&self) -> Option<&Scene> {
        self.scene.as_ref()
    }

    pub fn scene_mut(&mut self) -> Option<&mut Scene> {
        self.scene.as_mut()
    }

    pub fn player(&self) -> Option<EntityId> {
        self.player
    }

    pub fn world_scale(&self) -> f32 {
        self.world_scale
    }

    pub fn zoom(&mut self, step: f32) {
        self.world_scale = (self.world_scale + step).max(MIN_WORLD_SCALE);
    }

    /// Advances the scene only while playing.
    pub fn tick(&mut self, delta: f32) -> Result<Option<TickReport>, ListenerError> {
        if self.mode != GameMode::Playing {
            return Ok(None);
        }
        match self.scene.as_mut() {
            Some(scene) => scene.tick(delta).map(Some),
            None => Ok(None),
        }
    }
}
