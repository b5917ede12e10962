use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub tile_size: f32,
    /// Tiles per second.
    pub player_max_velocity: f32,
    pub world_scale: f32,
    pub zoom_step: f32,
    pub z_multiplier: f32,
    pub z_offset: f32,
    pub debug_hitboxes: bool,
    pub verbose: bool,
    pub level_path: PathBuf,
    pub item_dir: PathBuf,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            tile_size: 16.0,
            player_max_velocity: 3.0,
            world_scale: 4.0,
            zoom_step: 0.5,
            z_multiplier: 1.0,
            z_offset: 10.0,
            debug_hitboxes: false,
            verbose: false,
            level_path: PathBuf::from("src/level/dungeon.json"),
            item_dir: PathBuf::from("src/item"),
        }
    }
}

impl GameConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_yaml(&std::fs::read_to_string(path)?)
    }

    pub fn from_yaml(raw: &str) -> Result<Self, ConfigError> {
        let config: GameConfig = serde_yaml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.tile_size.is_nan() || self.tile_size <= 0.0 {
            return Err(ConfigError::Invalid(format!("tile_size must be positive, got {}", self.tile_size)));
        }
        if self.player_max_velocity.is_nan() || self.player_max_velocity < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "player_max_velocity must not be negative, got {}",
                self.player_max_velocity
            )));
        }
        if self.world_scale.is_nan() || self.world_scale <= 0.0 {
            return Err(ConfigError::Invalid(format!("world_scale must be positive, got {}", self.world_scale)));
        }
        Ok(())
    }
}
