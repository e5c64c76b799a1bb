//! Game configuration resource.
//!
//! Settings load from an INI file and fall back to safe defaults when the
//! file or individual keys are missing.
//!
//! # Configuration File Format
//!
//! ```ini
//! [window]
//! target_fps = 60
//! fullscreen = false
//!
//! [scene]
//! start = ./assets/scenes/arena.json
//! ```

use std::path::PathBuf;

use configparser::ini::Ini;
use log::info;
use thiserror::Error;

const DEFAULT_TARGET_FPS: u32 = 60;
const DEFAULT_FULLSCREEN: bool = false;
const DEFAULT_START_SCENE: &str = "./assets/scenes/arena.json";
const DEFAULT_CONFIG_PATH: &str = "./config.ini";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load config file: {0}")]
    Load(String),
    #[error("failed to save config file: {0}")]
    Save(String),
}

/// Engine configuration.
///
/// `target_fps` derives the fixed simulation timestep; `start_scene` is
/// the scene loaded on startup.
#[derive(Debug, Clone)]
pub struct GameConfig {
    pub target_fps: u32,
    pub fullscreen: bool,
    pub start_scene: PathBuf,
    pub config_path: PathBuf,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl GameConfig {
    /// Configuration with safe default values.
    pub fn new() -> Self {
        Self {
            target_fps: DEFAULT_TARGET_FPS,
            fullscreen: DEFAULT_FULLSCREEN,
            start_scene: PathBuf::from(DEFAULT_START_SCENE),
            config_path: PathBuf::from(DEFAULT_CONFIG_PATH),
        }
    }

    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: path.into(),
            ..Self::new()
        }
    }

    /// Load from the INI file. Missing keys keep their current values.
    pub fn load_from_file(&mut self) -> Result<(), ConfigError> {
        let mut config = Ini::new();
        config
            .load(&self.config_path)
            .map_err(|e| ConfigError::Load(e.to_string()))?;

        if let Some(fps) = config.getuint("window", "target_fps").ok().flatten() {
            self.target_fps = (fps as u32).max(1);
        }
        if let Some(fullscreen) = config.getbool("window", "fullscreen").ok().flatten() {
            self.fullscreen = fullscreen;
        }
        if let Some(scene) = config.get("scene", "start") {
            self.start_scene = PathBuf::from(scene);
        }

        info!(
            "Loaded config: fps={}, fullscreen={}, scene={:?}",
            self.target_fps, self.fullscreen, self.start_scene
        );
        Ok(())
    }

    /// Save to the INI file, creating it if needed.
    pub fn save_to_file(&self) -> Result<(), ConfigError> {
        let mut config = Ini::new();
        config.set("window", "target_fps", Some(self.target_fps.to_string()));
        config.set("window", "fullscreen", Some(self.fullscreen.to_string()));
        config.set(
            "scene",
            "start",
            Some(self.start_scene.to_string_lossy().to_string()),
        );
        config
            .write(&self.config_path)
            .map_err(|e| ConfigError::Save(e.to_string()))?;
        info!("Saved config to {:?}", self.config_path);
        Ok(())
    }

    /// Fixed simulation timestep derived from the target framerate.
    pub fn fixed_dt(&self) -> f32 {
        1.0 / self.target_fps.max(1) as f32
    }
}
