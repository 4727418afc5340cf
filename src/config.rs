//! Viewer settings
//!
//! Stored as RON. Every field has a default, so a config file only needs
//! the values it changes.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::rasterizer::{ColorMode, Lens, Lighting, Vec3};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    ParseError(#[from] ron::error::SpannedError),

    #[error("Serialize error: {0}")]
    SerializeError(#[from] ron::Error),

    #[error("Invalid setting: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Frames per second; also fixes the animation step
    pub fps: u32,
    /// Vertical field of view in degrees
    pub fov: f64,
    pub near: f64,
    pub far: f64,
    /// Triangles closer to the camera than this are skipped
    pub near_clip: f64,
    pub ambient: f64,
    /// Direction the light travels; normalized on use
    pub light_dir: Vec3,
    pub color_mode: ColorMode,
    /// `env_logger` filter, overridden by `RUST_LOG`
    pub log_level: String,
    /// Log records go here; the terminal itself is busy rendering
    pub log_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            fps: 30,
            fov: 45.0,
            near: 0.1,
            far: 1000.0,
            near_clip: 0.1,
            ambient: 0.1,
            light_dir: Vec3::new(0.4, -0.7, -0.3),
            color_mode: ColorMode::TrueColor,
            log_level: "warn".to_string(),
            log_file: None,
        }
    }
}

impl Config {
    /// Load and validate a RON config file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::from_str(&contents)
    }

    /// Parse and validate RON text
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Result<Self, ConfigError> {
        let config: Config = ron::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(2)
            .indentor("  ".to_string());

        let contents = ron::ser::to_string_pretty(self, pretty)?;
        fs::write(path, contents)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.fps == 0 {
            return Err(ConfigError::Invalid("fps must be at least 1".into()));
        }
        if !(self.fov > 0.0 && self.fov < 180.0) {
            return Err(ConfigError::Invalid(format!("fov {} is outside (0, 180)", self.fov)));
        }
        if !(self.near > 0.0 && self.far > self.near) {
            return Err(ConfigError::Invalid(format!(
                "need 0 < near < far, got near {} far {}",
                self.near, self.far
            )));
        }
        if !(self.near_clip >= 0.0) {
            return Err(ConfigError::Invalid(format!("near_clip {} is negative", self.near_clip)));
        }
        if !(0.0..=1.0).contains(&self.ambient) {
            return Err(ConfigError::Invalid(format!("ambient {} is outside [0, 1]", self.ambient)));
        }
        if self.light_dir.len() == 0.0 {
            return Err(ConfigError::Invalid("light_dir must not be zero".into()));
        }
        Ok(())
    }

    /// Lens for a surface of the given aspect ratio
    pub fn lens(&self, aspect: f64) -> Lens {
        Lens {
            fov: self.fov,
            near: self.near,
            far: self.far,
            aspect,
        }
    }

    pub fn lighting(&self) -> Lighting {
        Lighting::new(self.light_dir, self.ambient)
    }
}
