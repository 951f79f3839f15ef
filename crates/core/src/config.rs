//! Replay configuration with file persistence.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Overrides the directory `config.toml` is read from.
pub const CONFIG_DIR_ENV: &str = "HEAP_REPLAY_CONFIG_DIR";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not determine config directory")]
    NoConfigDir,
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplayConfig {
    pub playback: PlaybackConfig,
    pub view: ViewConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Tick period at 1× speed.
    pub base_period_ms: u64,
    pub speed: f64,
    /// Start playing as soon as a snapshot with steps is loaded.
    pub autoplay: bool,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            base_period_ms: 1000,
            speed: 1.0,
            autoplay: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    /// Quiet period before connectors are recomputed after a resize.
    pub resize_quiet_ms: u64,
    pub dark: bool,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            resize_quiet_ms: 150,
            dark: true,
        }
    }
}

impl ReplayConfig {
    pub fn config_dir() -> Result<PathBuf, ConfigError> {
        if let Ok(custom) = env::var(CONFIG_DIR_ENV) {
            return Ok(PathBuf::from(custom));
        }
        dirs::config_dir()
            .map(|d| d.join("heap-replay"))
            .ok_or(ConfigError::NoConfigDir)
    }

    pub fn config_path() -> Result<PathBuf, ConfigError> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load from the default location. A missing file yields defaults.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        tracing::info!(path = %path.display(), "loaded config");
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.playback.base_period_ms == 0 {
            return Err(ConfigError::Invalid {
                key: "playback.base_period_ms",
                reason: "must be at least 1".into(),
            });
        }
        let speed = self.playback.speed;
        if !(speed.is_finite() && speed > 0.0) {
            return Err(ConfigError::Invalid {
                key: "playback.speed",
                reason: format!("{speed} is not a positive multiplier"),
            });
        }
        Ok(())
    }

    pub fn base_period(&self) -> Duration {
        Duration::from_millis(self.playback.base_period_ms)
    }

    pub fn resize_quiet(&self) -> Duration {
        Duration::from_millis(self.view.resize_quiet_ms)
    }
}
