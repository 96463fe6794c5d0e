//! Configuration file loading.
//!
//! Settings are read once at startup from `coach.toml` (every field has a
//! default) and then from the `STOCKFISH_PATH` / `MAIA_PATH` environment
//! variables.

use crate::EngineKind;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur when loading or parsing configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),
    /// Failed to parse the configuration file as valid TOML.
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),
}

/// Launch settings for one engine.
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct EngineConfig {
    /// Executable path or bare program name. When unset the locator searches
    /// conventional install locations.
    #[serde(default)]
    pub path: Option<PathBuf>,
    /// Extra command-line arguments (e.g. `--weights=maia-1500.pb.gz`).
    #[serde(default)]
    pub args: Vec<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct EnginesConfig {
    #[serde(default)]
    pub strong: EngineConfig,
    #[serde(default)]
    pub human_like: EngineConfig,
}

impl EnginesConfig {
    pub fn get(&self, kind: EngineKind) -> &EngineConfig {
        match kind {
            EngineKind::Strong => &self.strong,
            EngineKind::HumanLike => &self.human_like,
        }
    }
}

/// Search defaults and request bounds.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct SearchConfig {
    #[serde(default = "default_analysis_depth")]
    pub analysis_depth: u32,
    /// Lines (multi-PV) returned by a default analysis.
    #[serde(default = "default_analysis_lines")]
    pub analysis_lines: u32,
    #[serde(default = "default_evaluation_depth")]
    pub evaluation_depth: u32,
    #[serde(default = "default_move_time_ms")]
    pub move_time_ms: u64,
    #[serde(default = "default_elo")]
    pub default_elo: u32,
    #[serde(default = "default_max_depth")]
    pub max_depth: u32,
    #[serde(default = "default_max_lines")]
    pub max_lines: u32,
    /// Moves kept from each principal variation.
    #[serde(default = "default_pv_length")]
    pub pv_length: usize,
}

fn default_analysis_depth() -> u32 {
    20
}

fn default_analysis_lines() -> u32 {
    3
}

fn default_evaluation_depth() -> u32 {
    18
}

fn default_move_time_ms() -> u64 {
    1000
}

fn default_elo() -> u32 {
    1200
}

fn default_max_depth() -> u32 {
    30
}

fn default_max_lines() -> u32 {
    5
}

fn default_pv_length() -> usize {
    5
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            analysis_depth: default_analysis_depth(),
            analysis_lines: default_analysis_lines(),
            evaluation_depth: default_evaluation_depth(),
            move_time_ms: default_move_time_ms(),
            default_elo: default_elo(),
            max_depth: default_max_depth(),
            max_lines: default_max_lines(),
            pv_length: default_pv_length(),
        }
    }
}

impl SearchConfig {
    pub fn move_time(&self) -> Duration {
        Duration::from_millis(self.move_time_ms)
    }

    pub fn clamp_depth(&self, depth: u32) -> u32 {
        depth.clamp(1, self.max_depth.max(1))
    }

    pub fn clamp_lines(&self, lines: u32) -> u32 {
        lines.clamp(1, self.max_lines.max(1))
    }
}

/// Wall-clock ceilings for every engine interaction.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct TimeoutConfig {
    /// UCI handshake and `isready` round trips.
    #[serde(default = "default_handshake_ms")]
    pub handshake_ms: u64,
    /// Depth-limited searches.
    #[serde(default = "default_analysis_ms")]
    pub analysis_ms: u64,
    /// Added on top of the move time for time-limited searches.
    #[serde(default = "default_move_grace_ms")]
    pub move_grace_ms: u64,
    /// Waiting for an engine to exit after `quit`, per engine.
    #[serde(default = "default_shutdown_ms")]
    pub shutdown_ms: u64,
}

fn default_handshake_ms() -> u64 {
    10_000
}

fn default_analysis_ms() -> u64 {
    60_000
}

fn default_move_grace_ms() -> u64 {
    5_000
}

fn default_shutdown_ms() -> u64 {
    2_000
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            handshake_ms: default_handshake_ms(),
            analysis_ms: default_analysis_ms(),
            move_grace_ms: default_move_grace_ms(),
            shutdown_ms: default_shutdown_ms(),
        }
    }
}

impl TimeoutConfig {
    pub fn handshake(&self) -> Duration {
        Duration::from_millis(self.handshake_ms)
    }

    pub fn analysis(&self) -> Duration {
        Duration::from_millis(self.analysis_ms)
    }

    pub fn move_grace(&self) -> Duration {
        Duration::from_millis(self.move_grace_ms)
    }

    pub fn shutdown(&self) -> Duration {
        Duration::from_millis(self.shutdown_ms)
    }
}

/// Coaching personas available to the text-generation layer.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Persona {
    Grandmaster,
    #[default]
    FriendlyTeacher,
    AggressiveRival,
}

/// Top-level configuration.
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct CoachConfig {
    #[serde(default)]
    pub engines: EnginesConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub timeouts: TimeoutConfig,
    #[serde(default)]
    pub default_persona: Persona,
}

impl CoachConfig {
    /// Loads `coach.toml` from the working directory, falling back to
    /// defaults when it does not exist, then applies environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::load_from(Self::config_path())?;
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Loads a specific file; a missing file yields the defaults.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            Ok(toml::from_str(&content)?)
        } else {
            Ok(Self::default())
        }
    }

    pub fn config_path() -> PathBuf {
        PathBuf::from("coach.toml")
    }

    /// Applies `STOCKFISH_PATH` and `MAIA_PATH`. Empty values are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(path) = non_empty("STOCKFISH_PATH") {
            self.engines.strong.path = Some(PathBuf::from(path));
        }
        if let Some(path) = non_empty("MAIA_PATH") {
            self.engines.human_like.path = Some(PathBuf::from(path));
        }
    }
}
