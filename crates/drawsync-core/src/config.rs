//! Session configuration.

use crate::history::DEFAULT_HISTORY_KEY;
use crate::operation::StrokeStyle;
use crate::tools::ActiveTool;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {message}")]
    Read { path: PathBuf, message: String },
    #[error("Invalid configuration: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid surface size: {width}x{height}")]
    InvalidSize { width: u32, height: u32 },
}

/// Settings for one drawing session. Every field has a default, so a config
/// file only needs the fields it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Surface width in pixels.
    pub width: u32,
    /// Surface height in pixels.
    pub height: u32,
    /// Key the history is persisted under.
    pub storage_key: String,
    /// Directory for persisted history (None = platform data directory).
    pub storage_dir: Option<PathBuf>,
    /// Relay to join (`ws://` or `wss://`). None = draw offline.
    pub relay_url: Option<String>,
    /// Tool selected at startup.
    pub tool: ActiveTool,
    /// Style selected at startup.
    pub style: StrokeStyle,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            storage_key: DEFAULT_HISTORY_KEY.to_string(),
            storage_dir: None,
            relay_url: None,
            tool: ActiveTool::Freehand,
            style: StrokeStyle::default(),
        }
    }
}

impl SessionConfig {
    /// Parse a JSON config and validate it.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a JSON config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::from_json(&json)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::InvalidSize {
                width: self.width,
                height: self.height,
            });
        }
        Ok(())
    }
}
