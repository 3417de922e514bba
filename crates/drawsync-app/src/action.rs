//! Scripted user actions.

use drawsync_core::{DashStyle, PointerEvent};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// One user action, as a toolbar or the pointer would produce it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    /// Pointer input in client coordinates.
    Pointer { event: PointerEvent },
    /// Change the current tool by toolbar name (`brush`, `rectangle`, `circle`, `line`).
    Tool { name: String },
    /// Change stroke color.
    Color { color: String },
    /// Change stroke width.
    LineWidth { width: f64 },
    /// Change stroke opacity.
    Opacity { opacity: f64 },
    /// Change dash pattern.
    Dash { dash: DashStyle },
    /// Switch to the eraser.
    Eraser,
    /// Switch to the translucent eraser.
    SmartEraser,
    Undo,
    Redo,
    /// Clear the surface and history.
    Clear,
    ZoomIn,
    ZoomOut,
    /// Move the surface origin in client space.
    Pan { x: f64, y: f64 },
    /// Give the relay time to deliver, then apply what arrived.
    Wait { millis: u64 },
}

/// Script loading errors.
#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("Failed to read script {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid actions in {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Read a script: a JSON array of actions.
pub fn load_script(path: &Path) -> Result<Vec<Action>, ScriptError> {
    let json = std::fs::read_to_string(path).map_err(|source| ScriptError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&json).map_err(|source| ScriptError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
