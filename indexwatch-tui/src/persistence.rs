//! UI preferences: JSON save/load across restarts.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::app::{AppState, Overlay};

/// Serializable subset of app state that persists across restarts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistedPrefs {
    /// Last chart window, before clamping to the session.
    pub window_blocks: Option<usize>,
    pub help_dismissed: bool,
}

/// `<config dir>/indexwatch/prefs.json`, relative to `.` without a config dir.
pub fn default_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("indexwatch")
        .join("prefs.json")
}

/// Load prefs from disk. Returns defaults if file is missing or corrupt.
pub fn load(path: &Path) -> PersistedPrefs {
    match std::fs::read_to_string(path) {
        Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
            tracing::warn!(path = %path.display(), error = %e, "ignoring corrupt prefs file");
            PersistedPrefs::default()
        }),
        Err(_) => PersistedPrefs::default(),
    }
}

/// Save prefs to disk. Creates parent directories if needed.
pub fn save(path: &Path, prefs: &PersistedPrefs) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(prefs)?;
    std::fs::write(path, json)?;
    Ok(())
}

/// Extract prefs from AppState.
pub fn extract(app: &AppState) -> PersistedPrefs {
    PersistedPrefs {
        window_blocks: Some(app.window_blocks),
        help_dismissed: app.overlay != Overlay::Help,
    }
}

/// Apply prefs to AppState. First run opens the help overlay.
pub fn apply(app: &mut AppState, prefs: PersistedPrefs) {
    if let Some(blocks) = prefs.window_blocks {
        app.window_blocks = blocks.max(1);
    }
    if !prefs.help_dismissed {
        app.overlay = Overlay::Help;
    }
}
