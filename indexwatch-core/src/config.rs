//! Dashboard configuration: the fixed instrument list, the market session and
//! refresh cadence, loaded from a TOML file.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{default_instruments, Instrument};
use crate::session::{MarketSession, DEFAULT_WINDOW_BLOCKS};

/// Default config file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "indexwatch.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("failed to write config {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Everything the dashboard reads at startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Seconds between automatic refreshes.
    pub refresh_secs: u64,
    /// How long a fetched series is reused before hitting the provider again.
    pub cache_ttl_secs: u64,
    /// Preferred chart window in blocks, capped by what the session has produced.
    pub default_window_blocks: usize,
    pub session: MarketSession,
    pub instruments: Vec<Instrument>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            refresh_secs: 15,
            cache_ttl_secs: 10,
            default_window_blocks: DEFAULT_WINDOW_BLOCKS,
            session: MarketSession::default(),
            instruments: default_instruments(),
        }
    }
}

impl DashboardConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(text: &str, origin: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: origin.to_string(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path`. A missing file yields the built-in defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "config file not found, using defaults");
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_toml_str(&text, &path.display().to_string())?;
        tracing::info!(
            path = %path.display(),
            instruments = config.instruments.len(),
            "loaded config"
        );
        Ok(config)
    }

    /// Render as TOML.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Write to `path`, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let write_err = |source| ConfigError::Write {
            path: path.display().to_string(),
            source,
        };
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(write_err)?;
            }
        }
        let text = self.to_toml_string()?;
        std::fs::write(path, text).map_err(write_err)
    }

    /// Structural checks that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.instruments.is_empty() {
            return Err(ConfigError::Invalid("at least one instrument is required".into()));
        }
        let mut seen = HashSet::new();
        for inst in &self.instruments {
            if inst.symbol.trim().is_empty() {
                return Err(ConfigError::Invalid("instrument symbol must not be empty".into()));
            }
            if !seen.insert(inst.symbol.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate instrument symbol '{}'",
                    inst.symbol
                )));
            }
        }
        if self.session.interval_minutes == 0 {
            return Err(ConfigError::Invalid("session.interval_minutes must be > 0".into()));
        }
        if self.session.open >= self.session.close {
            return Err(ConfigError::Invalid(format!(
                "session.open ({}) must be before session.close ({})",
                self.session.open.format("%H:%M"),
                self.session.close.format("%H:%M")
            )));
        }
        if self.refresh_secs == 0 {
            return Err(ConfigError::Invalid("refresh_secs must be > 0".into()));
        }
        if self.default_window_blocks == 0 {
            return Err(ConfigError::Invalid("default_window_blocks must be > 0".into()));
        }
        Ok(())
    }
}
