//! Configuration file handling.
//!
//! The concrete application config lives next to the crates that own the
//! tunables; this module only knows where config files live and how to
//! read and write them as JSON.

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::PulseResult;

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "fingerpulse=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// Load a JSON config from `path`, falling back to defaults.
///
/// A missing file is silent; an unreadable or malformed file is logged
/// and replaced by `T::default()`.
pub fn load_or_default<T>(path: &Path) -> T
where
    T: DeserializeOwned + Default,
{
    if path.exists() {
        match std::fs::read_to_string(path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(config) => return config,
                Err(e) => {
                    tracing::warn!("Failed to parse config at {:?}: {}", path, e);
                }
            },
            Err(e) => {
                tracing::warn!("Failed to read config at {:?}: {}", path, e);
            }
        }
    }
    T::default()
}

/// Save a config as pretty-printed JSON, creating parent directories.
pub fn save_json<T: Serialize>(value: &T, path: &Path) -> PulseResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(path, json)?;
    Ok(())
}

/// Standard config file location.
pub fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("fingerpulse").join("config.json")
}
