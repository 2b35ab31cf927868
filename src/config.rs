//! Host process configuration.
//!
//! Loaded from `{config_dir}/kubedeck/config.toml`. A missing or
//! unparsable file falls back to defaults, so a fresh install needs no
//! setup step. The status TTL is a protocol constant and deliberately not
//! configurable here.

use crate::error::{DeckError, Result};
use crate::plugins::status::StatusStore;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeckConfig {
    /// Broadcast capacity for host -> UI events.
    pub event_capacity: usize,
    /// Mirror stderr diagnostics into a daily-rotated file under the
    /// platform data directory.
    pub file_logs: bool,
    /// Override for the plugin status table location.
    pub status_path: Option<PathBuf>,
}

impl Default for DeckConfig {
    fn default() -> Self {
        Self {
            event_capacity: 128,
            file_logs: false,
            status_path: None,
        }
    }
}

impl DeckConfig {
    /// Returns the path to the config file
    /// (`{config_dir}/kubedeck/config.toml`).
    #[must_use]
    pub fn config_file_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("kubedeck").join("config.toml"))
    }

    /// Load configuration from the default location. Returns defaults if
    /// the file is missing or cannot be parsed.
    #[must_use]
    pub fn load() -> Self {
        match Self::config_file_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    /// Load configuration from an explicit path, defaulting on any failure.
    #[must_use]
    pub fn load_from(path: &Path) -> Self {
        let raw = match std::fs::read_to_string(path) {
            Ok(r) => r,
            Err(_) => return Self::default(),
        };
        toml::from_str(&raw).unwrap_or_default()
    }

    /// Persist the configuration to the default location.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()
            .ok_or_else(|| DeckError::Config("cannot determine config directory".to_owned()))?;
        self.save_to(&path)
    }

    /// Persist the configuration to an explicit path.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                DeckError::Config(format!(
                    "cannot create config directory {}: {e}",
                    parent.display()
                ))
            })?;
        }

        let toml = toml::to_string_pretty(self)
            .map_err(|e| DeckError::Config(format!("cannot serialize config: {e}")))?;

        std::fs::write(path, toml)
            .map_err(|e| DeckError::Config(format!("cannot write config to {}: {e}", path.display())))
    }

    /// Open the status store, honouring the configured path override.
    pub fn status_store(&self) -> Result<StatusStore> {
        match &self.status_path {
            Some(path) => Ok(StatusStore::at_path(path)),
            None => StatusStore::open_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;

    #[test]
    fn defaults_are_sensible() {
        let config = DeckConfig::default();
        assert_eq!(config.event_capacity, 128);
        assert!(!config.file_logs);
        assert!(config.status_path.is_none());
    }

    #[test]
    fn config_file_path_is_under_kubedeck() {
        let path = DeckConfig::config_file_path().expect("config dir available");
        let path_str = path.to_string_lossy().to_string();
        assert!(path_str.contains("kubedeck"));
        assert!(path_str.ends_with("config.toml"));
    }

    #[test]
    fn load_from_missing_file_returns_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = DeckConfig::load_from(&dir.path().join("nope.toml"));
        assert_eq!(config, DeckConfig::default());
    }

    #[test]
    fn load_from_garbage_returns_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "event_capacity = \"lots\"").unwrap();
        assert_eq!(DeckConfig::load_from(&path), DeckConfig::default());
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let config = DeckConfig {
            event_capacity: 32,
            file_logs: true,
            status_path: Some(dir.path().join("status.json")),
        };
        config.save_to(&path).unwrap();

        let restored = DeckConfig::load_from(&path);
        assert_eq!(restored, config);
    }

    #[test]
    fn partial_toml_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "file_logs = true\n").unwrap();

        let config = DeckConfig::load_from(&path);
        assert!(config.file_logs);
        assert_eq!(config.event_capacity, 128);
    }

    #[test]
    fn status_store_honours_override() {
        let dir = tempfile::tempdir().unwrap();
        let override_path = dir.path().join("elsewhere.json");
        let config = DeckConfig {
            status_path: Some(override_path.clone()),
            ..DeckConfig::default()
        };

        let store = config.status_store().unwrap();
        store
            .set(
                "traces",
                crate::plugins::status::PluginAction::Install,
                3,
                r#"{"type":"info","message":"Plugin Installation Started"}"#,
            )
            .unwrap();
        assert!(override_path.exists());
    }
}
