//! Persisted front-end state: last file, algorithm and compare value.
//!
//! The hashing core never touches this; the binary loads it at startup and
//! writes it back after a run.

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::hash::HashUtilityError;

const SETTINGS_DIR: &str = "hasher";
const SETTINGS_FILE: &str = "settings.toml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
    #[serde(default = "default_algorithm")]
    pub algorithm: String,
    #[serde(default)]
    pub compare_to: String,
}

fn default_algorithm() -> String {
    "SHA-256".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            file: None,
            algorithm: default_algorithm(),
            compare_to: String::new(),
        }
    }
}

impl Settings {
    /// `<config dir>/hasher/settings.toml`, when the platform has a config dir
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(SETTINGS_DIR).join(SETTINGS_FILE))
    }

    /// Load from the default location, falling back to defaults
    pub fn load() -> Self {
        match Self::default_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    /// Load from `path`. A missing or unreadable file yields defaults.
    pub fn load_from(path: &Path) -> Self {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) => {
                debug!("No settings loaded from {}: {}", path.display(), e);
                return Self::default();
            }
        };

        toml::from_str(&text).unwrap_or_else(|e| {
            warn!("Ignoring malformed settings {}: {}", path.display(), e);
            Self::default()
        })
    }

    /// Save to the default location
    pub fn save(&self) -> Result<(), HashUtilityError> {
        match Self::default_path() {
            Some(path) => self.save_to(&path),
            None => Ok(()),
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<(), HashUtilityError> {
        let write_error = |reason: String| HashUtilityError::SettingsWriteError {
            path: path.to_path_buf(),
            reason,
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| write_error(e.to_string()))?;
        }
        let text = toml::to_string_pretty(self).map_err(|e| write_error(e.to_string()))?;
        fs::write(path, text).map_err(|e| write_error(e.to_string()))
    }
}
