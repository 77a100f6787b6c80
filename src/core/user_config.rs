//! Per-user configuration
//!
//! `config.json` in the iotz config directory records which toolchain base
//! images have been built on this machine, so that later runs skip the
//! (slow) installation step. The file is read once at start-up and written
//! back after a toolchain has been installed.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::defaults::USER_CONFIG_VERSION;
use crate::infra::dirs::IotzDirs;

/// User configuration error types
#[derive(Error, Debug)]
pub enum UserConfigError {
    /// Failed to read or write the config file
    #[error("Failed to access config file '{path}': {error}")]
    Io { path: String, error: String },

    /// Failed to parse config file
    #[error("Failed to parse config file '{path}': {error}")]
    Parse { path: String, error: String },
}

/// An installed toolchain extension
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstalledExtension {
    /// Tag of the base image built for the toolchain
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

/// Contents of `config.json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserConfig {
    #[serde(default = "default_version")]
    pub version: u32,

    /// Installed extensions by toolchain name
    #[serde(default)]
    pub extensions: BTreeMap<String, InstalledExtension>,
}

fn default_version() -> u32 {
    USER_CONFIG_VERSION
}

impl Default for UserConfig {
    fn default() -> Self {
        Self {
            version: USER_CONFIG_VERSION,
            extensions: BTreeMap::new(),
        }
    }
}

impl UserConfig {
    /// Load from the per-user config directory
    pub fn load(dirs: &IotzDirs) -> Result<Self, UserConfigError> {
        Self::load_from_path(&dirs.user_config_path())
    }

    /// Load from a specific path
    ///
    /// A missing file yields the default configuration; an unreadable one is
    /// an error.
    pub fn load_from_path(path: &Path) -> Result<Self, UserConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| UserConfigError::Io {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;

        serde_json::from_str(&content).map_err(|e| UserConfigError::Parse {
            path: path.display().to_string(),
            error: e.to_string(),
        })
    }

    /// Save to the per-user config directory
    pub fn save(&self, dirs: &IotzDirs) -> Result<(), UserConfigError> {
        self.save_to_path(&dirs.user_config_path())
    }

    /// Save to a specific path, creating parent directories
    pub fn save_to_path(&self, path: &Path) -> Result<(), UserConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| UserConfigError::Io {
                path: parent.display().to_string(),
                error: e.to_string(),
            })?;
        }

        let content = serde_json::to_string_pretty(self).map_err(|e| UserConfigError::Parse {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;

        fs::write(path, content).map_err(|e| UserConfigError::Io {
            path: path.display().to_string(),
            error: e.to_string(),
        })
    }

    pub fn is_installed(&self, toolchain: &str) -> bool {
        self.extensions.contains_key(toolchain)
    }

    /// Record a toolchain whose base image has been built
    pub fn record_extension(&mut self, toolchain: &str, image: impl Into<String>) {
        self.extensions.insert(
            toolchain.to_string(),
            InstalledExtension {
                image: Some(image.into()),
            },
        );
    }

    /// Names of the installed toolchains, sorted
    pub fn installed(&self) -> impl Iterator<Item = &str> {
        self.extensions.keys().map(String::as_str)
    }
}
