//! Per-user directory management
//!
//! Provides the per-user locations for the user config, the board registry
//! and the build contexts of toolchain base images.
//!
//! Environment variables can override default directories:
//! - `IOTZ_CONFIG_DIR` - Override config directory
//! - `IOTZ_CACHE_DIR` - Override cache directory

use std::env;
use std::path::{Path, PathBuf};

/// Environment variable names for directory overrides
pub const ENV_CONFIG_DIR: &str = "IOTZ_CONFIG_DIR";
pub const ENV_CACHE_DIR: &str = "IOTZ_CACHE_DIR";

/// Application name used in directory paths
const APP_NAME: &str = "iotz";

const EXTENSIONS_SUBDIR: &str = "extensions";

/// Per-user directory provider for iotz
#[derive(Debug, Clone)]
pub struct IotzDirs {
    config_dir: PathBuf,
    cache_dir: PathBuf,
}

impl IotzDirs {
    /// Resolve directories from the environment or platform defaults
    #[must_use]
    pub fn new() -> Self {
        Self {
            config_dir: Self::resolve(ENV_CONFIG_DIR, dirs::config_dir, ".config"),
            cache_dir: Self::resolve(ENV_CACHE_DIR, dirs::cache_dir, ".cache"),
        }
    }

    /// Root both directories at `root` (used by tests and `--config-dir`)
    #[must_use]
    pub fn at(root: &Path) -> Self {
        Self {
            config_dir: root.join("config"),
            cache_dir: root.join("cache"),
        }
    }

    /// Config directory (`$XDG_CONFIG_HOME/iotz` or `~/.config/iotz` on Linux)
    #[must_use]
    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Cache directory (`$XDG_CACHE_HOME/iotz` or `~/.cache/iotz` on Linux)
    #[must_use]
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// `config.json`: installed extensions
    #[must_use]
    pub fn user_config_path(&self) -> PathBuf {
        self.config_dir.join("config.json")
    }

    /// Raw board-definition dump taken from the arduino base image
    #[must_use]
    pub fn board_source_path(&self) -> PathBuf {
        self.config_dir.join("boards.txt")
    }

    /// Parsed board registry, fingerprinted against [`Self::board_source_path`]
    #[must_use]
    pub fn board_cache_path(&self) -> PathBuf {
        self.cache_dir.join("boards.json")
    }

    /// Build context for a toolchain base image
    #[must_use]
    pub fn extension_dir(&self, toolchain: &str) -> PathBuf {
        self.config_dir.join(EXTENSIONS_SUBDIR).join(toolchain)
    }

    fn resolve(var: &str, platform: fn() -> Option<PathBuf>, home_fallback: &str) -> PathBuf {
        if let Ok(path) = env::var(var) {
            return PathBuf::from(path);
        }

        platform().map(|p| p.join(APP_NAME)).unwrap_or_else(|| {
            dirs::home_dir()
                .map(|h| h.join(home_fallback).join(APP_NAME))
                .unwrap_or_else(|| PathBuf::from(".").join(home_fallback).join(APP_NAME))
        })
    }
}

impl Default for IotzDirs {
    fn default() -> Self {
        Self::new()
    }
}
