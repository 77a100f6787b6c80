//! Board registry cache
//!
//! Parsing the board dump is cheap but not free, so the parsed registry is
//! stored as JSON next to a fingerprint of the dump it came from. The cache
//! is reused while the dump is unchanged.

use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use serde::{Deserialize, Serialize};

use super::BoardRegistry;
use crate::error::BoardError;
use crate::infra::dirs::IotzDirs;
use crate::infra::filesystem;

/// Modification time of the dump a cache was built from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fingerprint {
    pub secs: u64,
    pub nanos: u32,
}

impl Fingerprint {
    fn of(path: &Path) -> Option<Self> {
        let modified = std::fs::metadata(path).ok()?.modified().ok()?;
        let elapsed = modified.duration_since(UNIX_EPOCH).ok()?;
        Some(Self {
            secs: elapsed.as_secs(),
            nanos: elapsed.subsec_nanos(),
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct CacheFile {
    fingerprint: Fingerprint,
    registry: BoardRegistry,
}

/// Cached access to the board registry
#[derive(Debug, Clone)]
pub struct BoardCache {
    /// Board dump written by the arduino toolchain image
    source: PathBuf,
    /// Parsed registry
    cache: PathBuf,
}

impl BoardCache {
    pub fn new(source: PathBuf, cache: PathBuf) -> Self {
        Self { source, cache }
    }

    /// Cache for the per-user locations
    pub fn from_dirs(dirs: &IotzDirs) -> Self {
        Self::new(dirs.board_source_path(), dirs.board_cache_path())
    }

    /// Path of the board dump
    pub fn source_path(&self) -> &Path {
        &self.source
    }

    /// Load the registry
    ///
    /// Without a dump the builtin list is returned. A cache whose fingerprint
    /// matches the dump is reused unless `force_refresh` is set. Builtin
    /// boards missing from the dump (board packages installed per project,
    /// such as AZ3166) are layered under it.
    pub fn load(&self, force_refresh: bool) -> Result<BoardRegistry, BoardError> {
        Ok(self.load_dump(force_refresh)?.layered_over(&BoardRegistry::builtin()))
    }

    fn load_dump(&self, force_refresh: bool) -> Result<BoardRegistry, BoardError> {
        if !self.source.exists() {
            tracing::debug!("No board dump at {}, using builtin boards", self.source.display());
            return Ok(BoardRegistry::default());
        }

        let fingerprint = Fingerprint::of(&self.source);

        if !force_refresh {
            if let Some(registry) = self.read_cache(fingerprint) {
                tracing::debug!("Using cached board list from {}", self.cache.display());
                return Ok(registry);
            }
        }

        let text = filesystem::read_file(&self.source).map_err(|e| BoardError::Cache {
            path: self.source.clone(),
            error: e.to_string(),
        })?;
        let registry = BoardRegistry::from_text(&text);
        tracing::info!("Parsed {} boards from {}", registry.boards().len(), self.source.display());

        if let Some(fingerprint) = fingerprint {
            self.write_cache(fingerprint, &registry);
        }

        Ok(registry)
    }

    fn read_cache(&self, fingerprint: Option<Fingerprint>) -> Option<BoardRegistry> {
        let fingerprint = fingerprint?;
        let content = std::fs::read_to_string(&self.cache).ok()?;
        match serde_json::from_str::<CacheFile>(&content) {
            Ok(file) if file.fingerprint == fingerprint => Some(file.registry),
            Ok(_) => None,
            Err(e) => {
                tracing::debug!("Ignoring unreadable board cache {}: {}", self.cache.display(), e);
                None
            }
        }
    }

    fn write_cache(&self, fingerprint: Fingerprint, registry: &BoardRegistry) {
        let file = CacheFile {
            fingerprint,
            registry: registry.clone(),
        };
        let result = serde_json::to_string(&file)
            .map_err(|e| e.to_string())
            .and_then(|json| filesystem::write_file(&self.cache, &json).map_err(|e| e.to_string()));
        if let Err(e) = result {
            tracing::warn!("Failed to write board cache {}: {}", self.cache.display(), e);
        }
    }
}
