//! Container identity of a project directory
//!
//! On unix the identity is the inode of the directory, which survives
//! renames. Elsewhere it is a short SHA-256 of the canonical path.

use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::config::defaults::CONTAINER_MOUNT_ROOT;
use crate::config::images::PROJECT_IMAGE_PREFIX;
use crate::error::FilesystemError;

/// Stable per-directory identity used to name images and containers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerIdentity {
    id: String,
}

impl ContainerIdentity {
    /// Derive the identity of `project_dir`
    pub fn of(project_dir: &Path) -> Result<Self, FilesystemError> {
        let metadata = std::fs::metadata(project_dir).map_err(|e| FilesystemError::Metadata {
            path: project_dir.to_path_buf(),
            error: e.to_string(),
        })?;
        Ok(Self {
            id: Self::platform_id(project_dir, &metadata)?,
        })
    }

    /// Identity with a known id
    pub fn from_id(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    #[cfg(unix)]
    fn platform_id(_path: &Path, metadata: &std::fs::Metadata) -> Result<String, FilesystemError> {
        use std::os::unix::fs::MetadataExt;
        Ok(metadata.ino().to_string())
    }

    #[cfg(not(unix))]
    fn platform_id(path: &Path, _metadata: &std::fs::Metadata) -> Result<String, FilesystemError> {
        let canonical = path.canonicalize().map_err(|e| FilesystemError::Metadata {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;
        Ok(path_hash(&canonical))
    }

    /// Raw identity string
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Per-project image name (`aiot_iotz_<id>`)
    pub fn project_image(&self) -> String {
        format!("{PROJECT_IMAGE_PREFIX}{}", self.id)
    }

    /// Name of the container while a command runs in it
    pub fn instance_name(&self) -> String {
        format!("{}_", self.project_image())
    }
}

/// First 16 hex characters of the SHA-256 of `path`
pub fn path_hash(path: &Path) -> String {
    let digest = Sha256::digest(path.to_string_lossy().as_bytes());
    hex::encode(digest)[..16].to_string()
}

/// Where the project lives inside the container
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountLayout {
    /// Host directory bind-mounted at [`CONTAINER_MOUNT_ROOT`]
    pub host_root: PathBuf,
    /// Project directory as seen from inside the container
    pub container_dir: String,
}

impl MountLayout {
    /// Mount `host_root` and address `project_dir` relative to it
    ///
    /// Falls back to mounting the project directory itself when it is not
    /// below `host_root`.
    pub fn new(project_dir: &Path, host_root: &Path) -> Self {
        match project_dir.strip_prefix(host_root) {
            Ok(relative) if !relative.as_os_str().is_empty() => {
                let relative = relative
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy().into_owned())
                    .collect::<Vec<_>>()
                    .join("/");
                Self {
                    host_root: host_root.to_path_buf(),
                    container_dir: format!("{CONTAINER_MOUNT_ROOT}/{relative}"),
                }
            }
            _ => Self {
                host_root: project_dir.to_path_buf(),
                container_dir: CONTAINER_MOUNT_ROOT.to_string(),
            },
        }
    }

    /// Mount the parent of `project_dir`
    pub fn parent_of(project_dir: &Path) -> Self {
        match project_dir.parent() {
            Some(parent) => Self::new(project_dir, parent),
            None => Self::new(project_dir, project_dir),
        }
    }
}
