//! Git operations
//!
//! Clones project templates using the gix crate.

use gix::remote::fetch::Shallow;
use std::num::NonZeroU32;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Git operation errors
#[derive(Error, Debug)]
pub enum GitError {
    /// Failed to clone repository
    #[error("Failed to clone '{url}': {error}")]
    CloneFailed { url: String, error: String },

    /// Destination already exists
    #[error("Destination '{path}' already exists")]
    DestinationExists { path: PathBuf },
}

/// Shallow-clone `url` into `dest` and check out the default branch
///
/// `dest` must not exist yet.
pub fn clone_template(url: &str, dest: &Path) -> Result<PathBuf, GitError> {
    if dest.exists() {
        return Err(GitError::DestinationExists {
            path: dest.to_path_buf(),
        });
    }

    let clone_failed = |e: &dyn std::fmt::Display| GitError::CloneFailed {
        url: url.to_string(),
        error: e.to_string(),
    };

    tracing::info!("Cloning {} into {}", url, dest.display());

    let mut prepare = gix::prepare_clone(url, dest).map_err(|e| clone_failed(&e))?;
    prepare = prepare.with_shallow(Shallow::DepthAtRemote(NonZeroU32::MIN));

    let (mut checkout, _outcome) = prepare
        .fetch_then_checkout(gix::progress::Discard, &gix::interrupt::IS_INTERRUPTED)
        .map_err(|e| clone_failed(&e))?;

    let (_repo, _outcome) = checkout
        .main_worktree(gix::progress::Discard, &gix::interrupt::IS_INTERRUPTED)
        .map_err(|e| clone_failed(&e))?;

    Ok(dest.to_path_buf())
}
