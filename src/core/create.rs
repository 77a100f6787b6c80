//! Project scaffolding (`iotz create`)
//!
//! Delegates to the toolchain's `create_project`. Apart from esp32, which
//! clones a template, this needs neither docker nor network access.

use std::path::{Path, PathBuf};

use crate::core::extension::ExtensionRegistry;
use crate::error::{ExtensionError, Result};
use crate::registry::BoardRegistry;

/// Result of scaffolding a project
#[derive(Debug)]
pub struct CreateResult {
    /// Canonical toolchain name
    pub toolchain: &'static str,
    /// Directory holding the new project
    pub project_dir: PathBuf,
}

/// Create a `toolchain` project below `parent`
///
/// `args` are the remaining positional arguments: an optional target board
/// (for board-based toolchains) followed by an optional project name.
pub fn create_project(
    extensions: &ExtensionRegistry,
    boards: &BoardRegistry,
    parent: &Path,
    toolchain: Option<&str>,
    args: &[String],
) -> Result<CreateResult> {
    let toolchain = toolchain
        .filter(|t| !t.is_empty())
        .ok_or(ExtensionError::CreateUsage)?;
    let extension = extensions.get(toolchain)?;

    let project_dir = extension.create_project(parent, args, boards)?;
    tracing::info!("Created {} project at {}", extension.name(), project_dir.display());

    Ok(CreateResult {
        toolchain: extension.name(),
        project_dir,
    })
}
