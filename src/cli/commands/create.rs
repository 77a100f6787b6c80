//! CLI implementation for `iotz create`
//!
//! Scaffolding needs no container; only esp32 reaches the network to clone
//! its template.

use std::path::Path;

use anyhow::{Context, Result};

use crate::cli::output::{print_detail, print_success};
use crate::core::create::create_project;
use crate::core::extension::ExtensionRegistry;
use crate::infra::dirs::IotzDirs;
use crate::registry::BoardCache;

/// Execute the create command
pub fn execute(path: &Path, toolchain: Option<&str>, args: &[String]) -> Result<()> {
    let boards = BoardCache::from_dirs(&IotzDirs::new())
        .load(false)
        .context("Failed to load the board registry")?;

    let result = create_project(&ExtensionRegistry::builtin(), &boards, path, toolchain, args)?;

    print_success(&format!("Created {} project. done!", result.toolchain));
    print_detail(&format!("{}", result.project_dir.display()));
    Ok(())
}
