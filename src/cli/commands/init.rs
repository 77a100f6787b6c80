//! CLI implementation for `iotz init`
//!
//! Detects (or reads) the project descriptor, builds the project image and
//! runs the toolchain's init script.

use std::path::Path;

use anyhow::{Context, Result};

use crate::cli::output::{print_detail, print_success};

/// Execute the init command
pub async fn execute(path: &Path, args: &[String], verbose: u8) -> Result<()> {
    let mut workflow = super::docker_workflow(verbose)?;

    let project = workflow
        .init(path, args)
        .await
        .with_context(|| format!("Failed to initialize {}", path.display()))?;

    let toolchain = project.toolchain()?;
    print_success(&format!("{toolchain} container is ready ({})", project.image()));
    if let Some(target) = &project.config.target {
        print_detail(&format!("target: {target}"));
    }
    print_detail(&format!("mounted at {}", project.layout.container_dir));
    Ok(())
}
