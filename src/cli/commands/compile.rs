//! CLI implementation for `iotz compile`

use std::path::Path;

use anyhow::{Context, Result};

use crate::cli::output::print_success;
use crate::core::extension::Verb;

/// Execute the compile command
pub async fn execute(path: &Path, verbose: u8) -> Result<()> {
    let path = path
        .canonicalize()
        .with_context(|| format!("Project folder {} is not accessible", path.display()))?;
    let mut workflow = super::docker_workflow(verbose)?;

    workflow
        .run_verb(&path, Verb::Compile, &[])
        .await
        .with_context(|| format!("Failed to compile {}", path.display()))?;

    print_success("Compiled");
    Ok(())
}
