//! CLI implementation for `iotz clean`

use std::path::Path;

use anyhow::{Context, Result};

use crate::cli::output::print_success;
use crate::core::extension::Verb;

/// Execute the clean command
pub async fn execute(path: &Path, verbose: u8) -> Result<()> {
    let mut workflow = super::docker_workflow(verbose)?;

    workflow
        .run_verb(path, Verb::Clean, &[])
        .await
        .with_context(|| format!("Failed to clean {}", path.display()))?;

    print_success("Cleaned build artifacts");
    Ok(())
}
