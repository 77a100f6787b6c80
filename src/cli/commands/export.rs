//! CLI implementation for `iotz export`

use std::path::Path;

use anyhow::{Context, Result};

use crate::cli::output::{print_info, print_success};
use crate::core::extension::{PostStep, Verb};

/// Execute the export command
pub async fn execute(path: &Path, verbose: u8) -> Result<()> {
    let mut workflow = super::docker_workflow(verbose)?;

    let post = workflow
        .run_verb(path, Verb::Export, &[])
        .await
        .with_context(|| format!("Failed to export {}", path.display()))?;

    if matches!(post, Some(PostStep::PatchMbedMakefile)) {
        print_success("Makefile is ready.");
        print_info("Try 'iotz make -j2'");
    } else {
        print_success("Exported");
    }
    Ok(())
}
