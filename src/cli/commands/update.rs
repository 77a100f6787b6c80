//! CLI implementation for `iotz update`

use std::path::Path;

use anyhow::{Context, Result};

use crate::cli::output::{print_detail, print_success, print_warning};
use crate::config::images::BASE_IMAGE;

/// Execute the update command
pub async fn execute(path: &Path, verbose: u8) -> Result<()> {
    let mut workflow = super::docker_workflow(verbose)?;

    let rebuilt = workflow
        .update(path)
        .await
        .context("update has failed. See the output above.")?;

    print_success(&format!("Updated {BASE_IMAGE}"));
    if rebuilt.is_empty() {
        print_warning("No toolchain images installed yet; they are built on first use");
    }
    for toolchain in &rebuilt {
        print_detail(&format!("rebuilt {toolchain} toolchain image"));
    }
    Ok(())
}
