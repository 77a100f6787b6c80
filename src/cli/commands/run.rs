//! CLI implementation for `iotz run`, `iotz make` and `iotz connect`
//!
//! Each runs a raw command in an ephemeral container of the project image.

use std::path::Path;

use anyhow::{Context, Result};

use crate::core::shell::{Script, ShellCommand};

/// `iotz run <cmd..>`: the arguments are passed to bash as typed
pub async fn execute_run(path: &Path, args: &[String], verbose: u8) -> Result<()> {
    let script = if args.is_empty() {
        Script::new()
    } else {
        Script::raw(args.join(" "))
    };
    let mut workflow = super::docker_workflow(verbose)?;
    workflow
        .run_raw(path, "run", script, false)
        .await
        .context("Failed to run the command in the project container")
}

/// `iotz make [args..]`
pub async fn execute_make(path: &Path, args: &[String], verbose: u8) -> Result<()> {
    let script = Script::command(ShellCommand::new("make").args(args.iter().cloned()));
    let mut workflow = super::docker_workflow(verbose)?;
    workflow
        .run_raw(path, "make", script, false)
        .await
        .context("make has failed")
}

/// `iotz connect [args..]`: interactive shell in the project container
pub async fn execute_connect(path: &Path, args: &[String], verbose: u8) -> Result<()> {
    let script = if args.is_empty() {
        Script::command(ShellCommand::new("bash"))
    } else {
        Script::raw(args.join(" "))
    };
    let mut workflow = super::docker_workflow(verbose)?;
    workflow
        .run_raw(path, "connect", script, true)
        .await
        .context("Failed to connect to the project container")
}
