//! CLI implementation for toolchain verbs
//!
//! `iotz arduino ...`, `iotz mbed ...` pass their arguments to the toolchain's
//! own CLI; feature verbs such as `iotz upip ...` are handled by the toolchain
//! that advertises them.

use std::path::Path;

use anyhow::{Context, Result};

use crate::core::extension::ExtensionRegistry;
use crate::error::ExtensionError;

/// Execute an external verb; `args[0]` is the verb itself
pub async fn execute(path: &Path, args: &[String], verbose: u8) -> Result<()> {
    let Some((verb, rest)) = args.split_first() else {
        return Err(ExtensionError::UnknownVerb { verb: String::new() }.into());
    };

    let extensions = ExtensionRegistry::builtin();
    if extensions.get(verb).is_err() && extensions.with_feature(verb).is_none() {
        return Err(ExtensionError::UnknownVerb { verb: verb.clone() }.into());
    }

    let mut workflow = super::docker_workflow(verbose)?;
    workflow
        .external(path, verb, rest)
        .await
        .with_context(|| format!("'iotz {verb}' has failed"))
}
