//! CLI implementation for `iotz apt-get`, `iotz pip` and `iotz npm`
//!
//! Package installs are baked into the project image as a new layer
//! instead of running in a throwaway container.

use std::path::Path;

use anyhow::{Context, Result};

use crate::cli::output::print_success;
use crate::core::shell::{Script, ShellCommand};

/// Package manager run inside the project image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Manager {
    AptGet,
    Pip,
    Npm,
}

impl Manager {
    pub fn command(self) -> &'static str {
        match self {
            Self::AptGet => "apt-get",
            Self::Pip => "pip",
            Self::Npm => "npm",
        }
    }

    /// Script installing `args`; empty when there is nothing to run
    ///
    /// `apt-get` runs non-interactively after refreshing the package lists.
    pub fn script(self, args: &[String]) -> Script {
        if args.is_empty() {
            return Script::new();
        }
        match self {
            Self::AptGet => Script::command(ShellCommand::new("apt-get").arg("update"))
                .then(ShellCommand::new("apt-get").arg("-y").args(args.iter().cloned())),
            Self::Pip | Self::Npm => Script::command(ShellCommand::new(self.command()).args(args.iter().cloned())),
        }
    }
}

/// Execute a package-install command
pub async fn execute(path: &Path, manager: Manager, args: &[String], verbose: u8) -> Result<()> {
    let mut workflow = super::docker_workflow(verbose)?;

    workflow
        .commit(path, manager.command(), manager.script(args))
        .await
        .with_context(|| format!("{} has failed", manager.command()))?;

    print_success(&format!("Updated the project image ({} {})", manager.command(), args.join(" ")));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apt_get_refreshes_lists() {
        let args = vec!["install".to_string(), "curl".to_string()];
        assert_eq!(
            Manager::AptGet.script(&args).render(),
            "apt-get update && apt-get -y install curl"
        );
    }

    #[test]
    fn test_pip_passes_arguments() {
        let args = vec!["install".to_string(), "pyserial".to_string()];
        assert_eq!(Manager::Pip.script(&args).render(), "pip install pyserial");
    }

    #[test]
    fn test_empty_arguments_give_empty_script() {
        assert!(Manager::Npm.script(&[]).is_empty());
    }
}
