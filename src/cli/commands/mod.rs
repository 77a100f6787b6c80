//! CLI command implementations
//!
//! Each command is implemented in its own submodule.

pub mod boards;
pub mod clean;
pub mod compile;
pub mod create;
pub mod export;
pub mod external;
pub mod init;
pub mod package;
pub mod run;
pub mod update;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Subcommand;

use crate::core::workflow::Workflow;
use crate::infra::dirs::IotzDirs;
use crate::infra::docker::{ensure_docker_available, DockerCli};

use super::output::is_quiet;

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize the toolchain for the current folder (creates iotz.json when missing)
    Init {
        /// Toolchain and target board, e.g. `arduino yun`
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },

    /// Compile the project (needs iotz.json)
    Compile {
        /// Project folder (defaults to the current folder)
        path: Option<PathBuf>,
    },

    /// Clean the build artifacts (needs iotz.json)
    Clean,

    /// Export a Makefile (mbed only)
    Export,

    /// Create a new project from a toolchain template
    Create {
        /// Toolchain (arduino, mbed, esp32, raspberry, micro-python, default)
        toolchain: Option<String>,

        /// Optional target board followed by an optional project name
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },

    /// Run a command inside the project container
    Run {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },

    /// Run make inside the project container
    Make {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },

    /// Open an interactive shell in the project container
    Connect {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },

    /// Pull the latest base image and rebuild installed toolchains
    Update,

    /// List known target boards or look one up
    Boards {
        /// Board name, codename or part of a codename
        query: Option<String>,

        /// Re-parse the board definitions instead of using the cache
        #[arg(long)]
        refresh: bool,
    },

    /// Install system packages into the project image
    #[command(name = "apt-get")]
    AptGet {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },

    /// Install python packages into the project image
    Pip {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },

    /// Install node packages into the project image
    Npm {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },

    /// Toolchain commands (`arduino ...`, `mbed ...`) and toolchain features (`upip ...`)
    #[command(external_subcommand)]
    External(Vec<String>),
}

/// Workflow driving the local docker engine
pub(crate) fn docker_workflow(verbose: u8) -> Result<Workflow<DockerCli>> {
    ensure_docker_available()?;
    let engine = DockerCli::new(verbose > 0).quiet(is_quiet());
    Workflow::new(engine, IotzDirs::new()).context("Failed to load the iotz user configuration")
}

impl Commands {
    /// Execute the command
    pub async fn run(self, verbose: u8) -> Result<()> {
        match self {
            Self::Init { args } => {
                let current_dir = std::env::current_dir()?;
                init::execute(&current_dir, &args, verbose).await
            }
            Self::Compile { path } => {
                let dir = match path {
                    Some(path) => path,
                    None => std::env::current_dir()?,
                };
                compile::execute(&dir, verbose).await
            }
            Self::Clean => {
                let current_dir = std::env::current_dir()?;
                clean::execute(&current_dir, verbose).await
            }
            Self::Export => {
                let current_dir = std::env::current_dir()?;
                export::execute(&current_dir, verbose).await
            }
            Self::Create { toolchain, args } => {
                let current_dir = std::env::current_dir()?;
                create::execute(&current_dir, toolchain.as_deref(), &args)
            }
            Self::Run { args } => {
                let current_dir = std::env::current_dir()?;
                run::execute_run(&current_dir, &args, verbose).await
            }
            Self::Make { args } => {
                let current_dir = std::env::current_dir()?;
                run::execute_make(&current_dir, &args, verbose).await
            }
            Self::Connect { args } => {
                let current_dir = std::env::current_dir()?;
                run::execute_connect(&current_dir, &args, verbose).await
            }
            Self::Update => {
                let current_dir = std::env::current_dir()?;
                update::execute(&current_dir, verbose).await
            }
            Self::Boards { query, refresh } => boards::execute(query.as_deref(), refresh),
            Self::AptGet { args } => {
                let current_dir = std::env::current_dir()?;
                package::execute(&current_dir, package::Manager::AptGet, &args, verbose).await
            }
            Self::Pip { args } => {
                let current_dir = std::env::current_dir()?;
                package::execute(&current_dir, package::Manager::Pip, &args, verbose).await
            }
            Self::Npm { args } => {
                let current_dir = std::env::current_dir()?;
                package::execute(&current_dir, package::Manager::Npm, &args, verbose).await
            }
            Self::External(args) => {
                let current_dir = std::env::current_dir()?;
                external::execute(&current_dir, &args, verbose).await
            }
        }
    }
}
