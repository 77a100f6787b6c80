//! iotz - containerized cross-compilation tooling
//!
//! Entry point for the iotz command-line application.

use anyhow::Result;
use clap::Parser;

use iotz::cli::output::{display_error, OutputConfig};
use iotz::cli::Cli;
use iotz::config::defaults::INTERRUPTED_EXIT_CODE;
use iotz::error::{ContainerError, IotzError};

/// Whether the failure was the user interrupting a container
fn interrupted(error: &anyhow::Error) -> bool {
    error.chain().any(|cause| {
        matches!(cause.downcast_ref::<ContainerError>(), Some(ContainerError::Interrupted))
            || matches!(
                cause.downcast_ref::<IotzError>(),
                Some(IotzError::Container(ContainerError::Interrupted))
            )
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let output_config = OutputConfig::new(cli.quiet, cli.verbose);
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(output_config.log_level().into()),
        )
        .init();
    output_config.apply_global();

    match cli.run().await {
        Ok(()) => Ok(()),
        Err(e) if interrupted(&e) => std::process::exit(INTERRUPTED_EXIT_CODE),
        Err(e) => {
            display_error(&e);
            std::process::exit(1);
        }
    }
}
