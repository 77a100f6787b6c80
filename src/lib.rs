//! iotz - containerized cross-compilation tooling
//!
//! Wraps per-toolchain docker images (arduino, mbed, esp32, raspberry pi,
//! micro-python and a plain gcc image) behind one command line. A project
//! folder carries an `iotz.json` descriptor; every verb becomes a script run
//! inside a container built for that folder.
//!
//! # Architecture
//!
//! - [`cli`] - Command-line interface parsing and output formatting
//! - [`core`] - Descriptor, toolchain extensions and container lifecycle
//! - [`registry`] - Arduino board registry
//! - [`infra`] - Infrastructure layer (docker, filesystem, git, directories)
//! - [`config`] - Configuration and constants
//! - [`error`] - Error types and handling

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod infra;
pub mod registry;
