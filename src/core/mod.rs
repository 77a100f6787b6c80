//! Core business logic
//!
//! Everything between the command line and docker: the project descriptor,
//! the toolchain extensions and the container lifecycle. Container access
//! goes through [`crate::infra::docker::ContainerEngine`].
//!
//! # Submodules
//!
//! - [`project`] - Project descriptor (iotz.json)
//! - [`user_config`] - Installed toolchains (per-user config.json)
//! - [`extension`] - Toolchain extension contract and registry
//! - [`toolchains`] - Built-in toolchains
//! - [`shell`] - Structured shell scripts
//! - [`dockerfile`] - Generated Dockerfiles
//! - [`workflow`] - Container lifecycle
//! - [`create`] - Project scaffolding

pub mod create;
pub mod dockerfile;
pub mod extension;
pub mod project;
pub mod shell;
pub mod toolchains;
pub mod user_config;
pub mod workflow;
