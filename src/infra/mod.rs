//! Infrastructure layer
//!
//! Handles all I/O operations: the docker engine, the filesystem,
//! git checkouts and per-user directories.

pub mod dirs;
pub mod docker;
pub mod filesystem;
pub mod git;
pub mod identity;
