//! Error types for iotz
//!
//! Domain-specific error types using thiserror.

use std::path::PathBuf;
use thiserror::Error;

/// Project descriptor errors
#[derive(Error, Debug)]
pub enum ProjectError {
    /// Descriptor not found where one is required
    #[error("iotz.json file is not found under {path}. Run 'iotz init' to create one.")]
    DescriptorNotFound { path: PathBuf },

    /// Descriptor could not be parsed
    #[error("Failed to parse '{path}': {error}")]
    InvalidDescriptor { path: PathBuf, error: String },

    /// Descriptor has no toolchain
    #[error("No toolchain is defined. Set \"toolchain\":\"arduino\" (or mbed, esp32, ...) in iotz.json")]
    MissingToolchain,

    /// More than one extension claimed the directory
    #[error(
        "More than one extension detected this folder as their type ({}). \
         Please define the toolchain and target under iotz.json manually.",
        candidates.join(", ")
    )]
    AmbiguousDetection { candidates: Vec<String> },

    /// No extension claimed the directory
    #[error(
        "Unable to detect a toolchain for {path}. Create iotz.json with \"toolchain\" and \"target\", \
         or run 'iotz init <toolchain> <target board>'"
    )]
    NotDetected { path: PathBuf },
}

/// Board resolution errors
#[derive(Error, Debug)]
pub enum BoardError {
    /// Board token did not match anything
    #[error("Unknown target board '{name}'. Run 'iotz boards' to list supported boards")]
    NotFound { name: String },

    /// Codename does not have three colon-separated segments
    #[error("Invalid target board name '{codename}': expected vendor:architecture:board. Run 'iotz boards' to list supported boards")]
    MalformedCodename { codename: String },

    /// No target configured and none supplied
    #[error("Target board is required. Run 'iotz init {toolchain} <target board>' or set \"target\" in iotz.json")]
    TargetRequired { toolchain: String },

    /// No sketch file configured or found
    #[error("No .ino file found. Set \"filename\" in iotz.json")]
    FilenameRequired,

    /// Board cache could not be read or written
    #[error("Board cache error for '{path}': {error}")]
    Cache { path: PathBuf, error: String },
}

/// Extension (toolchain module) errors
#[derive(Error, Debug)]
pub enum ExtensionError {
    /// No module registered under the name
    #[error("Extension '{name}' not found")]
    UnknownToolchain { name: String },

    /// Verb is not part of the command set
    #[error("Unknown command '{verb}'")]
    UnknownVerb { verb: String },

    /// Toolchain cannot produce a standalone Makefile
    #[error("Export from {toolchain} projects is not supported")]
    ExportUnsupported { toolchain: String },

    /// Dependency declaration is inconsistent
    #[error("Library name is case sensitive. {name} should match the name in {url}")]
    DependencyMismatch { name: String, url: String },

    /// Sub-command needs arguments
    #[error("You should provide a command to run after \"{command}\"")]
    MissingArguments { command: String },

    /// `create` was invoked without a toolchain
    #[error("Please specify the type of project you want to create.\n   usage: iotz create <toolchain> <optional target> <optional project name>")]
    CreateUsage,

    /// Post-step could not find the file it patches
    #[error("Unable to find {file} on the current path")]
    MissingArtifact { file: String },
}

/// Container engine errors
#[derive(Error, Debug)]
pub enum ContainerError {
    /// docker executable is not on PATH
    #[error("docker is required and not found. Visit https://docs.docker.com/install/")]
    DockerNotFound,

    /// docker exited with a failure status
    #[error("'docker {action}' has failed (exit code {code})")]
    CommandFailed { action: String, code: i32 },

    /// docker could not be spawned
    #[error("Failed to execute docker {action}: {error}")]
    Spawn { action: String, error: String },

    /// The user interrupted a running container
    #[error("Interrupted")]
    Interrupted,
}

/// Filesystem errors
#[derive(Error, Debug)]
pub enum FilesystemError {
    /// Failed to create directory
    #[error("Failed to create directory '{path}': {error}")]
    CreateDir { path: PathBuf, error: String },

    /// Failed to remove file or directory
    #[error("Failed to remove '{path}': {error}")]
    Remove { path: PathBuf, error: String },

    /// Failed to write file
    #[error("Failed to write file '{path}': {error}")]
    WriteFile { path: PathBuf, error: String },

    /// Failed to read file
    #[error("Failed to read file '{path}': {error}")]
    ReadFile { path: PathBuf, error: String },

    /// Failed to stat a path
    #[error("Failed to access '{path}': {error}")]
    Metadata { path: PathBuf, error: String },
}

/// Top-level iotz error type
#[derive(Error, Debug)]
pub enum IotzError {
    /// Project error
    #[error(transparent)]
    Project(#[from] ProjectError),

    /// Board error
    #[error(transparent)]
    Board(#[from] BoardError),

    /// Extension error
    #[error(transparent)]
    Extension(#[from] ExtensionError),

    /// Container error
    #[error(transparent)]
    Container(#[from] ContainerError),

    /// Filesystem error
    #[error(transparent)]
    Filesystem(#[from] FilesystemError),

    /// User configuration error
    #[error(transparent)]
    UserConfig(#[from] crate::core::user_config::UserConfigError),

    /// Git error
    #[error(transparent)]
    Git(#[from] crate::infra::git::GitError),
}

/// Result alias used throughout the core layer
pub type Result<T, E = IotzError> = std::result::Result<T, E>;
