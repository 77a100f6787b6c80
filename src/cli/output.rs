//! Output formatting
//!
//! User-facing messages go through these helpers so `--quiet` and `-v` are
//! honoured in one place. Diagnostics use `tracing` instead.

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

use crossterm::style::Stylize;

static QUIET: AtomicBool = AtomicBool::new(false);
static VERBOSITY: AtomicU8 = AtomicU8::new(0);

/// Output mode selected on the command line
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutputConfig {
    pub quiet: bool,
    pub verbose: u8,
}

impl OutputConfig {
    pub fn new(quiet: bool, verbose: u8) -> Self {
        Self { quiet, verbose }
    }

    /// Make this the process-wide output mode
    pub fn apply_global(&self) {
        QUIET.store(self.quiet, Ordering::Relaxed);
        VERBOSITY.store(self.verbose, Ordering::Relaxed);
    }

    /// `tracing` level matching the verbosity flags
    pub fn log_level(&self) -> tracing::Level {
        match self.verbose {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            _ => tracing::Level::DEBUG,
        }
    }
}

/// Whether `--quiet` is active
pub fn is_quiet() -> bool {
    QUIET.load(Ordering::Relaxed)
}

/// Number of `-v` flags
pub fn verbosity() -> u8 {
    VERBOSITY.load(Ordering::Relaxed)
}

pub fn print_success(message: &str) {
    if !is_quiet() {
        println!("{} {}", status::SUCCESS.green(), message);
    }
}

pub fn print_info(message: &str) {
    if !is_quiet() {
        println!("{} {}", status::INFO.blue(), message);
    }
}

pub fn print_warning(message: &str) {
    if !is_quiet() {
        eprintln!("{} {}", status::WARNING.yellow(), message);
    }
}

/// Indented detail line, shown only with `-v`
pub fn print_detail(message: &str) {
    if !is_quiet() && verbosity() > 0 {
        println!("  {message}");
    }
}

/// Print an error and its causes to stderr
pub fn display_error(error: &anyhow::Error) {
    eprintln!("{} {}", " - error:".red().bold(), error.to_string().red());
    for cause in error.chain().skip(1) {
        eprintln!("   {} {}", "caused by:".dark_grey(), cause);
    }
}

/// Status message prefixes
pub mod status {
    /// Success prefix (green checkmark)
    pub const SUCCESS: &str = "✓";

    /// Warning prefix (yellow triangle)
    pub const WARNING: &str = "⚠";

    /// Info prefix (blue circle)
    pub const INFO: &str = "ℹ";
}
