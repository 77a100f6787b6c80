//! Shell script construction
//!
//! Toolchain modules describe the work to run inside a container as a
//! [`Script`]: an ordered list of steps joined with `&&`. Each step is either
//! a structured [`ShellCommand`] whose arguments are quoted on render, or a
//! raw fragment for constructs that need shell syntax (pipes, loops).

use std::fmt;

/// Quote `value` for a POSIX shell using single quotes
pub fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

/// One argument of a [`ShellCommand`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Arg {
    /// Emitted verbatim (flags, user-supplied passthrough arguments)
    Plain(String),
    /// Emitted single-quoted
    Quoted(String),
}

/// A program invocation with structured arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellCommand {
    program: String,
    args: Vec<Arg>,
}

impl ShellCommand {
    /// Start a command line for `program`
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Append a verbatim argument
    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(Arg::Plain(arg.into()));
        self
    }

    /// Append several verbatim arguments
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(|a| Arg::Plain(a.into())));
        self
    }

    /// Append an argument that is always single-quoted
    #[must_use]
    pub fn quoted(mut self, arg: impl Into<String>) -> Self {
        self.args.push(Arg::Quoted(arg.into()));
        self
    }

    /// Program name
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Render as a single shell command line
    pub fn render(&self) -> String {
        let mut line = self.program.clone();
        for arg in &self.args {
            line.push(' ');
            match arg {
                Arg::Plain(s) => line.push_str(s),
                Arg::Quoted(s) => line.push_str(&quote(s)),
            }
        }
        line
    }
}

/// A step of a [`Script`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Structured command
    Command(ShellCommand),
    /// Raw shell fragment
    Raw(String),
}

impl Step {
    fn render(&self) -> String {
        match self {
            Self::Command(cmd) => cmd.render(),
            Self::Raw(raw) => raw.clone(),
        }
    }
}

/// Steps joined with `&&`; an empty script means "nothing to run"
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Script {
    steps: Vec<Step>,
}

impl Script {
    /// Empty script
    pub fn new() -> Self {
        Self::default()
    }

    /// Script made of a single command
    pub fn command(cmd: ShellCommand) -> Self {
        Self::new().then(cmd)
    }

    /// Script made of a single raw fragment
    pub fn raw(fragment: impl Into<String>) -> Self {
        Self::new().then_raw(fragment)
    }

    /// Append a command
    #[must_use]
    pub fn then(mut self, cmd: ShellCommand) -> Self {
        self.steps.push(Step::Command(cmd));
        self
    }

    /// Append a raw fragment; blank fragments are ignored
    #[must_use]
    pub fn then_raw(mut self, fragment: impl Into<String>) -> Self {
        let fragment = fragment.into();
        if !fragment.trim().is_empty() {
            self.steps.push(Step::Raw(fragment));
        }
        self
    }

    /// Append every step of `other`
    #[must_use]
    pub fn chain(mut self, other: Script) -> Self {
        self.steps.extend(other.steps);
        self
    }

    /// Whether there is nothing to run
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Steps in order
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Render as one shell line
    pub fn render(&self) -> String {
        self.steps
            .iter()
            .map(Step::render)
            .collect::<Vec<_>>()
            .join(" && ")
    }
}

impl fmt::Display for Script {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}
