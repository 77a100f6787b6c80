//! Docker engine access
//!
//! All container work goes through the [`ContainerEngine`] trait so the
//! lifecycle logic can be exercised without a docker daemon. [`DockerCli`]
//! is the real implementation and shells out to the `docker` executable.

use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use tokio::process::Command;

use crate::config::defaults::CONTAINER_MOUNT_ROOT;
use crate::error::ContainerError;

/// Name of the docker executable
pub const DOCKER: &str = "docker";

/// Fail early when docker is not on PATH
pub fn ensure_docker_available() -> Result<PathBuf, ContainerError> {
    which::which(DOCKER).map_err(|_| ContainerError::DockerNotFound)
}

/// Whether `image` appears in the output of `docker images -a`
///
/// Compares the REPOSITORY column (and `REPOSITORY:TAG`) of every row, so
/// `aiot_iotz_12` does not match `aiot_iotz_123`.
pub fn image_listed(listing: &str, image: &str) -> bool {
    let (wanted_repo, wanted_tag) = match image.rsplit_once(':') {
        Some((repo, tag)) if !tag.contains('/') => (repo, Some(tag)),
        _ => (image, None),
    };

    listing.lines().skip_while(|l| l.starts_with("REPOSITORY")).any(|line| {
        let mut columns = line.split_whitespace();
        let repo = columns.next();
        let tag = columns.next();
        repo == Some(wanted_repo) && wanted_tag.map_or(true, |t| tag == Some(t))
    })
}

/// Bind mount for a container
#[derive(Debug, Clone, PartialEq)]
pub struct MountConfig {
    /// Host path to mount
    pub host_path: PathBuf,
    /// Container path to mount to
    pub container_path: String,
    /// Whether the mount is read-only
    pub read_only: bool,
}

impl MountConfig {
    /// Read-write mount of `host_path` at the shared mount root
    pub fn project_root(host_path: PathBuf) -> Self {
        Self {
            host_path,
            container_path: CONTAINER_MOUNT_ROOT.to_string(),
            read_only: false,
        }
    }

    fn volume_arg(&self) -> String {
        let mode = if self.read_only { "ro" } else { "rw,cached" };
        format!(
            "{}:{}:{mode}",
            self.host_path.display(),
            self.container_path
        )
    }
}

/// Everything needed to `docker run` one command
#[derive(Debug, Clone)]
pub struct RunSpec {
    /// Image to run
    pub image: String,
    /// Container name; stale containers with this name are removed first
    pub name: Option<String>,
    /// Bind mounts
    pub mounts: Vec<MountConfig>,
    /// Working directory inside the container
    pub workdir: Option<String>,
    /// Keep stdin open (interactive shells)
    pub interactive: bool,
    /// Allocate a TTY
    pub tty: bool,
    /// Shell script passed to `/bin/bash -c`
    pub script: String,
}

impl RunSpec {
    /// Run `script` in `image` with default flags
    ///
    /// A TTY is allocated only when stdin is a terminal; docker rejects
    /// `-t` under a pipe.
    pub fn new(image: impl Into<String>, script: impl Into<String>) -> Self {
        Self {
            image: image.into(),
            name: None,
            mounts: Vec::new(),
            workdir: None,
            interactive: false,
            tty: std::io::stdin().is_terminal(),
            script: script.into(),
        }
    }

    /// Set the container name
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Add a mount
    #[must_use]
    pub fn with_mount(mut self, mount: MountConfig) -> Self {
        self.mounts.push(mount);
        self
    }

    /// Set the working directory
    #[must_use]
    pub fn with_workdir(mut self, workdir: impl Into<String>) -> Self {
        self.workdir = Some(workdir.into());
        self
    }

    /// Keep stdin attached
    #[must_use]
    pub fn interactive(mut self) -> Self {
        self.interactive = true;
        self
    }

    /// Choose TTY allocation explicitly
    #[must_use]
    pub fn with_tty(mut self, tty: bool) -> Self {
        self.tty = tty;
        self
    }

    /// Do not allocate a TTY (output is captured)
    #[must_use]
    pub fn without_tty(self) -> Self {
        self.with_tty(false)
    }

    /// Arguments for `docker`
    pub fn build_run_args(&self) -> Vec<String> {
        let mut args = vec!["run".to_string(), "--rm".to_string()];

        if let Some(name) = &self.name {
            args.push("--name".to_string());
            args.push(name.clone());
        }
        if self.interactive {
            args.push("-i".to_string());
        }
        if self.tty {
            args.push("-t".to_string());
        }
        for mount in &self.mounts {
            args.push("--volume".to_string());
            args.push(mount.volume_arg());
        }
        if let Some(workdir) = &self.workdir {
            args.push("-w".to_string());
            args.push(workdir.clone());
        }

        args.push(self.image.clone());
        args.push("/bin/bash".to_string());
        args.push("-c".to_string());
        args.push(self.script.clone());
        args
    }
}

/// A `docker build` invocation
#[derive(Debug, Clone, PartialEq)]
pub struct BuildRequest {
    /// Build context directory
    pub context: PathBuf,
    /// Dockerfile path
    pub dockerfile: PathBuf,
    /// Tag for the resulting image
    pub tag: String,
}

impl BuildRequest {
    /// Arguments for `docker`
    pub fn build_args(&self) -> Vec<String> {
        vec![
            "build".to_string(),
            ".".to_string(),
            "-f".to_string(),
            self.dockerfile.display().to_string(),
            "--force-rm".to_string(),
            "-t".to_string(),
            self.tag.clone(),
        ]
    }
}

/// Operations the lifecycle manager needs from a container engine
#[allow(async_fn_in_trait)]
pub trait ContainerEngine {
    /// Raw output of `docker images -a`
    async fn list_images(&self) -> Result<String, ContainerError>;

    /// Build and tag an image
    async fn build_image(&self, request: &BuildRequest) -> Result<(), ContainerError>;

    /// Remove an image; failures are ignored
    async fn remove_image(&self, image: &str);

    /// Force-remove a container; failures are ignored
    async fn remove_container(&self, name: &str);

    /// Run a command with stdio passed through
    async fn run(&self, spec: &RunSpec) -> Result<(), ContainerError>;

    /// Run a command and return its stdout
    async fn capture(&self, spec: &RunSpec) -> Result<String, ContainerError>;

    /// Pull an image from the registry
    async fn pull(&self, image: &str) -> Result<(), ContainerError>;
}

/// [`ContainerEngine`] backed by the docker CLI
#[derive(Debug, Clone, Default)]
pub struct DockerCli {
    /// Stream `docker build` output instead of showing a spinner
    show_build_output: bool,
    /// Hide the build spinner
    quiet: bool,
}

impl DockerCli {
    /// Create a docker CLI engine
    pub fn new(show_build_output: bool) -> Self {
        Self {
            show_build_output,
            quiet: false,
        }
    }

    /// Suppress progress output
    #[must_use]
    pub fn quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    fn check(action: &str, status: ExitStatus) -> Result<(), ContainerError> {
        if status.success() {
            Ok(())
        } else {
            Err(ContainerError::CommandFailed {
                action: action.to_string(),
                code: status.code().unwrap_or(1),
            })
        }
    }

    fn spawn_error(action: &str, e: &std::io::Error) -> ContainerError {
        ContainerError::Spawn {
            action: action.to_string(),
            error: e.to_string(),
        }
    }

    async fn best_effort(args: &[&str]) {
        match Command::new(DOCKER)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .await
        {
            Ok(output) if !output.status.success() => {
                tracing::debug!(
                    "docker {} (ignored): {}",
                    args.join(" "),
                    String::from_utf8_lossy(&output.stderr).trim()
                );
            }
            Err(e) => tracing::debug!("docker {} (ignored): {}", args.join(" "), e),
            Ok(_) => {}
        }
    }

    fn build_spinner(&self, tag: &str) -> ProgressBar {
        if self.quiet {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner()
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
            .template("{spinner:.blue} {msg}")
        {
            pb.set_style(style);
        }
        pb.set_message(format!("building {tag} (it may take some time)"));
        pb.enable_steady_tick(Duration::from_millis(80));
        pb
    }

    fn run_in(context: &Path, args: &[String]) -> Command {
        let mut cmd = Command::new(DOCKER);
        cmd.current_dir(context).args(args);
        cmd
    }
}

impl ContainerEngine for DockerCli {
    async fn list_images(&self) -> Result<String, ContainerError> {
        let output = Command::new(DOCKER)
            .args(["images", "-a"])
            .output()
            .await
            .map_err(|e| Self::spawn_error("images", &e))?;
        Self::check("images", output.status)?;
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    async fn build_image(&self, request: &BuildRequest) -> Result<(), ContainerError> {
        let args = request.build_args();
        tracing::debug!("docker {}", args.join(" "));
        let mut cmd = Self::run_in(&request.context, &args);

        if self.show_build_output {
            let status = cmd
                .stdin(Stdio::null())
                .status()
                .await
                .map_err(|e| Self::spawn_error("build", &e))?;
            return Self::check("build", status);
        }

        let spinner = self.build_spinner(&request.tag);
        let output = cmd.output().await;
        spinner.finish_and_clear();
        let output = output.map_err(|e| Self::spawn_error("build", &e))?;
        if !output.status.success() {
            eprintln!("{}", String::from_utf8_lossy(&output.stdout));
            eprintln!("{}", String::from_utf8_lossy(&output.stderr));
        }
        Self::check("build", output.status)
    }

    async fn remove_image(&self, image: &str) {
        Self::best_effort(&["image", "rm", "-f", image]).await;
    }

    async fn remove_container(&self, name: &str) {
        Self::best_effort(&["container", "rm", "-f", &format!("/{name}")]).await;
    }

    async fn run(&self, spec: &RunSpec) -> Result<(), ContainerError> {
        let args = spec.build_run_args();
        tracing::debug!("docker {}", args.join(" "));

        let mut child = Command::new(DOCKER)
            .args(&args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| Self::spawn_error("run", &e))?;

        tokio::select! {
            status = child.wait() => {
                let status = status.map_err(|e| Self::spawn_error("run", &e))?;
                Self::check("run", status)
            }
            _ = tokio::signal::ctrl_c() => {
                if let Some(name) = &spec.name {
                    Self::best_effort(&["kill", name]).await;
                }
                if let Err(e) = child.kill().await {
                    tracing::debug!("docker run already exited: {}", e);
                }
                Err(ContainerError::Interrupted)
            }
        }
    }

    async fn capture(&self, spec: &RunSpec) -> Result<String, ContainerError> {
        let args = spec.build_run_args();
        tracing::debug!("docker {}", args.join(" "));
        let output = Command::new(DOCKER)
            .args(&args)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| Self::spawn_error("run", &e))?;
        Self::check("run", output.status)?;
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    async fn pull(&self, image: &str) -> Result<(), ContainerError> {
        let status = Command::new(DOCKER)
            .args(["pull", image])
            .status()
            .await
            .map_err(|e| Self::spawn_error("pull", &e))?;
        Self::check("pull", status)
    }
}
