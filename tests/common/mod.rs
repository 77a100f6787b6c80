//! Common test utilities and helpers
//!
//! This module provides shared utilities for integration tests.

#![allow(dead_code)]

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Mutex;

use iotz::core::workflow::Workflow;
use iotz::error::ContainerError;
use iotz::infra::dirs::IotzDirs;
use iotz::infra::docker::{BuildRequest, ContainerEngine, RunSpec};
use tempfile::TempDir;

/// Test project context
///
/// Creates a temporary directory holding a project folder and a separate
/// per-user directory, so tests never touch the real home directory.
pub struct TestProject {
    /// Temporary root; the project lives in `<root>/app`
    pub dir: TempDir,
}

impl TestProject {
    /// Create a new test project in a temporary directory
    pub fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp directory");
        std::fs::create_dir_all(dir.path().join("app")).expect("Failed to create project directory");
        Self { dir }
    }

    /// Get the path to the test project directory
    pub fn path(&self) -> PathBuf {
        self.dir.path().join("app")
    }

    /// Per-user directories rooted in the temp dir
    pub fn dirs(&self) -> IotzDirs {
        IotzDirs::at(&self.dir.path().join("user"))
    }

    /// Workflow over a recording engine and this project's user dirs
    pub fn workflow(&self, engine: RecordingEngine) -> Workflow<RecordingEngine> {
        Workflow::new(engine, self.dirs()).expect("Failed to create workflow")
    }

    /// Create a file in the test project
    pub fn create_file(&self, name: &str, content: &str) {
        let path = self.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent directories");
        }
        std::fs::write(path, content).expect("Failed to write file");
    }

    /// Create a directory in the test project
    pub fn create_dir(&self, name: &str) {
        std::fs::create_dir_all(self.path().join(name)).expect("Failed to create directory");
    }

    /// Check if a file exists in the test project
    pub fn file_exists(&self, name: &str) -> bool {
        self.path().join(name).exists()
    }

    /// Read a file from the test project
    pub fn read_file(&self, name: &str) -> String {
        std::fs::read_to_string(self.path().join(name)).expect("Failed to read file")
    }

    /// Parsed iotz.json
    pub fn descriptor(&self) -> serde_json::Value {
        serde_json::from_str(&self.read_file("iotz.json")).expect("Invalid iotz.json")
    }
}

impl Default for TestProject {
    fn default() -> Self {
        Self::new()
    }
}

/// One call made against the engine
#[derive(Debug, Clone, PartialEq)]
pub enum EngineCall {
    ListImages,
    /// Image tag and the Dockerfile contents at build time
    Build { tag: String, dockerfile: String },
    RemoveImage(String),
    RemoveContainer(String),
    /// Image, container name and script
    Run {
        image: String,
        name: Option<String>,
        workdir: Option<String>,
        interactive: bool,
        script: String,
    },
    Capture { image: String, script: String },
    Pull(String),
}

/// [`ContainerEngine`] that records calls and keeps an in-memory image list
#[derive(Debug, Default)]
pub struct RecordingEngine {
    calls: Mutex<Vec<EngineCall>>,
    images: Mutex<BTreeSet<String>>,
    /// stdout returned by `capture`
    capture_output: String,
    /// Exit code returned by every `run`
    run_failure: Option<i32>,
}

impl RecordingEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Engine whose image list already contains `images`
    pub fn with_images(images: &[&str]) -> Self {
        let engine = Self::new();
        engine
            .images
            .lock()
            .unwrap()
            .extend(images.iter().map(|i| i.to_string()));
        engine
    }

    pub fn with_capture_output(mut self, output: &str) -> Self {
        self.capture_output = output.to_string();
        self
    }

    pub fn failing_runs(mut self, code: i32) -> Self {
        self.run_failure = Some(code);
        self
    }

    pub fn calls(&self) -> Vec<EngineCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn has_image(&self, image: &str) -> bool {
        self.images.lock().unwrap().contains(image)
    }

    /// Tags built, in order
    pub fn built_tags(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                EngineCall::Build { tag, .. } => Some(tag),
                _ => None,
            })
            .collect()
    }

    /// Dockerfile used for the last build of `tag`
    pub fn dockerfile_for(&self, tag: &str) -> Option<String> {
        self.calls().into_iter().rev().find_map(|c| match c {
            EngineCall::Build { tag: t, dockerfile } if t == tag => Some(dockerfile),
            _ => None,
        })
    }

    /// Scripts passed to `run`, in order
    pub fn run_scripts(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                EngineCall::Run { script, .. } => Some(script),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: EngineCall) {
        self.calls.lock().unwrap().push(call);
    }
}

impl ContainerEngine for RecordingEngine {
    async fn list_images(&self) -> Result<String, ContainerError> {
        self.record(EngineCall::ListImages);
        let mut listing = String::from("REPOSITORY   TAG   IMAGE ID   CREATED   SIZE\n");
        for image in self.images.lock().unwrap().iter() {
            let (repo, tag) = image.rsplit_once(':').unwrap_or((image.as_str(), "latest"));
            listing.push_str(&format!("{repo}   {tag}   0123456789ab   1 minute ago   1GB\n"));
        }
        Ok(listing)
    }

    async fn build_image(&self, request: &BuildRequest) -> Result<(), ContainerError> {
        let dockerfile = std::fs::read_to_string(request.context.join(&request.dockerfile)).unwrap_or_default();
        self.record(EngineCall::Build {
            tag: request.tag.clone(),
            dockerfile,
        });
        self.images.lock().unwrap().insert(request.tag.clone());
        Ok(())
    }

    async fn remove_image(&self, image: &str) {
        self.record(EngineCall::RemoveImage(image.to_string()));
        self.images.lock().unwrap().remove(image);
    }

    async fn remove_container(&self, name: &str) {
        self.record(EngineCall::RemoveContainer(name.to_string()));
    }

    async fn run(&self, spec: &RunSpec) -> Result<(), ContainerError> {
        self.record(EngineCall::Run {
            image: spec.image.clone(),
            name: spec.name.clone(),
            workdir: spec.workdir.clone(),
            interactive: spec.interactive,
            script: spec.script.clone(),
        });
        match self.run_failure {
            Some(code) => Err(ContainerError::CommandFailed {
                action: "run".to_string(),
                code,
            }),
            None => Ok(()),
        }
    }

    async fn capture(&self, spec: &RunSpec) -> Result<String, ContainerError> {
        self.record(EngineCall::Capture {
            image: spec.image.clone(),
            script: spec.script.clone(),
        });
        Ok(self.capture_output.clone())
    }

    async fn pull(&self, image: &str) -> Result<(), ContainerError> {
        self.record(EngineCall::Pull(image.to_string()));
        Ok(())
    }
}
