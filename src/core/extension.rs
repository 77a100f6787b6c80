//! Toolchain extensions
//!
//! Every toolchain (arduino, mbed, ...) is an [`Extension`]: it can claim a
//! project directory, describe how its base image is built, and translate a
//! [`Verb`] into the shell script that runs inside the project container.
//! Extensions never touch docker themselves; the workflow does that with the
//! [`BuildResult`] they return.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde_json::Value;

use crate::core::project::ProjectConfig;
use crate::core::shell::Script;
use crate::core::toolchains;
use crate::error::{ExtensionError, ProjectError, Result};
use crate::registry::BoardRegistry;

/// The fixed command set every extension answers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    /// Prepare the project (runs in the project container)
    Init,
    /// First-time setup baked into the per-project image
    ContainerInit,
    Clean,
    Compile,
    /// Produce a standalone Makefile
    Export,
}

impl Verb {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::ContainerInit => "container_init",
            Self::Clean => "clean",
            Self::Compile => "compile",
            Self::Export => "export",
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Verb {
    type Err = ExtensionError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "init" => Ok(Self::Init),
            "container_init" | "localFolderContainerConstructer" => Ok(Self::ContainerInit),
            "clean" => Ok(Self::Clean),
            "compile" => Ok(Self::Compile),
            "export" => Ok(Self::Export),
            other => Err(ExtensionError::UnknownVerb {
                verb: other.to_string(),
            }),
        }
    }
}

/// Host-side work done after the container script succeeded
#[derive(Debug, Clone, PartialEq)]
pub enum PostStep {
    /// Drop the per-project image so the next run rebuilds it
    RemoveProjectImage,
    /// Write the inline mbed configuration to `iotz-mbed-deps/mbed_app.json`
    WriteMbedAppConfig(Value),
    /// Enable coloured diagnostics in the exported mbed Makefile
    PatchMbedMakefile,
}

/// What a verb resolves to
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BuildResult {
    /// Script to run; empty means nothing to do
    pub run: Script,
    pub post: Option<PostStep>,
    /// Bake the script into a new project image layer instead of running it
    pub commit_changes: bool,
}

impl BuildResult {
    pub fn noop() -> Self {
        Self::default()
    }

    pub fn script(run: Script) -> Self {
        Self {
            run,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_post(mut self, post: PostStep) -> Self {
        self.post = Some(post);
        self
    }

    #[must_use]
    pub fn committed(mut self) -> Self {
        self.commit_changes = true;
        self
    }
}

/// Inputs for building a verb's script
///
/// Extensions may fill in `config` (resolved target, inferred sketch name);
/// the workflow persists any change.
#[derive(Debug)]
pub struct BuildContext<'a> {
    pub config: &'a mut ProjectConfig,
    /// Trailing command-line arguments
    pub args: &'a [String],
    /// Project directory on the host
    pub project_dir: &'a Path,
    /// Project directory inside the container
    pub mount_dir: &'a str,
    pub boards: &'a BoardRegistry,
}

impl BuildContext<'_> {
    /// Arguments joined for a shell command line
    pub fn joined_args(&self) -> String {
        self.args.join(" ")
    }

    /// First argument that is not the toolchain's own name
    ///
    /// `iotz init arduino uno` and `iotz init uno` both name `uno`.
    pub fn target_token(&self, toolchain: &str) -> Option<&str> {
        self.args
            .iter()
            .map(String::as_str)
            .find(|arg| !arg.eq_ignore_ascii_case(toolchain))
    }
}

/// Capability contract shared by all toolchains
pub trait Extension: Send + Sync {
    /// Canonical toolchain name as written in `iotz.json`
    fn name(&self) -> &'static str;

    /// Other spellings accepted on the command line
    fn aliases(&self) -> &'static [&'static str] {
        &[]
    }

    /// Claim a directory that has no toolchain configured
    fn detect_project(&self, _project_dir: &Path, _args: &[String], _command: &str) -> Option<ProjectConfig> {
        None
    }

    /// Dockerfile instructions installing the toolchain on top of the shared base image
    fn base_image_fragment(&self) -> String;

    /// Script whose output is kept as the board-definition dump once the base image exists
    fn board_dump_script(&self) -> Option<Script> {
        None
    }

    /// Translate a verb
    fn build_commands(&self, ctx: &mut BuildContext<'_>, verb: Verb) -> Result<BuildResult>;

    /// Scaffold a new project below `parent`; returns the project directory
    fn create_project(&self, parent: &Path, args: &[String], boards: &BoardRegistry) -> Result<PathBuf>;

    /// `iotz <toolchain> <args..>`; compiles with the arguments by default
    fn self_call(&self, ctx: &mut BuildContext<'_>) -> Result<BuildResult> {
        self.build_commands(ctx, Verb::Compile)
    }

    /// Extra verbs this toolchain answers
    fn features(&self) -> &'static [&'static str] {
        &[]
    }

    fn add_feature(&self, _ctx: &mut BuildContext<'_>, feature: &str) -> Result<BuildResult> {
        Err(ExtensionError::UnknownVerb {
            verb: feature.to_string(),
        }
        .into())
    }
}

/// Name → extension lookup
pub struct ExtensionRegistry {
    extensions: Vec<Box<dyn Extension>>,
}

impl fmt::Debug for ExtensionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

impl ExtensionRegistry {
    pub fn new(extensions: Vec<Box<dyn Extension>>) -> Self {
        Self { extensions }
    }

    /// All toolchains shipped with iotz
    pub fn builtin() -> Self {
        Self::new(toolchains::all())
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.extensions.iter().map(|e| e.name()).collect()
    }

    /// Look up an extension by name or alias
    pub fn get(&self, name: &str) -> std::result::Result<&dyn Extension, ExtensionError> {
        self.extensions
            .iter()
            .find(|e| e.name() == name || e.aliases().contains(&name))
            .map(|e| &**e)
            .ok_or_else(|| ExtensionError::UnknownToolchain {
                name: name.to_string(),
            })
    }

    /// Extension advertising `verb` as a feature
    pub fn with_feature(&self, verb: &str) -> Option<&dyn Extension> {
        self.extensions
            .iter()
            .find(|e| e.features().contains(&verb))
            .map(|e| &**e)
    }

    /// Ask every extension to claim `project_dir`
    ///
    /// Exactly one claim is adopted. Several claims are an error the user
    /// resolves by writing the toolchain into the descriptor.
    pub fn detect(&self, project_dir: &Path, args: &[String], command: &str) -> Result<ProjectConfig> {
        let mut claims: Vec<(&'static str, ProjectConfig)> = self
            .extensions
            .iter()
            .filter_map(|e| e.detect_project(project_dir, args, command).map(|c| (e.name(), c)))
            .collect();

        match claims.len() {
            0 => Err(ProjectError::NotDetected {
                path: project_dir.to_path_buf(),
            }
            .into()),
            1 => {
                let (name, config) = claims.remove(0);
                tracing::info!("Detected {} project in {}", name, project_dir.display());
                Ok(config)
            }
            _ => Err(ProjectError::AmbiguousDetection {
                candidates: claims.into_iter().map(|(name, _)| name.to_string()).collect(),
            }
            .into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    struct Claims(&'static str);

    impl Extension for Claims {
        fn name(&self) -> &'static str {
            self.0
        }

        fn detect_project(&self, _dir: &Path, _args: &[String], _command: &str) -> Option<ProjectConfig> {
            Some(ProjectConfig::with_toolchain(self.0))
        }

        fn base_image_fragment(&self) -> String {
            String::new()
        }

        fn build_commands(&self, _ctx: &mut BuildContext<'_>, _verb: Verb) -> Result<BuildResult> {
            Ok(BuildResult::noop())
        }

        fn create_project(&self, parent: &Path, _args: &[String], _boards: &BoardRegistry) -> Result<PathBuf> {
            Ok(parent.to_path_buf())
        }
    }

    #[test]
    fn test_verb_parse() {
        assert_eq!("compile".parse::<Verb>().unwrap(), Verb::Compile);
        assert_eq!(
            "localFolderContainerConstructer".parse::<Verb>().unwrap(),
            Verb::ContainerInit
        );
        assert!(matches!(
            "deploy".parse::<Verb>(),
            Err(ExtensionError::UnknownVerb { .. })
        ));
    }

    #[test]
    fn test_get_by_alias() {
        let registry = ExtensionRegistry::builtin();
        assert_eq!(registry.get("micropython").unwrap().name(), "micro-python");
        assert!(matches!(
            registry.get("zephyr"),
            Err(ExtensionError::UnknownToolchain { .. })
        ));
    }

    #[test]
    fn test_builtin_names() {
        let names = ExtensionRegistry::builtin().names();
        for name in ["arduino", "mbed", "esp32", "raspberry", "micro-python", "default"] {
            assert!(names.contains(&name), "missing {name}");
        }
    }

    #[test]
    fn test_single_claim_is_adopted() {
        let temp = TempDir::new().unwrap();
        let registry = ExtensionRegistry::new(vec![Box::new(Claims("first"))]);
        let config = registry.detect(temp.path(), &[], "init").unwrap();
        assert_eq!(config.toolchain.as_deref(), Some("first"));
    }

    #[test]
    fn test_two_claims_are_ambiguous() {
        let temp = TempDir::new().unwrap();
        let registry = ExtensionRegistry::new(vec![Box::new(Claims("first")), Box::new(Claims("second"))]);
        let err = registry.detect(temp.path(), &[], "init").unwrap_err();
        match err {
            crate::error::IotzError::Project(ProjectError::AmbiguousDetection { candidates }) => {
                assert_eq!(candidates, vec!["first", "second"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_no_claim_is_not_detected() {
        let temp = TempDir::new().unwrap();
        let registry = ExtensionRegistry::new(Vec::new());
        assert!(matches!(
            registry.detect(temp.path(), &[], "init"),
            Err(crate::error::IotzError::Project(ProjectError::NotDetected { .. }))
        ));
    }

    #[test]
    fn test_feature_lookup() {
        let registry = ExtensionRegistry::builtin();
        assert_eq!(registry.with_feature("upip").unwrap().name(), "micro-python");
        assert!(registry.with_feature("pip").is_none());
    }

    #[test]
    fn test_target_token_skips_toolchain_name() {
        let mut config = ProjectConfig::default();
        let boards = BoardRegistry::default();
        let args = vec!["arduino".to_string(), "uno".to_string()];
        let ctx = BuildContext {
            config: &mut config,
            args: &args,
            project_dir: Path::new("."),
            mount_dir: "/src/app",
            boards: &boards,
        };
        assert_eq!(ctx.target_token("arduino"), Some("uno"));
        assert_eq!(ctx.joined_args(), "arduino uno");
    }
}
