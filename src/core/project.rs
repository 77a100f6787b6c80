//! Project descriptor (iotz.json)
//!
//! The descriptor is a small JSON object naming the toolchain, the target
//! board and the main source file. Keys iotz does not know about are kept
//! verbatim so that rewriting an inferred field never drops user data.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::defaults::{DESCRIPTOR_FILE, LEGACY_DESCRIPTOR_FILE};
use crate::error::{FilesystemError, ProjectError, Result};
use crate::infra::filesystem;

/// A library the project depends on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Overrides for the bind mount
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MountSettings {
    /// Host directory mounted at `/src`, relative to the project directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root: Option<String>,
}

/// Contents of `iotz.json`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub toolchain: Option<String>,

    /// Board token or full codename
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,

    /// Main source file (arduino sketch)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub deps: Vec<Dependency>,

    /// Inline mbed application configuration
    #[serde(rename = "mbed_app.json", default, skip_serializing_if = "Option::is_none")]
    pub mbed_app: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mount_config: Option<MountSettings>,

    /// Unrecognized keys
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ProjectConfig {
    /// Descriptor carrying only a toolchain, as produced by detection
    pub fn with_toolchain(toolchain: impl Into<String>) -> Self {
        Self {
            toolchain: Some(toolchain.into()),
            ..Self::default()
        }
    }

    /// Parse descriptor JSON
    pub fn from_json(content: &str, path: &Path) -> Result<Self> {
        serde_json::from_str(content).map_err(|e| {
            ProjectError::InvalidDescriptor {
                path: path.to_path_buf(),
                error: e.to_string(),
            }
            .into()
        })
    }

    /// Serialize as pretty JSON
    pub fn to_json(&self) -> String {
        // A map of strings and JSON values always serializes
        serde_json::to_string_pretty(self).unwrap_or_else(|_| "{}".to_string())
    }

    /// Path the descriptor is read from, if any
    pub fn locate(project_dir: &Path) -> Option<PathBuf> {
        [DESCRIPTOR_FILE, LEGACY_DESCRIPTOR_FILE]
            .iter()
            .map(|file| project_dir.join(file))
            .find(|path| path.is_file())
    }

    /// Load the descriptor of a project, `None` when there is none
    pub fn load(project_dir: &Path) -> Result<Option<Self>> {
        let Some(path) = Self::locate(project_dir) else {
            return Ok(None);
        };
        let content = filesystem::read_file(&path)?;
        Self::from_json(&content, &path).map(Some)
    }

    /// Load the descriptor, failing when it does not exist
    pub fn load_required(project_dir: &Path) -> Result<Self> {
        Self::load(project_dir)?.ok_or_else(|| {
            ProjectError::DescriptorNotFound {
                path: project_dir.to_path_buf(),
            }
            .into()
        })
    }

    /// Write `iotz.json`
    pub fn save(&self, project_dir: &Path) -> std::result::Result<(), FilesystemError> {
        filesystem::write_file(&project_dir.join(DESCRIPTOR_FILE), &self.to_json())
    }

    /// Toolchain name, failing when unset
    pub fn require_toolchain(&self) -> Result<&str> {
        self.toolchain
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ProjectError::MissingToolchain.into())
    }

    /// Fill unset fields from a detected descriptor
    pub fn merge_detected(&mut self, detected: ProjectConfig) {
        if self.toolchain.is_none() {
            self.toolchain = detected.toolchain;
        }
        if self.target.is_none() {
            self.target = detected.target;
        }
        if self.filename.is_none() {
            self.filename = detected.filename;
        }
        if self.name.is_none() {
            self.name = detected.name;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_full_descriptor() {
        let json = r#"{
            "name": "blink",
            "toolchain": "mbed",
            "target": "nucleo_l476rg",
            "deps": [
                {"name": "NDefLib", "url": "https://os.mbed.com/teams/ST/code/NDefLib/#31f727872290"},
                {"name": "orphan"}
            ],
            "mbed_app.json": {"macros": ["DEBUG"]},
            "mountConfig": {"root": ".."}
        }"#;
        let config = ProjectConfig::from_json(json, Path::new("iotz.json")).unwrap();
        assert_eq!(config.toolchain.as_deref(), Some("mbed"));
        assert_eq!(config.deps.len(), 2);
        assert!(config.deps[1].url.is_none());
        assert!(config.mbed_app.is_some());
        assert_eq!(config.mount_config.unwrap().root.as_deref(), Some(".."));
    }

    #[test]
    fn test_invalid_json_is_descriptor_error() {
        let err = ProjectConfig::from_json("{", Path::new("iotz.json")).unwrap_err();
        assert!(matches!(
            err,
            crate::error::IotzError::Project(ProjectError::InvalidDescriptor { .. })
        ));
    }

    #[test]
    fn test_unknown_keys_survive_rewrite() {
        let json = r#"{"toolchain":"arduino","comment":"keep me","flags":[1,2]}"#;
        let config = ProjectConfig::from_json(json, Path::new("iotz.json")).unwrap();
        let rewritten: Value = serde_json::from_str(&config.to_json()).unwrap();
        assert_eq!(rewritten["comment"], "keep me");
        assert_eq!(rewritten["flags"][1], 2);
    }

    #[test]
    fn test_load_missing_descriptor() {
        let temp = TempDir::new().unwrap();
        assert!(ProjectConfig::load(temp.path()).unwrap().is_none());
        assert!(ProjectConfig::load_required(temp.path()).is_err());
    }

    #[test]
    fn test_load_falls_back_to_legacy_name() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("iotc.json"), r#"{"toolchain":"arduino"}"#).unwrap();
        let config = ProjectConfig::load(temp.path()).unwrap().unwrap();
        assert_eq!(config.toolchain.as_deref(), Some("arduino"));
    }

    #[test]
    fn test_save_writes_iotz_json() {
        let temp = TempDir::new().unwrap();
        ProjectConfig::with_toolchain("raspberry").save(temp.path()).unwrap();
        assert!(temp.path().join("iotz.json").exists());
        assert!(!temp.path().join("iotc.json").exists());
    }

    #[test]
    fn test_require_toolchain() {
        assert!(ProjectConfig::default().require_toolchain().is_err());
        assert_eq!(
            ProjectConfig::with_toolchain("esp32").require_toolchain().unwrap(),
            "esp32"
        );
    }

    #[test]
    fn test_merge_detected_keeps_existing_values() {
        let mut config = ProjectConfig {
            target: Some("uno".to_string()),
            ..ProjectConfig::default()
        };
        let mut detected = ProjectConfig::with_toolchain("arduino");
        detected.target = Some("yun".to_string());
        detected.filename = Some("a.ino".to_string());

        config.merge_detected(detected);
        assert_eq!(config.toolchain.as_deref(), Some("arduino"));
        assert_eq!(config.target.as_deref(), Some("uno"));
        assert_eq!(config.filename.as_deref(), Some("a.ino"));
    }

    fn config_strategy() -> impl Strategy<Value = ProjectConfig> {
        (
            proptest::option::of("[a-zA-Z0-9_-]{1,16}"),
            proptest::option::of(prop_oneof![
                Just("arduino".to_string()),
                Just("mbed".to_string()),
                Just("raspberry".to_string()),
            ]),
            proptest::option::of("[a-zA-Z0-9:_]{1,24}"),
            proptest::option::of("[a-z]{1,8}\\.ino"),
            proptest::collection::vec(
                ("[A-Za-z-]{1,10}", proptest::option::of("https://[a-z./]{1,20}")),
                0..4,
            ),
        )
            .prop_map(|(name, toolchain, target, filename, deps)| ProjectConfig {
                name,
                toolchain,
                target,
                filename,
                deps: deps
                    .into_iter()
                    .map(|(name, url)| Dependency { name, url })
                    .collect(),
                ..ProjectConfig::default()
            })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn test_descriptor_roundtrip(config in config_strategy()) {
            let temp = TempDir::new().unwrap();
            config.save(temp.path()).unwrap();
            let loaded = ProjectConfig::load_required(temp.path()).unwrap();
            prop_assert_eq!(loaded, config);
        }
    }
}
