//! ARM mbed toolchain
//!
//! Wraps mbed-cli. `init` creates the mbed program in place, pulls the
//! libraries referenced by `.lib` files and by `deps` in the descriptor into
//! `iotz-mbed-deps/`, and selects the target and GCC_ARM.

use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::config::defaults::{BUILD_DIR, MBED_DEPS_DIR};
use crate::core::extension::{BuildContext, BuildResult, Extension, PostStep, Verb};
use crate::core::project::{Dependency, ProjectConfig};
use crate::core::shell::{Script, ShellCommand};
use crate::error::{ExtensionError, Result};
use crate::infra::filesystem;
use crate::registry::BoardRegistry;

use super::project_location;

const NAME: &str = "mbed";

/// Files that mark a directory as an mbed program
const MARKERS: &[&str] = &[".mbed", "mbed_app.json", "mbed-os.lib"];

const MBED_OS: &str = "mbed-os";

/// A pinned mbed-os dependency means the program must not fetch its own copy
const PINNED_MBED_OS: &str = "/mbed-os/#";

const MAKEFILE: &str = "Makefile";

/// Makefile lines rewritten after export
const MAKEFILE_PATCHES: &[(&str, &str)] = &[
    (
        "CPP     = 'arm-none-eabi-g++'",
        "CPP     = 'arm-none-eabi-g++' '-fdiagnostics-color=always'",
    ),
    (
        "C     = 'arm-none-eabi-gcc'",
        "CC     = 'arm-none-eabi-gcc' '-fdiagnostics-color=always'",
    ),
];

pub struct Mbed;

impl Mbed {
    fn app_config_path(project_dir: &Path) -> PathBuf {
        project_dir.join(MBED_DEPS_DIR).join("mbed_app.json")
    }

    /// Write the inline application configuration if it changed
    ///
    /// Returns whether the file was written.
    pub fn write_app_config(project_dir: &Path, app: &Value) -> Result<bool> {
        let path = Self::app_config_path(project_dir);
        let content = serde_json::to_string_pretty(app).unwrap_or_else(|_| "{}".to_string());
        if std::fs::read_to_string(&path).is_ok_and(|existing| existing == content) {
            return Ok(false);
        }
        filesystem::write_file(&path, &content)?;
        Ok(true)
    }

    /// Enable coloured compiler diagnostics in an exported Makefile
    pub fn patch_makefile(project_dir: &Path) -> Result<()> {
        let path = project_dir.join(MAKEFILE);
        if !path.is_file() {
            return Err(ExtensionError::MissingArtifact {
                file: MAKEFILE.to_string(),
            }
            .into());
        }
        let mut content = filesystem::read_file(&path)?;
        for (from, to) in MAKEFILE_PATCHES {
            content = content.replacen(from, to, 1);
        }
        filesystem::write_file(&path, &content)?;
        Ok(())
    }

    /// `--app-config` arguments, refreshing the generated file first
    fn app_config_args(ctx: &BuildContext<'_>) -> Result<Vec<String>> {
        match &ctx.config.mbed_app {
            Some(app) => {
                Self::write_app_config(ctx.project_dir, app)?;
                Ok(vec![
                    "--app-config".to_string(),
                    format!("{MBED_DEPS_DIR}/mbed_app.json"),
                ])
            }
            None => Ok(Vec::new()),
        }
    }

    /// Steps adding every declared dependency
    fn dependency_steps(deps: &[Dependency]) -> Result<(Script, bool)> {
        let mut script = Script::new();
        let mut pinned = false;

        for dep in deps {
            let Some(url) = dep.url.as_deref() else {
                tracing::warn!("Skipping dependency '{}' without url", dep.name);
                continue;
            };
            if !url.contains(&dep.name) {
                return Err(ExtensionError::DependencyMismatch {
                    name: dep.name.clone(),
                    url: url.to_string(),
                }
                .into());
            }
            pinned |= url.contains(PINNED_MBED_OS);

            script = if dep.name == MBED_OS {
                script
                    .then(ShellCommand::new("rm").arg("-rf").arg(MBED_OS))
                    .then(ShellCommand::new("mbed").arg("add").quoted(url))
            } else {
                let dest = format!("{MBED_DEPS_DIR}/{}", dep.name);
                script
                    .then(ShellCommand::new("rm").arg("-rf").quoted(dest.clone()))
                    .then(ShellCommand::new("mbed").arg("add").quoted(url).quoted(dest))
            };
        }

        Ok((script, pinned))
    }

    fn clean_script() -> Script {
        Script::raw(format!(
            "rm -rf {MBED_DEPS_DIR}/ {BUILD_DIR}/ .mbed mbed/ mbed-os.lib mbed-os/ mbed_settings.py*"
        ))
    }

    fn init(ctx: &mut BuildContext<'_>) -> Result<BuildResult> {
        if let Some(token) = ctx.target_token(NAME).map(str::to_string) {
            if ctx.config.target.as_deref().is_some_and(|t| t != token) {
                tracing::warn!("Updating the target board in iotz.json to '{}'", token);
            }
            ctx.config.target = Some(token);
        }

        let (deps, pinned) = Self::dependency_steps(&ctx.config.deps)?;

        let mut new = ShellCommand::new("mbed").arg("new").arg(".");
        if pinned {
            new = new.arg("--create-only");
        }
        let mut script = Self::clean_script().then(new.arg("--depth").arg("1"));
        if let Some(target) = &ctx.config.target {
            script = script.then(ShellCommand::new("mbed").arg("target").quoted(target.clone()));
        }
        script = script
            .then(ShellCommand::new("mbed").arg("toolchain").arg("GCC_ARM"))
            .then(ShellCommand::new("mkdir").arg("-p").arg(MBED_DEPS_DIR))
            .then_raw(format!(
                "find . -name '*.lib' -exec cat {{}} \\; | while read line; do \
                 cd {MBED_DEPS_DIR} && mbed add $line 2>/dev/null || cd .. && cd .. ; done"
            ))
            .then_raw(format!(
                "if [ -d {MBED_DEPS_DIR}/{MBED_OS} ]; then rm -rf {MBED_OS} && mv {MBED_DEPS_DIR}/{MBED_OS} .; fi"
            ))
            .chain(deps);

        if ctx.config.target.is_none() {
            script = script
                .then(ShellCommand::new("mbed").arg("target").arg("-S"))
                .then(ShellCommand::new("echo").quoted(
                    "You should define the \"target\" from the list above. Please update iotz.json with \"target\".",
                ));
        }

        let mut result = BuildResult::script(script);
        if let Some(app) = &ctx.config.mbed_app {
            result = result.with_post(PostStep::WriteMbedAppConfig(app.clone()));
        }
        Ok(result)
    }
}

impl Extension for Mbed {
    fn name(&self) -> &'static str {
        NAME
    }

    fn detect_project(&self, project_dir: &Path, args: &[String], command: &str) -> Option<ProjectConfig> {
        let marked = MARKERS.iter().any(|m| project_dir.join(m).exists());
        let named = command == NAME || args.first().is_some_and(|a| a == NAME);
        (marked || named).then(|| ProjectConfig::with_toolchain(NAME))
    }

    fn base_image_fragment(&self) -> String {
        "RUN echo \" - installing ARM mbed tools\"\n\
         RUN pip install mbed-cli \\\n\
         \x20   && mkdir XXX && cd XXX && echo \"#include <mbed.h>\\nint main(){return 0;}\" > main.cpp \\\n\
         \x20   && mbed new . && mbed compile -t GCC_ARM -m NUCLEO_L476RG \\\n\
         \x20   && cd .. && rm -rf XXX"
            .to_string()
    }

    fn build_commands(&self, ctx: &mut BuildContext<'_>, verb: Verb) -> Result<BuildResult> {
        match verb {
            Verb::ContainerInit => Ok(BuildResult::noop()),
            Verb::Init => Self::init(ctx),
            Verb::Clean => Ok(BuildResult::script(Self::clean_script())),
            Verb::Compile => {
                let compile = ShellCommand::new("mbed")
                    .arg("compile")
                    .args(Self::app_config_args(ctx)?);
                Ok(BuildResult::script(Script::command(compile)))
            }
            Verb::Export => {
                let export = ShellCommand::new("mbed")
                    .arg("export")
                    .arg("--ide")
                    .arg("make_gcc_arm")
                    .args(Self::app_config_args(ctx)?);
                Ok(BuildResult::script(Script::command(export)).with_post(PostStep::PatchMbedMakefile))
            }
        }
    }

    fn self_call(&self, ctx: &mut BuildContext<'_>) -> Result<BuildResult> {
        Ok(BuildResult::script(Script::command(
            ShellCommand::new(NAME).args(ctx.args.iter().cloned()),
        )))
    }

    fn create_project(&self, parent: &Path, args: &[String], _boards: &BoardRegistry) -> Result<PathBuf> {
        let (dir, name) = project_location(parent, args.get(1).map(String::as_str))?;

        let source = format!(
            "// iotz\n\
             // {name} main.cpp\n\n\
             #include \"mbed.h\"\n\n\
             DigitalOut led(LED1);\n\n\
             int main()\n\
             {{\n\
             \x20 while (true) {{\n\
             \x20   led = !led;\n\
             \x20   printf(\"hello world!\\r\\n\");\n\
             \x20   wait(1);\n\
             \x20 }}\n\
             }}\n"
        );
        filesystem::write_file(&dir.join("main.cpp"), &source)?;

        ProjectConfig {
            name: Some(name),
            target: args.first().cloned(),
            ..ProjectConfig::with_toolchain(NAME)
        }
        .save(&dir)?;

        Ok(dir)
    }
}
