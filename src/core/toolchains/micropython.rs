//! MicroPython (unix port)

use std::path::{Path, PathBuf};

use crate::config::urls;
use crate::core::extension::{BuildContext, BuildResult, Extension, Verb};
use crate::core::project::ProjectConfig;
use crate::core::shell::{Script, ShellCommand};
use crate::error::{ExtensionError, Result};
use crate::infra::filesystem;
use crate::registry::BoardRegistry;

use super::project_location;

const NAME: &str = "micro-python";
const ALIASES: &[&str] = &["micropython"];

/// `upip` installs packages into the project image; `micropython` runs the interpreter
const FEATURES: &[&str] = &["upip", "micropython"];

pub struct MicroPython;

impl MicroPython {
    fn interpreter(args: &[String]) -> Script {
        Script::command(ShellCommand::new("micropython").args(args.iter().cloned()))
    }
}

impl Extension for MicroPython {
    fn name(&self) -> &'static str {
        NAME
    }

    fn aliases(&self) -> &'static [&'static str] {
        ALIASES
    }

    fn detect_project(&self, _project_dir: &Path, args: &[String], _command: &str) -> Option<ProjectConfig> {
        args.first()
            .is_some_and(|a| a == NAME || ALIASES.contains(&a.as_str()))
            .then(|| ProjectConfig::with_toolchain(NAME))
    }

    fn base_image_fragment(&self) -> String {
        format!(
            "RUN apt-get update\n\
             RUN apt-get install -y build-essential libreadline-dev libffi-dev git pkg-config\n\
             RUN mkdir -p /tools && cd /tools \\\n\
             \x20   && git clone --recurse-submodules {repo} \\\n\
             \x20   && cd ./micropython/ports/unix \\\n\
             \x20   && make axtls \\\n\
             \x20   && make\n\
             RUN ln -s /tools/micropython/ports/unix/micropython /usr/bin/micropython",
            repo = urls::MICROPYTHON,
        )
    }

    fn build_commands(&self, ctx: &mut BuildContext<'_>, verb: Verb) -> Result<BuildResult> {
        match verb {
            Verb::Init | Verb::ContainerInit | Verb::Clean | Verb::Export => Ok(BuildResult::noop()),
            Verb::Compile => Ok(BuildResult::script(Self::interpreter(ctx.args))),
        }
    }

    fn features(&self) -> &'static [&'static str] {
        FEATURES
    }

    fn add_feature(&self, ctx: &mut BuildContext<'_>, feature: &str) -> Result<BuildResult> {
        match feature {
            "upip" => {
                if ctx.args.is_empty() {
                    return Err(ExtensionError::MissingArguments {
                        command: feature.to_string(),
                    }
                    .into());
                }
                let install = ShellCommand::new("micropython")
                    .arg("-m")
                    .arg("upip")
                    .args(ctx.args.iter().cloned());
                Ok(BuildResult::script(Script::command(install)).committed())
            }
            "micropython" => Ok(BuildResult::script(Self::interpreter(ctx.args))),
            other => Err(ExtensionError::UnknownVerb {
                verb: other.to_string(),
            }
            .into()),
        }
    }

    fn create_project(&self, parent: &Path, args: &[String], _boards: &BoardRegistry) -> Result<PathBuf> {
        let (dir, name) = project_location(parent, args.first().map(String::as_str))?;

        filesystem::write_file(
            &dir.join(format!("{name}.py")),
            &format!("# iotz\n# {name}.py\n\nprint(\"hello world!\")\n"),
        )?;
        ProjectConfig {
            name: Some(name),
            ..ProjectConfig::with_toolchain(NAME)
        }
        .save(&dir)?;

        Ok(dir)
    }
}
