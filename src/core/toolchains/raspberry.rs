//! Raspberry Pi toolchain (arm-linux-gnueabihf cross compiler)

use std::path::{Path, PathBuf};

use crate::config::defaults::BUILD_DIR;
use crate::core::extension::{BuildContext, BuildResult, Extension, PostStep, Verb};
use crate::core::shell::{Script, ShellCommand};
use crate::error::{ExtensionError, Result};
use crate::registry::BoardRegistry;

use super::create_make_project;

const NAME: &str = "raspberry";

pub struct Raspberry;

impl Extension for Raspberry {
    fn name(&self) -> &'static str {
        NAME
    }

    fn base_image_fragment(&self) -> String {
        "RUN echo \" - installing raspberry pi tools\"\n\
         WORKDIR /tools\n\
         RUN apt-get install -y g++-arm-linux-gnueabihf gdb-multiarch"
            .to_string()
    }

    fn build_commands(&self, ctx: &mut BuildContext<'_>, verb: Verb) -> Result<BuildResult> {
        match verb {
            Verb::Init | Verb::ContainerInit => Ok(BuildResult::noop()),
            Verb::Clean => Ok(BuildResult::script(Script::raw(format!("rm -rf {BUILD_DIR}/")))
                .with_post(PostStep::RemoveProjectImage)),
            Verb::Compile => {
                // Without a Makefile there is nothing to build; show what is installed
                if ctx.project_dir.join("Makefile").is_file() {
                    Ok(BuildResult::script(Script::command(
                        ShellCommand::new("make").args(ctx.args.iter().cloned()),
                    )))
                } else {
                    Ok(BuildResult::script(
                        Script::command(ShellCommand::new("make").arg("--version"))
                            .then(ShellCommand::new("cmake").arg("--version"))
                            .then(ShellCommand::new("arm-linux-gnueabihf-g++").arg("-v")),
                    ))
                }
            }
            Verb::Export => Err(ExtensionError::ExportUnsupported {
                toolchain: NAME.to_string(),
            }
            .into()),
        }
    }

    fn create_project(&self, parent: &Path, args: &[String], _boards: &BoardRegistry) -> Result<PathBuf> {
        create_make_project(parent, args, NAME, "arm-linux-gnueabihf-g++")
    }
}
