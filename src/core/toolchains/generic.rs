//! Plain gcc/make projects (`"toolchain": "default"`)

use std::path::{Path, PathBuf};

use crate::core::extension::{BuildContext, BuildResult, Extension, Verb};
use crate::core::shell::{Script, ShellCommand};
use crate::error::Result;
use crate::registry::BoardRegistry;

use super::create_make_project;

const NAME: &str = "default";

pub struct Generic;

impl Extension for Generic {
    fn name(&self) -> &'static str {
        NAME
    }

    /// The shared base image already carries gcc and make
    fn base_image_fragment(&self) -> String {
        String::new()
    }

    fn build_commands(&self, ctx: &mut BuildContext<'_>, verb: Verb) -> Result<BuildResult> {
        match verb {
            Verb::Init | Verb::ContainerInit | Verb::Export => Ok(BuildResult::noop()),
            Verb::Clean => Ok(BuildResult::script(Script::command(
                ShellCommand::new("make").arg("clean"),
            ))),
            Verb::Compile => Ok(BuildResult::script(Script::command(
                ShellCommand::new("make").args(ctx.args.iter().cloned()),
            ))),
        }
    }

    fn create_project(&self, parent: &Path, args: &[String], _boards: &BoardRegistry) -> Result<PathBuf> {
        create_make_project(parent, args, NAME, "g++")
    }
}
