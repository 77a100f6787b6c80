//! ESP32 toolchain (xtensa gcc + esp-idf, make based)

use std::path::{Path, PathBuf};

use crate::config::defaults::DEFAULT_PROJECT_NAME;
use crate::config::urls;
use crate::core::extension::{BuildContext, BuildResult, Extension, Verb};
use crate::core::project::ProjectConfig;
use crate::core::shell::{Script, ShellCommand};
use crate::error::{ExtensionError, Result};
use crate::infra::git;
use crate::registry::BoardRegistry;

const NAME: &str = "esp32";

pub struct Esp32;

impl Extension for Esp32 {
    fn name(&self) -> &'static str {
        NAME
    }

    fn base_image_fragment(&self) -> String {
        let archive = urls::ESP32_TOOLCHAIN.rsplit('/').next().unwrap_or_default();
        format!(
            "RUN echo \" - installing ESP32 tools\"\n\
             WORKDIR /tools\n\
             RUN apt-get install -y wget libncurses-dev flex bison gperf python-serial \\\n\
             \x20   && mkdir esp && cd esp && wget {toolchain} \\\n\
             \x20   && tar -xzf {archive} && rm {archive} \\\n\
             \x20   && git clone --recursive {idf}\n\
             ENV IDF_PATH /tools/esp/esp-idf\n\
             ENV PATH /tools/esp/xtensa-esp32-elf/bin:/usr/local/sbin:/usr/local/bin:/usr/sbin:/usr/bin:/sbin:/bin",
            toolchain = urls::ESP32_TOOLCHAIN,
            idf = urls::ESP_IDF,
        )
    }

    fn build_commands(&self, ctx: &mut BuildContext<'_>, verb: Verb) -> Result<BuildResult> {
        match verb {
            Verb::Init | Verb::ContainerInit => Ok(BuildResult::noop()),
            Verb::Clean => Ok(BuildResult::script(Script::command(
                ShellCommand::new("make").arg("clean"),
            ))),
            Verb::Compile => Ok(BuildResult::script(Script::command(
                ShellCommand::new("make").args(ctx.args.iter().cloned()),
            ))),
            Verb::Export => Err(ExtensionError::ExportUnsupported {
                toolchain: NAME.to_string(),
            }
            .into()),
        }
    }

    fn create_project(&self, parent: &Path, args: &[String], _boards: &BoardRegistry) -> Result<PathBuf> {
        let name = args
            .first()
            .filter(|n| !n.is_empty())
            .map_or(DEFAULT_PROJECT_NAME, String::as_str);
        let dir = git::clone_template(urls::ESP_IDF_TEMPLATE, &parent.join(name))?;

        ProjectConfig {
            name: Some(name.to_string()),
            ..ProjectConfig::with_toolchain(NAME)
        }
        .save(&dir)?;

        Ok(dir)
    }
}
