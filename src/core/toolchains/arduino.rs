//! Arduino toolchain
//!
//! Builds sketches with the Arduino IDE 1.8.5 command line. Boards are
//! installed per project (`arduino --install-boards vendor:arch`) when the
//! project image is created; the MXChip AZ3166 needs a patched platform
//! definition and a post-link bootloader patch.

use std::path::{Path, PathBuf};

use crate::config::defaults::BUILD_DIR;
use crate::config::urls;
use crate::core::extension::{BuildContext, BuildResult, Extension, PostStep, Verb};
use crate::core::project::ProjectConfig;
use crate::core::shell::{quote, Script, ShellCommand};
use crate::error::{BoardError, ExtensionError, Result};
use crate::infra::filesystem;
use crate::registry::{parser::SECTION_MARKER, BoardRegistry, Codename};

use super::project_location;

const NAME: &str = "arduino";

/// Board that needs the patched platform and bootloader step
const AZ3166_CODENAME: &str = "AZ3166:stm32f4:MXCHIP_AZ3166";

/// Board package directory of the AZ3166 inside the container
const AZ3166_PACKAGE_DIR: &str = "/root/.arduino15/packages/AZ3166/hardware/stm32f4";

const AZ3166_PLATFORM_VERSION: &str = "1.3.7";

pub struct Arduino;

impl Arduino {
    fn is_az3166(codename: &str) -> bool {
        codename.eq_ignore_ascii_case(AZ3166_CODENAME)
    }

    /// Resolve the configured target into a full codename, persisting it
    fn resolve_target(ctx: &mut BuildContext<'_>) -> Result<Codename> {
        let configured = ctx.config.target.clone();
        let token = ctx.target_token(NAME).map(str::to_string);

        let codename = match (configured, token) {
            (Some(current), Some(token)) => {
                let requested = Self::lookup(ctx.boards, &token)?;
                if Self::lookup(ctx.boards, &current).ok().as_ref() != Some(&requested) {
                    tracing::warn!("Updating the target board in iotz.json from '{}' to '{}'", current, requested);
                }
                requested
            }
            (Some(current), None) => Self::lookup(ctx.boards, &current)?,
            (None, Some(token)) => Self::lookup(ctx.boards, &token)?,
            (None, None) => {
                return Err(BoardError::TargetRequired {
                    toolchain: NAME.to_string(),
                }
                .into())
            }
        };

        ctx.config.target = Some(codename.to_string());
        Ok(codename)
    }

    /// Codename of `requested`, which may already be a codename
    fn lookup(boards: &BoardRegistry, requested: &str) -> Result<Codename> {
        match boards.find_board(requested) {
            Some(board) => Ok(board.codename.parse()?),
            None if requested.contains(':') => Ok(requested.parse()?),
            None => Err(BoardError::NotFound {
                name: requested.to_string(),
            }
            .into()),
        }
    }

    /// Sketch to verify, inferred from the first `.ino` when unset
    fn resolve_filename(ctx: &mut BuildContext<'_>) -> Result<String> {
        if let Some(filename) = ctx.config.filename.clone().filter(|f| !f.is_empty()) {
            return Ok(filename);
        }
        let filename = filesystem::files_with_extension(ctx.project_dir, "ino")
            .into_iter()
            .next()
            .ok_or(BoardError::FilenameRequired)?;
        ctx.config.filename = Some(filename.clone());
        Ok(filename)
    }

    fn install_script(codename: &Codename) -> Script {
        if Self::is_az3166(&codename.to_string()) {
            let platform = format!("~/.arduino15/packages/AZ3166/hardware/stm32f4/{AZ3166_PLATFORM_VERSION}/platform.txt");
            Script::command(ShellCommand::new("arduino").arg("--install-boards").arg("AZ3166:stm32f4"))
                .then(ShellCommand::new("rm").arg("-f").arg(platform.clone()))
                .then(
                    ShellCommand::new("curl")
                        .arg("-sSL")
                        .quoted(urls::AZ3166_PLATFORM_TWEAK)
                        .arg("-o")
                        .arg(platform),
                )
        } else {
            Script::command(
                ShellCommand::new("arduino")
                    .arg("--install-boards")
                    .arg(codename.family()),
            )
        }
    }

    fn compile_script(ctx: &mut BuildContext<'_>) -> Result<Script> {
        let codename = match ctx.config.target.clone() {
            Some(target) => {
                let codename = Self::lookup(ctx.boards, &target)?;
                if codename.to_string() != target {
                    ctx.config.target = Some(codename.to_string());
                }
                codename
            }
            None => Self::resolve_target(ctx)?,
        };
        let filename = Self::resolve_filename(ctx)?;
        let build_path = format!("{}/{BUILD_DIR}", ctx.mount_dir);

        let mut verify = ShellCommand::new("arduino")
            .arg("--board")
            .quoted(codename.to_string())
            .arg("--verify")
            .quoted(filename.clone())
            .arg("--pref")
            .arg(format!("build.path={build_path}"));

        let board_config = ctx
            .boards
            .find_board(&codename.to_string())
            .map(|b| b.config.clone())
            .unwrap_or_default();
        for pref in board_config {
            verify = verify.arg("--pref").quoted(pref);
        }

        let mut script = Script::command(verify);
        if Self::is_az3166(&codename.to_string()) {
            script = script.chain(Self::bootloader_patch(&build_path, &filename));
        }
        Ok(script)
    }

    /// Patch the linked binary with the AZ3166 bootloader
    fn bootloader_patch(build_path: &str, filename: &str) -> Script {
        let raw = format!("{build_path}/{filename}.bin");
        let patched = format!("{build_path}/{filename}o.bin");
        Script::raw(format!("cd {AZ3166_PACKAGE_DIR}/"))
            .then_raw("cd $(ls | awk '{print $1}')")
            .then(ShellCommand::new("cp").arg("bootloader/boot.bin").arg("/tools"))
            .then(
                ShellCommand::new("python")
                    .arg("/tools/boot_patch.py")
                    .quoted(raw.clone())
                    .quoted(patched.clone()),
            )
            .then(ShellCommand::new("rm").quoted(raw.clone()))
            .then(ShellCommand::new("mv").quoted(patched).quoted(raw))
    }
}

impl Extension for Arduino {
    fn name(&self) -> &'static str {
        NAME
    }

    fn detect_project(&self, project_dir: &Path, args: &[String], command: &str) -> Option<ProjectConfig> {
        let sketch = filesystem::files_with_extension(project_dir, "ino").into_iter().next();
        let named = command == NAME || args.first().is_some_and(|a| a == NAME);
        if sketch.is_none() && !named {
            return None;
        }
        Some(ProjectConfig {
            filename: sketch,
            ..ProjectConfig::with_toolchain(NAME)
        })
    }

    fn base_image_fragment(&self) -> String {
        format!(
            "RUN echo \" - installing Arduino tools\"\n\
             WORKDIR /tools\n\
             RUN curl -sSL \"{ide}\" -o arduino.tar.xz \\\n\
             \x20   && tar xf arduino.tar.xz && rm arduino.tar.xz \\\n\
             \x20   && ln -s /tools/arduino-1.8.5/arduino-builder /usr/local/bin/arduino-builder \\\n\
             \x20   && ln -s /tools/arduino-1.8.5/arduino /usr/local/bin/arduino \\\n\
             \x20   && curl -sSL \"{patch}\" -o /tools/boot_patch.py",
            ide = urls::ARDUINO_IDE,
            patch = urls::AZ3166_BOOT_PATCH,
        )
    }

    fn board_dump_script(&self) -> Option<Script> {
        let marker = quote(&format!("{SECTION_MARKER}{{}}"));
        Some(Script::raw(format!(
            "find /tools/arduino-1.8.5/hardware /root/.arduino15/packages -name boards.txt \
             -exec echo {marker} \\; -exec cat {{}} \\; 2>/dev/null; true"
        )))
    }

    fn build_commands(&self, ctx: &mut BuildContext<'_>, verb: Verb) -> Result<BuildResult> {
        match verb {
            Verb::Init => Ok(BuildResult::noop()),
            Verb::ContainerInit => {
                let codename = Self::resolve_target(ctx)?;
                Ok(BuildResult::script(Self::install_script(&codename)))
            }
            Verb::Clean => Ok(BuildResult::script(Script::raw(format!("rm -rf {BUILD_DIR}/ .arduino15/")))
                .with_post(PostStep::RemoveProjectImage)),
            Verb::Compile => Ok(BuildResult::script(Self::compile_script(ctx)?)),
            Verb::Export => Err(ExtensionError::ExportUnsupported {
                toolchain: NAME.to_string(),
            }
            .into()),
        }
    }

    fn self_call(&self, ctx: &mut BuildContext<'_>) -> Result<BuildResult> {
        Ok(BuildResult::script(Script::command(
            ShellCommand::new(NAME).args(ctx.args.iter().cloned()),
        )))
    }

    fn create_project(&self, parent: &Path, args: &[String], boards: &BoardRegistry) -> Result<PathBuf> {
        let target = args
            .first()
            .map(|token| Self::lookup(boards, token))
            .transpose()?;
        let (dir, name) = project_location(parent, args.get(1).map(String::as_str))?;

        let sketch = format!(
            "// iotz\n\
             // {name}.ino\n\n\
             void setup() {{\n\
             \x20 Serial.begin(115200);\n\
             }}\n\n\
             void loop() {{\n\
             \x20 Serial.println(\"hello world!\");\n\
             \x20 delay(1000);\n\
             }}\n"
        );
        let filename = format!("{name}.ino");
        filesystem::write_file(&dir.join(&filename), &sketch)?;

        ProjectConfig {
            name: Some(name),
            target: target.map(|c| c.to_string()),
            filename: Some(filename),
            ..ProjectConfig::with_toolchain(NAME)
        }
        .save(&dir)?;

        Ok(dir)
    }
}
