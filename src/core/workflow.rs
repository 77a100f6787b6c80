//! Container lifecycle
//!
//! Drives a verb from the project descriptor to a finished container run:
//!
//! 1. load the descriptor (or detect the toolchain),
//! 2. let the toolchain extension build the script,
//! 3. make sure the toolchain image and the per-project image exist,
//! 4. run the script in an ephemeral container (or bake it into a new
//!    image layer), then apply the post-step on the host.

use std::path::{Path, PathBuf};

use crate::config::defaults::TRANSIENT_DOCKERFILE;
use crate::config::images::{toolchain_image, BASE_IMAGE};
use crate::core::dockerfile;
use crate::core::extension::{BuildContext, BuildResult, Extension, ExtensionRegistry, PostStep, Verb};
use crate::core::project::ProjectConfig;
use crate::core::shell::Script;
use crate::core::toolchains::Mbed;
use crate::core::user_config::UserConfig;
use crate::error::{ExtensionError, ProjectError, Result};
use crate::infra::dirs::IotzDirs;
use crate::infra::docker::{image_listed, BuildRequest, ContainerEngine, MountConfig, RunSpec};
use crate::infra::filesystem::{self, TransientFile};
use crate::infra::identity::{ContainerIdentity, MountLayout};
use crate::registry::{BoardCache, BoardRegistry};

/// How a missing or incomplete descriptor is handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Discovery {
    /// Ask the extensions to claim the directory
    Detect,
    /// The descriptor must exist and name a toolchain
    Require,
}

/// A project directory with its descriptor and container naming
#[derive(Debug, Clone)]
pub struct Project {
    pub dir: PathBuf,
    pub config: ProjectConfig,
    pub identity: ContainerIdentity,
    pub layout: MountLayout,
    /// Descriptor differs from what is on disk
    dirty: bool,
}

impl Project {
    /// Project image tag
    pub fn image(&self) -> String {
        self.identity.project_image()
    }

    pub fn toolchain(&self) -> Result<&str> {
        self.config.require_toolchain()
    }

    fn persist(&mut self) -> Result<()> {
        if self.dirty {
            self.config.save(&self.dir)?;
            tracing::info!("Updated {}", self.dir.join(crate::config::defaults::DESCRIPTOR_FILE).display());
            self.dirty = false;
        }
        Ok(())
    }
}

/// Mount layout for a project, honouring `mountConfig.root`
fn layout_for(dir: &Path, config: &ProjectConfig) -> MountLayout {
    let root = config
        .mount_config
        .as_ref()
        .and_then(|m| m.root.as_deref())
        .filter(|r| !r.is_empty());
    match root {
        Some(root) => {
            let host_root = dir.join(root);
            let host_root = host_root.canonicalize().unwrap_or(host_root);
            let dir = dir.canonicalize().unwrap_or_else(|_| dir.to_path_buf());
            MountLayout::new(&dir, &host_root)
        }
        None => MountLayout::parent_of(dir),
    }
}

/// Orchestrates extensions and the container engine
#[derive(Debug)]
pub struct Workflow<E: ContainerEngine> {
    engine: E,
    dirs: IotzDirs,
    extensions: ExtensionRegistry,
    user_config: UserConfig,
}

impl<E: ContainerEngine> Workflow<E> {
    /// Workflow with the built-in toolchains
    pub fn new(engine: E, dirs: IotzDirs) -> Result<Self> {
        Self::with_extensions(engine, dirs, ExtensionRegistry::builtin())
    }

    pub fn with_extensions(engine: E, dirs: IotzDirs, extensions: ExtensionRegistry) -> Result<Self> {
        let user_config = UserConfig::load(&dirs)?;
        Ok(Self {
            engine,
            dirs,
            extensions,
            user_config,
        })
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn extensions(&self) -> &ExtensionRegistry {
        &self.extensions
    }

    pub fn user_config(&self) -> &UserConfig {
        &self.user_config
    }

    /// Board registry from the per-user dump, or the built-in list
    pub fn boards(&self, force_refresh: bool) -> Result<BoardRegistry> {
        Ok(BoardCache::from_dirs(&self.dirs).load(force_refresh)?)
    }

    /// Load the project in `dir`
    pub fn open(&self, dir: &Path, args: &[String], command: &str, discovery: Discovery) -> Result<Project> {
        let (config, dirty) = match (ProjectConfig::load(dir)?, discovery) {
            (Some(config), _) if config.require_toolchain().is_ok() => (config, false),
            (Some(mut config), Discovery::Detect) => {
                config.merge_detected(self.extensions.detect(dir, args, command)?);
                (config, true)
            }
            (Some(_), Discovery::Require) => return Err(ProjectError::MissingToolchain.into()),
            (None, Discovery::Detect) => (self.extensions.detect(dir, args, command)?, true),
            (None, Discovery::Require) => {
                return Err(ProjectError::DescriptorNotFound {
                    path: dir.to_path_buf(),
                }
                .into())
            }
        };

        // The toolchain must be one we know before anything is written
        self.extensions.get(config.require_toolchain()?)?;

        Ok(Project {
            identity: ContainerIdentity::of(dir)?,
            layout: layout_for(dir, &config),
            dir: dir.to_path_buf(),
            config,
            dirty,
        })
    }

    /// Let the project's extension build something, tracking descriptor changes
    fn build<F>(&self, project: &mut Project, args: &[String], boards: &BoardRegistry, f: F) -> Result<BuildResult>
    where
        F: FnOnce(&dyn Extension, &mut BuildContext<'_>) -> Result<BuildResult>,
    {
        let extension = self.extensions.get(project.toolchain()?)?;
        let before = project.config.clone();
        let result = {
            let mut ctx = BuildContext {
                config: &mut project.config,
                args,
                project_dir: &project.dir,
                mount_dir: &project.layout.container_dir,
                boards,
            };
            f(extension, &mut ctx)?
        };
        if project.config != before {
            project.dirty = true;
        }
        Ok(result)
    }

    /// Build the toolchain base image and record it
    pub async fn install_toolchain(&mut self, name: &str) -> Result<()> {
        let extension = self.extensions.get(name)?;
        let image = toolchain_image(extension.name());
        let context = self.dirs.extension_dir(extension.name());
        filesystem::create_dir_all(&context)?;

        tracing::info!("Building {} toolchain image {}", extension.name(), image);
        let content = dockerfile::toolchain_dockerfile(extension.name(), &extension.base_image_fragment());
        let dockerfile = TransientFile::create(context.join(format!("{}.Dockerfile", extension.name())), &content)?;

        self.engine.remove_image(&image).await;
        self.engine
            .build_image(&BuildRequest {
                context: context.clone(),
                dockerfile: dockerfile.path().to_path_buf(),
                tag: image.clone(),
            })
            .await?;
        drop(dockerfile);

        if let Some(script) = extension.board_dump_script() {
            self.record_board_dump(&image, &script).await;
        }

        let canonical = extension.name();
        self.user_config.record_extension(canonical, image);
        self.user_config.save(&self.dirs)?;
        Ok(())
    }

    /// Keep the board definitions shipped in a fresh toolchain image
    async fn record_board_dump(&self, image: &str, script: &Script) {
        let spec = RunSpec::new(image, script.render()).without_tty();
        match self.engine.capture(&spec).await {
            Ok(dump) if !dump.trim().is_empty() => {
                let path = self.dirs.board_source_path();
                match filesystem::write_file(&path, &dump) {
                    Ok(()) => tracing::info!("Recorded board definitions in {}", path.display()),
                    Err(e) => tracing::warn!("Failed to record board definitions: {}", e),
                }
            }
            Ok(_) => tracing::warn!("No board definitions found in {}", image),
            Err(e) => tracing::warn!("Failed to list board definitions: {}", e),
        }
    }

    /// Install the toolchain unless it is recorded and its image exists
    pub async fn ensure_toolchain(&mut self, name: &str, listing: &str) -> Result<()> {
        let canonical = self.extensions.get(name)?.name();
        if self.user_config.is_installed(canonical) && image_listed(listing, &toolchain_image(canonical)) {
            return Ok(());
        }
        self.install_toolchain(canonical).await
    }

    /// Build the per-project image when absent (or always, with `force`)
    pub async fn ensure_project_image(&mut self, project: &mut Project, boards: &BoardRegistry, force: bool) -> Result<()> {
        let image = project.image();
        let listing = self.engine.list_images().await?;
        if !force && image_listed(&listing, &image) {
            return Ok(());
        }

        let setup = self.build(project, &[], boards, |ext, ctx| ext.build_commands(ctx, Verb::ContainerInit))?;
        self.build_project_image(project, &setup.run, &listing).await
    }

    async fn build_project_image(&mut self, project: &mut Project, setup: &Script, listing: &str) -> Result<()> {
        let toolchain = project.toolchain()?.to_string();
        self.ensure_toolchain(&toolchain, listing).await?;
        project.persist()?;

        let image = project.image();
        self.engine.remove_image(&image).await;

        let canonical = self.extensions.get(&toolchain)?.name();
        let content = dockerfile::project_dockerfile(canonical, &image, &project.layout.container_dir, setup);
        let dockerfile = TransientFile::create(project.dir.join(TRANSIENT_DOCKERFILE), &content)?;
        tracing::info!("Creating project image {}", image);
        self.engine
            .build_image(&BuildRequest {
                context: project.dir.clone(),
                dockerfile: PathBuf::from(TRANSIENT_DOCKERFILE),
                tag: image,
            })
            .await?;
        drop(dockerfile);
        Ok(())
    }

    fn run_spec(project: &Project, script: &Script) -> RunSpec {
        RunSpec::new(project.image(), script.render())
            .with_name(project.identity.instance_name())
            .with_mount(MountConfig::project_root(project.layout.host_root.clone()))
            .with_workdir(project.layout.container_dir.clone())
    }

    /// Run `script` in a fresh container of the project image
    async fn run_script(&self, project: &Project, script: &Script, interactive: bool) -> Result<()> {
        let instance = project.identity.instance_name();
        self.engine.remove_container(&instance).await;

        let mut spec = Self::run_spec(project, script);
        if interactive {
            spec = spec.interactive();
        }
        self.engine.run(&spec).await?;
        Ok(())
    }

    /// Bake `script` into a new layer of the project image
    async fn commit_script(&self, project: &Project, script: &Script) -> Result<()> {
        let image = project.image();
        let content = dockerfile::commit_dockerfile(&image, &project.layout.container_dir, script);
        let dockerfile = TransientFile::create(project.dir.join(TRANSIENT_DOCKERFILE), &content)?;
        self.engine
            .build_image(&BuildRequest {
                context: project.dir.clone(),
                dockerfile: PathBuf::from(TRANSIENT_DOCKERFILE),
                tag: image,
            })
            .await?;
        drop(dockerfile);
        Ok(())
    }

    async fn apply_post(&self, project: &Project, post: &PostStep) -> Result<()> {
        match post {
            PostStep::RemoveProjectImage => self.engine.remove_image(&project.image()).await,
            PostStep::WriteMbedAppConfig(app) => {
                Mbed::write_app_config(&project.dir, app)?;
            }
            PostStep::PatchMbedMakefile => Mbed::patch_makefile(&project.dir)?,
        }
        Ok(())
    }

    /// Run a build result against an existing project image
    async fn execute(&self, project: &Project, result: &BuildResult) -> Result<Option<PostStep>> {
        if !result.run.is_empty() {
            if result.commit_changes {
                self.commit_script(project, &result.run).await?;
            } else {
                self.run_script(project, &result.run, false).await?;
            }
        }
        if let Some(post) = &result.post {
            self.apply_post(project, post).await?;
        }
        Ok(result.post.clone())
    }

    /// `iotz init`: (re)create the project image and prepare the project
    pub async fn init(&mut self, dir: &Path, args: &[String]) -> Result<Project> {
        let mut project = self.open(dir, args, "init", Discovery::Detect)?;
        let boards = self.boards(false)?;

        // Resolve everything before touching docker
        let setup = self.build(&mut project, args, &boards, |ext, ctx| ext.build_commands(ctx, Verb::ContainerInit))?;
        let result = self.build(&mut project, args, &boards, |ext, ctx| ext.build_commands(ctx, Verb::Init))?;

        let listing = self.engine.list_images().await?;
        self.build_project_image(&mut project, &setup.run, &listing).await?;
        self.execute(&project, &result).await?;
        project.persist()?;
        Ok(project)
    }

    /// `compile`, `clean` and `export`
    pub async fn run_verb(&mut self, dir: &Path, verb: Verb, args: &[String]) -> Result<Option<PostStep>> {
        let mut project = self.open(dir, args, verb.as_str(), Discovery::Require)?;
        let boards = self.boards(false)?;

        let result = self.build(&mut project, args, &boards, |ext, ctx| ext.build_commands(ctx, verb))?;
        self.ensure_project_image(&mut project, &boards, false).await?;
        project.persist()?;
        self.execute(&project, &result).await
    }

    /// `run`, `make`, `connect`: a raw command in the project image
    pub async fn run_raw(&mut self, dir: &Path, command: &str, script: Script, interactive: bool) -> Result<()> {
        if script.is_empty() {
            return Err(ExtensionError::MissingArguments {
                command: command.to_string(),
            }
            .into());
        }
        let mut project = self.open(dir, &[], command, Discovery::Require)?;
        let boards = self.boards(false)?;
        self.ensure_project_image(&mut project, &boards, false).await?;
        project.persist()?;
        self.run_script(&project, &script, interactive).await
    }

    /// `apt-get`, `pip`, `npm`: install into the project image
    pub async fn commit(&mut self, dir: &Path, command: &str, script: Script) -> Result<()> {
        if script.is_empty() {
            return Err(ExtensionError::MissingArguments {
                command: command.to_string(),
            }
            .into());
        }
        let mut project = self.open(dir, &[], command, Discovery::Require)?;
        let boards = self.boards(false)?;
        self.ensure_project_image(&mut project, &boards, false).await?;
        project.persist()?;
        self.commit_script(&project, &script).await
    }

    /// Any other verb: a toolchain name (`arduino ...`) or a feature (`upip ...`)
    pub async fn external(&mut self, dir: &Path, verb: &str, args: &[String]) -> Result<()> {
        let named = self.extensions.get(verb).ok().map(|e| e.name());
        let featured = self.extensions.with_feature(verb).map(|e| e.name());
        if named.is_none() && featured.is_none() {
            return Err(ExtensionError::UnknownVerb {
                verb: verb.to_string(),
            }
            .into());
        }

        let mut project = self.open(dir, args, verb, Discovery::Detect)?;
        let boards = self.boards(false)?;
        let toolchain = self.extensions.get(project.toolchain()?)?.name();

        let result = if featured == Some(toolchain) {
            self.build(&mut project, args, &boards, |ext, ctx| ext.add_feature(ctx, verb))?
        } else if named == Some(toolchain) {
            self.build(&mut project, args, &boards, |ext, ctx| ext.self_call(ctx))?
        } else {
            return Err(ExtensionError::UnknownVerb {
                verb: verb.to_string(),
            }
            .into());
        };

        self.ensure_project_image(&mut project, &boards, false).await?;
        project.persist()?;
        self.execute(&project, &result).await?;
        Ok(())
    }

    /// `iotz update`: refresh the shared image and every installed toolchain
    pub async fn update(&mut self, dir: &Path) -> Result<Vec<String>> {
        self.engine.pull(BASE_IMAGE).await?;

        if let Ok(identity) = ContainerIdentity::of(dir) {
            self.engine.remove_image(&identity.project_image()).await;
        }

        let installed: Vec<String> = self.user_config.installed().map(str::to_string).collect();
        for name in &installed {
            self.install_toolchain(name).await?;
        }
        Ok(installed)
    }
}
