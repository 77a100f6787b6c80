//! Integration tests for the container lifecycle
//!
//! Every verb runs against a recording engine, so these tests check the
//! docker calls, generated Dockerfiles and descriptor updates without a
//! docker daemon.

mod common;

use common::{EngineCall, RecordingEngine, TestProject};
use iotz::config::images::BASE_IMAGE;
use iotz::core::extension::{PostStep, Verb};
use iotz::core::shell::{Script, ShellCommand};
use iotz::core::user_config::UserConfig;
use iotz::error::{BoardError, ContainerError, ExtensionError, IotzError, ProjectError};
use iotz::infra::identity::ContainerIdentity;

const ARDUINO_IMAGE: &str = "azureiot/iotz_local_arduino";

fn project_image(project: &TestProject) -> String {
    ContainerIdentity::of(&project.path()).unwrap().project_image()
}

fn arduino_project(target: &str, sketch: &str) -> TestProject {
    let project = TestProject::new();
    project.create_file(sketch, "void setup() {}\nvoid loop() {}\n");
    project.create_file(
        "iotz.json",
        &format!(r#"{{"toolchain": "arduino", "target": "{target}", "filename": "{sketch}"}}"#),
    );
    project
}

fn project_with(toolchain: &str) -> TestProject {
    let project = TestProject::new();
    project.create_file("iotz.json", &format!(r#"{{"toolchain": "{toolchain}"}}"#));
    project
}

#[tokio::test]
async fn test_compile_arduino_uno() {
    let project = arduino_project("uno", "blink.ino");
    let mut workflow = project.workflow(RecordingEngine::new());

    let post = workflow.run_verb(&project.path(), Verb::Compile, &[]).await.unwrap();
    assert!(post.is_none());

    let engine = workflow.engine();
    assert_eq!(
        engine.run_scripts(),
        vec!["arduino --board 'arduino:avr:uno' --verify 'blink.ino' --pref build.path=/src/app/BUILD"]
    );
    assert_eq!(engine.built_tags(), vec![ARDUINO_IMAGE.to_string(), project_image(&project)]);

    let dockerfile = engine.dockerfile_for(&project_image(&project)).unwrap();
    assert!(dockerfile.starts_with("FROM azureiot/iotz_local_arduino\n"));
    assert!(dockerfile.contains("WORKDIR /src/app\n"));
    assert!(dockerfile.contains("&& arduino --install-boards arduino:avr"));

    // The short board name is replaced by its codename
    assert_eq!(project.descriptor()["target"], "arduino:avr:uno");
    assert!(!project.file_exists(".iotz.Dockerfile"));
}

#[tokio::test]
async fn test_compile_runs_in_named_instance() {
    let project = arduino_project("arduino:avr:uno", "blink.ino");
    let mut workflow = project.workflow(RecordingEngine::new());
    workflow.run_verb(&project.path(), Verb::Compile, &[]).await.unwrap();

    let instance = format!("{}_", project_image(&project));
    let calls = workflow.engine().calls();
    let removed = calls
        .iter()
        .position(|c| *c == EngineCall::RemoveContainer(instance.clone()))
        .unwrap();
    let ran = calls
        .iter()
        .position(|c| matches!(c, EngineCall::Run { name: Some(n), workdir: Some(w), .. } if *n == instance && w == "/src/app"))
        .unwrap();
    assert!(removed < ran);
}

#[tokio::test]
async fn test_compile_az3166_patches_bootloader() {
    let project = arduino_project("AZ3166:stm32f4:MXCHIP_AZ3166", "devkit.ino");
    let mut workflow = project.workflow(RecordingEngine::new());

    workflow.run_verb(&project.path(), Verb::Compile, &[]).await.unwrap();

    let engine = workflow.engine();
    let script = engine.run_scripts().pop().unwrap();
    assert!(script.starts_with("arduino --board 'AZ3166:stm32f4:MXCHIP_AZ3166' --verify 'devkit.ino'"));
    assert!(script.contains(
        "python /tools/boot_patch.py '/src/app/BUILD/devkit.ino.bin' '/src/app/BUILD/devkit.inoo.bin'"
    ));
    assert!(script.ends_with("mv '/src/app/BUILD/devkit.inoo.bin' '/src/app/BUILD/devkit.ino.bin'"));

    let dockerfile = engine.dockerfile_for(&project_image(&project)).unwrap();
    assert!(dockerfile.contains("arduino --install-boards AZ3166:stm32f4"));
    assert!(dockerfile.contains("platform.txt"));
}

#[tokio::test]
async fn test_init_arduino_without_target_writes_nothing() {
    let project = TestProject::new();
    let mut workflow = project.workflow(RecordingEngine::new());

    let err = workflow
        .init(&project.path(), &["arduino".to_string()])
        .await
        .unwrap_err();

    assert!(matches!(err, IotzError::Board(BoardError::TargetRequired { .. })));
    assert!(!project.file_exists("iotz.json"));
    assert!(!project.file_exists(".iotz.Dockerfile"));
    assert!(workflow.engine().calls().is_empty());
}

#[tokio::test]
async fn test_init_ambiguous_detection() {
    let project = TestProject::new();
    project.create_file("blink.ino", "");
    project.create_file("mbed_app.json", "{}");
    let mut workflow = project.workflow(RecordingEngine::new());

    let err = workflow.init(&project.path(), &[]).await.unwrap_err();

    match err {
        IotzError::Project(ProjectError::AmbiguousDetection { candidates }) => {
            assert!(candidates.contains(&"arduino".to_string()));
            assert!(candidates.contains(&"mbed".to_string()));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(!project.file_exists("iotz.json"));
}

#[tokio::test]
async fn test_init_nothing_detected() {
    let project = TestProject::new();
    let mut workflow = project.workflow(RecordingEngine::new());

    let err = workflow.init(&project.path(), &[]).await.unwrap_err();
    assert!(matches!(err, IotzError::Project(ProjectError::NotDetected { .. })));
}

#[tokio::test]
async fn test_init_arduino_with_board_token() {
    let project = TestProject::new();
    project.create_file("blink.ino", "");
    let mut workflow = project.workflow(RecordingEngine::new());

    let initialized = workflow
        .init(&project.path(), &["arduino".to_string(), "yun".to_string()])
        .await
        .unwrap();

    assert_eq!(initialized.config.target.as_deref(), Some("arduino:avr:yun"));
    let descriptor = project.descriptor();
    assert_eq!(descriptor["toolchain"], "arduino");
    assert_eq!(descriptor["target"], "arduino:avr:yun");
    assert_eq!(descriptor["filename"], "blink.ino");

    let engine = workflow.engine();
    assert!(engine.has_image(&project_image(&project)));
    assert!(engine.run_scripts().is_empty());
    assert!(!project.file_exists(".iotz.Dockerfile"));
}

#[tokio::test]
async fn test_init_rebuilds_existing_project_image() {
    let project = project_with("default");
    let image = project_image(&project);
    let engine = RecordingEngine::with_images(&["azureiot/iotz_local_default", &image]);
    let dirs = project.dirs();
    let mut config = UserConfig::default();
    config.record_extension("default", "azureiot/iotz_local_default");
    config.save(&dirs).unwrap();

    let mut workflow = project.workflow(engine);
    workflow.init(&project.path(), &[]).await.unwrap();

    assert_eq!(workflow.engine().built_tags(), vec![image]);
}

#[tokio::test]
async fn test_compile_requires_descriptor() {
    let project = TestProject::new();
    project.create_file("blink.ino", "");
    let mut workflow = project.workflow(RecordingEngine::new());

    let err = workflow.run_verb(&project.path(), Verb::Compile, &[]).await.unwrap_err();

    assert!(matches!(err, IotzError::Project(ProjectError::DescriptorNotFound { .. })));
    assert!(workflow.engine().calls().is_empty());
}

#[tokio::test]
async fn test_compile_reads_legacy_descriptor() {
    let project = TestProject::new();
    project.create_file("iotc.json", r#"{"toolchain": "default"}"#);
    let mut workflow = project.workflow(RecordingEngine::new());

    workflow.run_verb(&project.path(), Verb::Compile, &[]).await.unwrap();
    assert_eq!(workflow.engine().run_scripts(), vec!["make"]);
}

#[tokio::test]
async fn test_clean_twice() {
    let project = project_with("raspberry");
    let image = project_image(&project);
    let mut workflow = project.workflow(RecordingEngine::new());

    for _ in 0..2 {
        let post = workflow.run_verb(&project.path(), Verb::Clean, &[]).await.unwrap();
        assert_eq!(post, Some(PostStep::RemoveProjectImage));
        assert!(!workflow.engine().has_image(&image));
    }

    assert_eq!(workflow.engine().run_scripts(), vec!["rm -rf BUILD/", "rm -rf BUILD/"]);
    // The toolchain image is built once, the project image every time
    assert_eq!(
        workflow.engine().built_tags(),
        vec!["azureiot/iotz_local_raspberry".to_string(), image.clone(), image]
    );
}

#[tokio::test]
async fn test_first_use_records_toolchain() {
    let project = project_with("default");
    let mut workflow = project.workflow(RecordingEngine::new());
    workflow.run_verb(&project.path(), Verb::Compile, &[]).await.unwrap();

    let dockerfile = workflow.engine().dockerfile_for("azureiot/iotz_local_default").unwrap();
    assert!(dockerfile.starts_with(&format!("FROM {BASE_IMAGE}\n")));

    let recorded = UserConfig::load(&project.dirs()).unwrap();
    assert!(recorded.is_installed("default"));

    // A second run with the images present builds nothing
    let engine = RecordingEngine::with_images(&["azureiot/iotz_local_default", &project_image(&project)]);
    let mut workflow = project.workflow(engine);
    workflow.run_verb(&project.path(), Verb::Compile, &[]).await.unwrap();
    assert!(workflow.engine().built_tags().is_empty());
    assert_eq!(workflow.engine().run_scripts(), vec!["make"]);
}

#[tokio::test]
async fn test_recorded_toolchain_without_image_is_rebuilt() {
    let project = project_with("default");
    let mut config = UserConfig::default();
    config.record_extension("default", "azureiot/iotz_local_default");
    config.save(&project.dirs()).unwrap();

    let mut workflow = project.workflow(RecordingEngine::new());
    workflow.run_verb(&project.path(), Verb::Compile, &[]).await.unwrap();

    assert_eq!(
        workflow.engine().built_tags().first().map(String::as_str),
        Some("azureiot/iotz_local_default")
    );
}

#[tokio::test]
async fn test_commit_builds_from_project_image() {
    let project = project_with("default");
    let image = project_image(&project);
    let mut workflow = project.workflow(RecordingEngine::new());

    let script = Script::command(ShellCommand::new("pip").arg("install").arg("pyserial"));
    workflow.commit(&project.path(), "pip", script).await.unwrap();

    let dockerfile = workflow.engine().dockerfile_for(&image).unwrap();
    assert!(dockerfile.starts_with(&format!("FROM {image}\n")));
    assert!(dockerfile.contains("RUN pip install pyserial\n"));
    assert!(workflow.engine().run_scripts().is_empty());
    assert!(!project.file_exists(".iotz.Dockerfile"));
}

#[tokio::test]
async fn test_commit_needs_a_command() {
    let project = project_with("default");
    let mut workflow = project.workflow(RecordingEngine::new());

    let err = workflow.commit(&project.path(), "apt-get", Script::new()).await.unwrap_err();
    assert!(matches!(err, IotzError::Extension(ExtensionError::MissingArguments { .. })));
}

#[tokio::test]
async fn test_arduino_install_records_board_dump() {
    let dump = "--- /tools/arduino-1.8.5/hardware/arduino/avr/boards.txt\n\
                uno.name=Arduino Uno\n\
                zero.name=Arduino Zero\n";
    let project = arduino_project("arduino:avr:uno", "blink.ino");
    let mut workflow = project.workflow(RecordingEngine::new().with_capture_output(dump));

    workflow.run_verb(&project.path(), Verb::Compile, &[]).await.unwrap();

    assert!(workflow
        .engine()
        .calls()
        .iter()
        .any(|c| matches!(c, EngineCall::Capture { image, script } if image == ARDUINO_IMAGE && script.contains("boards.txt"))));
    assert!(project.dirs().board_source_path().exists());

    let boards = workflow.boards(false).unwrap();
    assert_eq!(boards.find_board("zero").unwrap().codename, "arduino:avr:zero");
}

#[tokio::test]
async fn test_builtin_boards_resolve_after_board_dump() {
    let dump = "--- /tools/arduino-1.8.5/hardware/arduino/avr/boards.txt\n\
                uno.name=Arduino Uno\n";
    let project = arduino_project("arduino:avr:uno", "blink.ino");
    let mut workflow = project.workflow(RecordingEngine::new().with_capture_output(dump));
    workflow.run_verb(&project.path(), Verb::Compile, &[]).await.unwrap();
    assert!(project.dirs().board_source_path().exists());

    // AZ3166 is installed per project, so the toolchain dump never lists it
    project.create_file("devkit/devkit.ino", "");
    let devkit = project.path().join("devkit");
    let initialized = workflow
        .init(&devkit, &["arduino".to_string(), "az3166".to_string()])
        .await
        .unwrap();

    assert_eq!(
        initialized.config.target.as_deref(),
        Some("AZ3166:stm32f4:MXCHIP_AZ3166")
    );
    let boards = workflow.boards(false).unwrap();
    assert_eq!(boards.find_board("uno").unwrap().longname, "Arduino Uno");
}

#[tokio::test]
async fn test_external_toolchain_self_call() {
    let project = arduino_project("arduino:avr:uno", "blink.ino");
    let mut workflow = project.workflow(RecordingEngine::new());

    let args = vec!["--install-boards".to_string(), "esp8266:esp8266".to_string()];
    workflow.external(&project.path(), "arduino", &args).await.unwrap();

    assert_eq!(
        workflow.engine().run_scripts(),
        vec!["arduino --install-boards esp8266:esp8266"]
    );
}

#[tokio::test]
async fn test_external_feature_commits() {
    let project = project_with("micro-python");
    let image = project_image(&project);
    let mut workflow = project.workflow(RecordingEngine::new());

    let args = vec!["install".to_string(), "micropython-logging".to_string()];
    workflow.external(&project.path(), "upip", &args).await.unwrap();

    let dockerfile = workflow.engine().dockerfile_for(&image).unwrap();
    assert!(dockerfile.starts_with(&format!("FROM {image}\n")));
    assert!(dockerfile.contains("RUN micropython -m upip install micropython-logging\n"));
}

#[tokio::test]
async fn test_external_unknown_verb() {
    let project = project_with("default");
    let mut workflow = project.workflow(RecordingEngine::new());

    let err = workflow.external(&project.path(), "frobnicate", &[]).await.unwrap_err();
    assert!(matches!(err, IotzError::Extension(ExtensionError::UnknownVerb { .. })));
    assert!(workflow.engine().calls().is_empty());
}

#[tokio::test]
async fn test_export_mbed_patches_makefile() {
    let project = TestProject::new();
    project.create_file("iotz.json", r#"{"toolchain": "mbed", "target": "NUCLEO_L476RG"}"#);
    project.create_file(
        "Makefile",
        "CPP     = 'arm-none-eabi-g++'\nC     = 'arm-none-eabi-gcc'\n",
    );
    let mut workflow = project.workflow(RecordingEngine::new());

    let post = workflow.run_verb(&project.path(), Verb::Export, &[]).await.unwrap();

    assert_eq!(post, Some(PostStep::PatchMbedMakefile));
    assert_eq!(workflow.engine().run_scripts(), vec!["mbed export --ide make_gcc_arm"]);
    let makefile = project.read_file("Makefile");
    assert!(makefile.contains("CPP     = 'arm-none-eabi-g++' '-fdiagnostics-color=always'"));
    assert!(makefile.contains("CC     = 'arm-none-eabi-gcc' '-fdiagnostics-color=always'"));
}

#[tokio::test]
async fn test_export_arduino_unsupported() {
    let project = arduino_project("arduino:avr:uno", "blink.ino");
    let mut workflow = project.workflow(RecordingEngine::new());

    let err = workflow.run_verb(&project.path(), Verb::Export, &[]).await.unwrap_err();
    assert!(matches!(err, IotzError::Extension(ExtensionError::ExportUnsupported { .. })));
}

#[tokio::test]
async fn test_connect_is_interactive() {
    let project = project_with("default");
    let mut workflow = project.workflow(RecordingEngine::new());

    workflow
        .run_raw(&project.path(), "connect", Script::command(ShellCommand::new("bash")), true)
        .await
        .unwrap();

    assert!(workflow
        .engine()
        .calls()
        .iter()
        .any(|c| matches!(c, EngineCall::Run { interactive: true, script, .. } if script == "bash")));
}

#[tokio::test]
async fn test_failed_run_reports_exit_code() {
    let project = project_with("default");
    let mut workflow = project.workflow(RecordingEngine::new().failing_runs(2));

    let err = workflow.run_verb(&project.path(), Verb::Compile, &[]).await.unwrap_err();
    assert!(matches!(
        err,
        IotzError::Container(ContainerError::CommandFailed { code: 2, .. })
    ));
}

#[tokio::test]
async fn test_update_rebuilds_installed_toolchains() {
    let project = project_with("default");
    let mut workflow = project.workflow(RecordingEngine::new());
    workflow.run_verb(&project.path(), Verb::Compile, &[]).await.unwrap();

    let rebuilt = workflow.update(&project.path()).await.unwrap();

    assert_eq!(rebuilt, vec!["default".to_string()]);
    let calls = workflow.engine().calls();
    assert!(calls.contains(&EngineCall::Pull(BASE_IMAGE.to_string())));
    assert!(calls.contains(&EngineCall::RemoveImage(project_image(&project))));
    assert_eq!(
        workflow
            .engine()
            .built_tags()
            .iter()
            .filter(|t| *t == "azureiot/iotz_local_default")
            .count(),
        2
    );
}
