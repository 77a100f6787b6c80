//! Dockerfile generation
//!
//! Three image layers exist: the shared base image, one image per toolchain
//! layered on it, and one image per project directory layered on its
//! toolchain image. Package-install verbs add further layers on top of the
//! project image under the same tag.

use crate::config::defaults::CONTAINER_MOUNT_ROOT;
use crate::config::images::{toolchain_image, BASE_IMAGE};
use crate::core::shell::Script;

/// Dockerfile of a toolchain base image
pub fn toolchain_dockerfile(toolchain: &str, fragment: &str) -> String {
    format!(
        "FROM {BASE_IMAGE}\n\n\
         WORKDIR {CONTAINER_MOUNT_ROOT}\n\n\
         RUN echo \"Setting up {image}\"\n\
         {fragment}\n",
        image = toolchain_image(toolchain),
        fragment = fragment.trim(),
    )
}

/// Dockerfile of a per-project image
///
/// `setup` is the toolchain's container-init script; it may be empty.
pub fn project_dockerfile(toolchain: &str, project_image: &str, workdir: &str, setup: &Script) -> String {
    let mut run = format!("RUN echo \"Setting up {project_image}\"");
    if !setup.is_empty() {
        run.push_str(" && ");
        run.push_str(&setup.render());
    }
    format!(
        "FROM {base}\n\n\
         WORKDIR {workdir}\n\n\
         {run}\n",
        base = toolchain_image(toolchain),
    )
}

/// Dockerfile adding a layer to an existing project image
pub fn commit_dockerfile(project_image: &str, workdir: &str, script: &Script) -> String {
    format!(
        "FROM {project_image}\n\n\
         WORKDIR {workdir}\n\n\
         RUN {}\n",
        script.render()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::shell::ShellCommand;

    #[test]
    fn test_toolchain_dockerfile() {
        let dockerfile = toolchain_dockerfile("raspberry", "  RUN apt-get install -y gdb-multiarch\n");
        assert!(dockerfile.starts_with("FROM azureiot/iotz:latest\n"));
        assert!(dockerfile.contains("WORKDIR /src\n"));
        assert!(dockerfile.contains("Setting up azureiot/iotz_local_raspberry"));
        assert!(dockerfile.contains("\nRUN apt-get install -y gdb-multiarch\n"));
    }

    #[test]
    fn test_project_dockerfile_without_setup() {
        let dockerfile = project_dockerfile("mbed", "aiot_iotz_42", "/src/app", &Script::new());
        assert!(dockerfile.starts_with("FROM azureiot/iotz_local_mbed\n"));
        assert!(dockerfile.contains("WORKDIR /src/app\n"));
        assert!(dockerfile.ends_with("RUN echo \"Setting up aiot_iotz_42\"\n"));
    }

    #[test]
    fn test_project_dockerfile_chains_setup() {
        let setup = Script::command(ShellCommand::new("arduino").arg("--install-boards").arg("arduino:avr"));
        let dockerfile = project_dockerfile("arduino", "aiot_iotz_42", "/src/app", &setup);
        assert!(dockerfile.contains(
            "RUN echo \"Setting up aiot_iotz_42\" && arduino --install-boards arduino:avr\n"
        ));
    }

    #[test]
    fn test_commit_dockerfile_layers_on_project_image() {
        let script = Script::raw("pip install requests");
        let dockerfile = commit_dockerfile("aiot_iotz_42", "/src/app", &script);
        assert!(dockerfile.starts_with("FROM aiot_iotz_42\n"));
        assert!(dockerfile.ends_with("RUN pip install requests\n"));
    }
}
