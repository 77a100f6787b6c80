//! Built-in toolchain extensions

mod arduino;
mod esp32;
mod generic;
mod mbed;
mod micropython;
mod raspberry;

use std::path::{Path, PathBuf};

pub use arduino::Arduino;
pub use esp32::Esp32;
pub use generic::Generic;
pub use mbed::Mbed;
pub use micropython::MicroPython;
pub use raspberry::Raspberry;

use crate::config::defaults::DEFAULT_PROJECT_NAME;
use crate::core::extension::Extension;
use crate::core::project::ProjectConfig;
use crate::error::Result;
use crate::infra::filesystem;

/// Every toolchain shipped with iotz
pub fn all() -> Vec<Box<dyn Extension>> {
    vec![
        Box::new(Arduino),
        Box::new(Mbed),
        Box::new(Esp32),
        Box::new(Raspberry),
        Box::new(MicroPython),
        Box::new(Generic),
    ]
}

/// Directory and name of a project about to be created
///
/// With a name the project goes into `<parent>/<name>`; without one it is
/// created in `parent` itself under the default name.
pub(crate) fn project_location(parent: &Path, name: Option<&str>) -> Result<(PathBuf, String)> {
    match name.filter(|n| !n.is_empty()) {
        Some(name) => {
            let dir = parent.join(name);
            filesystem::create_dir_all(&dir)?;
            Ok((dir, name.to_string()))
        }
        None => Ok((parent.to_path_buf(), DEFAULT_PROJECT_NAME.to_string())),
    }
}

/// Scaffold a hello-world C++ project built with make
pub(crate) fn create_make_project(parent: &Path, args: &[String], toolchain: &str, compiler: &str) -> Result<PathBuf> {
    let (dir, name) = project_location(parent, args.first().map(String::as_str))?;

    let source = format!(
        "// iotz\n\
         // {name}.cpp\n\n\
         #include <stdio.h>\n\n\
         int main()\n\
         {{\n\
         \x20 printf(\"hello world!\\r\\n\");\n\
         \x20 return 0;\n\
         }}\n"
    );
    let makefile = format!(
        "# iotz - {name} makefile\n\n\
         CXX_COMPILER = {compiler}\n\n\
         C_FLAGS = -Os\n\n\
         {name}.o: {name}.cpp\n\
         \t$(CXX_COMPILER) $(C_FLAGS) {name}.cpp -o {name}.o && echo '{name}.o is ready'\n\n\
         clean:\n\
         \trm -f {name}.o\n"
    );

    filesystem::write_file(&dir.join(format!("{name}.cpp")), &source)?;
    filesystem::write_file(&dir.join("Makefile"), &makefile)?;
    ProjectConfig {
        name: Some(name),
        ..ProjectConfig::with_toolchain(toolchain)
    }
    .save(&dir)?;

    Ok(dir)
}
