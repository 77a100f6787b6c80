//! Default configuration values

/// Project descriptor file name
pub const DESCRIPTOR_FILE: &str = "iotz.json";

/// Descriptor name used by earlier releases, read when `iotz.json` is absent
pub const LEGACY_DESCRIPTOR_FILE: &str = "iotc.json";

/// Transient Dockerfile written next to the project while an image builds
pub const TRANSIENT_DOCKERFILE: &str = ".iotz.Dockerfile";

/// Mount point of the shared host directory inside every container
pub const CONTAINER_MOUNT_ROOT: &str = "/src";

/// Build output directory, relative to the project
pub const BUILD_DIR: &str = "BUILD";

/// Directory holding mbed dependencies, relative to the project
pub const MBED_DEPS_DIR: &str = "iotz-mbed-deps";

/// Project name used by `create` when none is given
pub const DEFAULT_PROJECT_NAME: &str = "sampleApplication";

/// Version written into a fresh user config
pub const USER_CONFIG_VERSION: u32 = 1;

/// Minimum query length for substring matching against codenames
pub const MIN_SUBSTRING_QUERY: usize = 4;

/// Exit status used when the user interrupts a running container
pub const INTERRUPTED_EXIT_CODE: i32 = 130;
