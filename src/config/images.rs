//! Container image naming

/// Shared image every toolchain base image is layered on
pub const BASE_IMAGE: &str = "azureiot/iotz:latest";

/// Prefix of per-toolchain base images (`azureiot/iotz_local_<toolchain>`)
pub const TOOLCHAIN_IMAGE_PREFIX: &str = "azureiot/iotz_local_";

/// Prefix of per-project images (`aiot_iotz_<identity>`)
pub const PROJECT_IMAGE_PREFIX: &str = "aiot_iotz_";

/// Name of the base image for a toolchain
pub fn toolchain_image(toolchain: &str) -> String {
    format!("{TOOLCHAIN_IMAGE_PREFIX}{toolchain}")
}
