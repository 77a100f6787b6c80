//! Download locations used inside generated container scripts

/// Arduino IDE release archive
pub const ARDUINO_IDE: &str = "https://downloads.arduino.cc/arduino-1.8.5-linux64.tar.xz";

/// Bootloader patch script for MXChip AZ3166 binaries
pub const AZ3166_BOOT_PATCH: &str =
    "https://raw.githubusercontent.com/Azure/iotz/master/extensions/arduino/boot_patch.py";

/// Patched `platform.txt` for the AZ3166 board package
pub const AZ3166_PLATFORM_TWEAK: &str =
    "https://raw.githubusercontent.com/Azure/iotz/master/extensions/arduino/tweaks/az3166/platform.txt";

/// Xtensa ESP32 toolchain archive
pub const ESP32_TOOLCHAIN: &str =
    "https://dl.espressif.com/dl/xtensa-esp32-elf-linux64-1.22.0-59.tar.gz";

/// ESP-IDF sources
pub const ESP_IDF: &str = "https://github.com/espressif/esp-idf.git";

/// ESP-IDF project template used by `iotz create esp32`
pub const ESP_IDF_TEMPLATE: &str = "https://github.com/espressif/esp-idf-template.git";

/// MicroPython sources
pub const MICROPYTHON: &str = "https://github.com/micropython/micropython.git";

/// Docker installation guide
pub const DOCKER_INSTALL: &str = "https://docs.docker.com/install/";
