//! Board-definition dump parser
//!
//! The dump is the concatenation of every `boards.txt` installed in the
//! arduino base image. Each file is preceded by a marker line holding its
//! path, from which the vendor and architecture are recovered:
//!
//! ```text
//! --- /root/.arduino15/packages/AZ3166/hardware/stm32f4/1.3.7/boards.txt
//! MXCHIP_AZ3166.name=MXCHIP AZ3166
//! ```
//!
//! Malformed lines are skipped with a warning; parsing never fails.

use std::sync::OnceLock;

use regex::Regex;

/// Prefix of the line that starts a platform section
pub const SECTION_MARKER: &str = "--- ";

const NAME_ANCHOR: &str = ".name=";

/// A platform section (one `boards.txt`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Platform {
    /// Package vendor (e.g. `arduino`, `AZ3166`)
    pub vendor: String,
    /// Architecture (e.g. `avr`, `stm32f4`)
    pub architecture: String,
}

impl Platform {
    /// `vendor:architecture`
    pub fn label(&self) -> String {
        format!("{}:{}", self.vendor, self.architecture)
    }
}

/// One `<id>.name=` entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedBoard {
    /// Platform the board belongs to
    pub platform: Platform,
    /// Short identifier as written (case preserved)
    pub id: String,
    /// Display name without trailing comment
    pub display_name: String,
    /// Default menu selections as arduino preferences (`custom_<menu>=<id>_<option>`)
    pub config: Vec<String>,
}

/// Recover vendor and architecture from a `boards.txt` path
///
/// Understands both board-manager layouts
/// (`packages/<vendor>/hardware/<arch>/<version>/boards.txt`) and IDE
/// bundled layouts (`hardware/<vendor>/<arch>/boards.txt`).
pub fn platform_from_path(path: &str) -> Option<Platform> {
    let parts: Vec<&str> = path
        .trim()
        .split(['/', '\\'])
        .filter(|p| !p.is_empty())
        .collect();
    let hardware = parts.iter().rposition(|p| *p == "hardware")?;

    let (vendor, architecture) = if hardware >= 2 && parts[hardware - 2] == "packages" {
        (parts[hardware - 1], *parts.get(hardware + 1)?)
    } else {
        (*parts.get(hardware + 1)?, *parts.get(hardware + 2)?)
    };

    if architecture == "boards.txt" {
        return None;
    }

    Some(Platform {
        vendor: vendor.to_string(),
        architecture: architecture.to_string(),
    })
}

fn menu_declaration() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^menu\.([A-Za-z0-9_]+)=").expect("valid regex"))
}

/// Parse a whole dump
pub fn parse_boards(text: &str) -> Vec<ParsedBoard> {
    let mut boards = Vec::new();

    for (header, body) in split_sections(text) {
        let Some(platform) = platform_from_path(header) else {
            tracing::warn!("Skipping board section with unrecognized path '{}'", header.trim());
            continue;
        };
        boards.extend(parse_section(&platform, body));
    }

    boards
}

/// Split the dump at marker lines into `(header, body)` pairs
fn split_sections(text: &str) -> Vec<(&str, &str)> {
    let mut starts: Vec<usize> = Vec::new();
    let mut offset = 0;
    for line in text.split_inclusive('\n') {
        if line.starts_with(SECTION_MARKER) {
            starts.push(offset);
        }
        offset += line.len();
    }

    starts
        .iter()
        .enumerate()
        .map(|(i, &start)| {
            let end = starts.get(i + 1).copied().unwrap_or(text.len());
            let section = &text[start + SECTION_MARKER.len()..end];
            match section.find('\n') {
                Some(nl) => (&section[..nl], &section[nl + 1..]),
                None => (section, ""),
            }
        })
        .collect()
}

/// Byte offset of the start of the line containing `index`
fn line_start(text: &str, index: usize) -> usize {
    text[..index].rfind('\n').map_or(0, |nl| nl + 1)
}

fn line_end(text: &str, index: usize) -> usize {
    text[index..].find('\n').map_or(text.len(), |nl| index + nl)
}

fn parse_section(platform: &Platform, body: &str) -> Vec<ParsedBoard> {
    let menus: Vec<&str> = menu_declaration()
        .captures_iter(body)
        .filter_map(|c| c.get(1).map(|m| m.as_str()))
        .collect();

    // (line start, id, display name) of every usable anchor
    let mut anchors: Vec<(usize, &str, String)> = Vec::new();
    for (index, _) in body.match_indices(NAME_ANCHOR) {
        let start = line_start(body, index);
        let id = &body[start..index];

        if id.trim_start().starts_with('#') || id.contains(['.', '=', ' ', '\t']) {
            continue;
        }
        if id.is_empty() {
            tracing::warn!(
                "Skipping board without identifier in {}: '{}'",
                platform.label(),
                &body[start..line_end(body, index)]
            );
            continue;
        }

        let raw_name = &body[index + NAME_ANCHOR.len()..line_end(body, index)];
        let display_name = raw_name.split('#').next().unwrap_or_default().trim();
        if display_name.is_empty() {
            tracing::warn!("Skipping board '{}' in {}: empty name", id, platform.label());
            continue;
        }

        anchors.push((start, id, display_name.to_string()));
    }

    anchors
        .iter()
        .enumerate()
        .map(|(i, (start, id, display_name))| {
            let end = anchors.get(i + 1).map_or(body.len(), |next| next.0);
            ParsedBoard {
                platform: platform.clone(),
                id: (*id).to_string(),
                display_name: display_name.clone(),
                config: menu_selections(id, &body[*start..end], &menus),
            }
        })
        .collect()
}

/// First option of every menu a board offers, in order of appearance
fn menu_selections(id: &str, block: &str, menus: &[&str]) -> Vec<String> {
    let prefix = format!("{id}.menu.");
    let mut seen: Vec<String> = Vec::new();
    let mut selections = Vec::new();

    for line in block.lines() {
        let Some(rest) = line.strip_prefix(&prefix) else {
            continue;
        };
        let key_part = rest.split('=').next().unwrap_or_default();
        let mut segments = key_part.split('.');
        let (Some(menu), Some(option)) = (segments.next(), segments.next()) else {
            tracing::warn!("Skipping unparseable menu line '{}'", line);
            continue;
        };
        if menu.is_empty() || option.is_empty() || !rest.contains('=') {
            tracing::warn!("Skipping unparseable menu line '{}'", line);
            continue;
        }
        if !menus.contains(&menu) {
            tracing::warn!("Skipping menu line for undeclared menu '{}': '{}'", menu, line);
            continue;
        }
        if seen.iter().any(|m| m == menu) {
            continue;
        }
        seen.push(menu.to_string());
        selections.push(format!("custom_{menu}={id}_{option}"));
    }

    selections
}

#[cfg(test)]
mod tests {
    use super::*;

    const DUMP: &str = "\
--- /tools/arduino-1.8.5/hardware/arduino/avr/boards.txt
menu.cpu=Processor

uno.name=Arduino/Genuino Uno
uno.build.mcu=atmega328p

nano.name=Arduino Nano
nano.menu.cpu.atmega328=ATmega328P
nano.menu.cpu.atmega328.build.mcu=atmega328p
nano.menu.cpu.atmega168=ATmega168
nano.menu.speed=broken
nano.menu.flash.big=Undeclared
--- /root/.arduino15/packages/AZ3166/hardware/stm32f4/1.3.7/boards.txt
MXCHIP_AZ3166.name=MXCHIP AZ3166 # IoT DevKit
.name=No identifier
blank.name=# only a comment
";

    #[test]
    fn test_platform_from_board_manager_path() {
        let platform =
            platform_from_path("/root/.arduino15/packages/esp8266/hardware/esp8266/2.4.1/boards.txt")
                .unwrap();
        assert_eq!(platform.vendor, "esp8266");
        assert_eq!(platform.architecture, "esp8266");
    }

    #[test]
    fn test_platform_from_ide_path() {
        let platform = platform_from_path("/tools/arduino-1.8.5/hardware/arduino/avr/boards.txt").unwrap();
        assert_eq!(platform.label(), "arduino:avr");
    }

    #[test]
    fn test_platform_from_unrelated_path() {
        assert!(platform_from_path("/tmp/boards.txt").is_none());
        assert!(platform_from_path("/tmp/hardware/boards.txt").is_none());
    }

    #[test]
    fn test_parse_extracts_boards_per_section() {
        let boards = parse_boards(DUMP);
        let ids: Vec<&str> = boards.iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, vec!["uno", "nano", "MXCHIP_AZ3166"]);
        assert_eq!(boards[0].platform.label(), "arduino:avr");
        assert_eq!(boards[2].platform.label(), "AZ3166:stm32f4");
    }

    #[test]
    fn test_parse_strips_trailing_comment() {
        let boards = parse_boards(DUMP);
        assert_eq!(boards[2].display_name, "MXCHIP AZ3166");
    }

    #[test]
    fn test_parse_menu_defaults() {
        let boards = parse_boards(DUMP);
        assert!(boards[0].config.is_empty());
        assert_eq!(boards[1].config, vec!["custom_cpu=nano_atmega328"]);
    }

    #[test]
    fn test_parse_without_marker_yields_nothing() {
        assert!(parse_boards("uno.name=Arduino Uno\n").is_empty());
    }

    #[test]
    fn test_unrecognized_section_is_skipped() {
        let dump = "--- /tmp/boards.txt\nuno.name=Uno\n--- /x/hardware/arduino/avr/boards.txt\nmega.name=Mega\n";
        let boards = parse_boards(dump);
        assert_eq!(boards.len(), 1);
        assert_eq!(boards[0].id, "mega");
    }
}
