//! Arduino board registry
//!
//! Turns board-definition dumps into a lookup table keyed by short board
//! name, and resolves user-supplied board tokens to full codenames.

pub mod cache;
pub mod parser;

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::defaults::MIN_SUBSTRING_QUERY;
use crate::error::BoardError;

pub use cache::BoardCache;

/// Board text shipped with iotz, used until the arduino toolchain image has
/// produced a real dump.
const BUILTIN_BOARDS: &str = include_str!("builtin_boards.txt");

/// `vendor:architecture:board`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Codename {
    pub vendor: String,
    pub architecture: String,
    pub board: String,
}

impl Codename {
    /// `vendor:architecture`, the unit `arduino --install-boards` accepts
    pub fn family(&self) -> String {
        format!("{}:{}", self.vendor, self.architecture)
    }
}

impl FromStr for Codename {
    type Err = BoardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(':').collect();
        match parts.as_slice() {
            [vendor, architecture, board]
                if !vendor.is_empty() && !architecture.is_empty() && !board.is_empty() =>
            {
                Ok(Self {
                    vendor: (*vendor).to_string(),
                    architecture: (*architecture).to_string(),
                    board: (*board).to_string(),
                })
            }
            _ => Err(BoardError::MalformedCodename {
                codename: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for Codename {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.vendor, self.architecture, self.board)
    }
}

/// A resolvable board
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardDescriptor {
    /// Lookup key (lowercase)
    pub name: String,
    /// Human-readable name
    pub longname: String,
    /// Full `vendor:architecture:board` identifier
    pub codename: String,
    /// Arduino preferences selecting the default menu options
    #[serde(default)]
    pub config: Vec<String>,
}

/// Lookup table of boards
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardRegistry {
    boards: Vec<BoardDescriptor>,
}

impl BoardRegistry {
    /// Build a registry from a board-definition dump
    ///
    /// Short names are unique. When two platforms define the same board id,
    /// the later one is keyed as `"<vendor>:<arch> <id>"`; anything beyond
    /// that is dropped with a warning.
    pub fn from_text(text: &str) -> Self {
        let mut boards: Vec<BoardDescriptor> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();

        for parsed in parser::parse_boards(text) {
            let mut key = parsed.id.to_lowercase();
            if index.contains_key(&key) {
                key = format!("{} {}", parsed.platform.label(), parsed.id).to_lowercase();
                if index.contains_key(&key) {
                    tracing::warn!(
                        "Skipping duplicate board '{}' from {}",
                        parsed.id,
                        parsed.platform.label()
                    );
                    continue;
                }
            }

            index.insert(key.clone(), boards.len());
            boards.push(BoardDescriptor {
                name: key,
                longname: parsed.display_name,
                codename: format!("{}:{}", parsed.platform.label(), parsed.id),
                config: parsed.config,
            });
        }

        Self { boards }
    }

    /// Registry of the boards bundled with iotz
    pub fn builtin() -> Self {
        Self::from_text(BUILTIN_BOARDS)
    }

    /// Add every board of `base` whose codename this registry lacks
    ///
    /// Boards already present keep precedence. An added board whose short
    /// name is taken is keyed as `"<vendor>:<arch> <id>"`, or dropped when
    /// that key is taken as well.
    #[must_use]
    pub fn layered_over(mut self, base: &BoardRegistry) -> Self {
        for board in &base.boards {
            let known = self
                .boards
                .iter()
                .any(|b| b.codename.eq_ignore_ascii_case(&board.codename));
            if known {
                continue;
            }

            let mut name = board.name.clone();
            if self.boards.iter().any(|b| b.name == name) {
                let Ok(codename) = board.codename.parse::<Codename>() else {
                    continue;
                };
                name = format!("{} {}", codename.family(), codename.board).to_lowercase();
                if self.boards.iter().any(|b| b.name == name) {
                    tracing::debug!("Skipping builtin board '{}', name already taken", board.codename);
                    continue;
                }
            }

            self.boards.push(BoardDescriptor {
                name,
                ..board.clone()
            });
        }
        self
    }

    /// All boards, in definition order
    pub fn boards(&self) -> &[BoardDescriptor] {
        &self.boards
    }

    pub fn is_empty(&self) -> bool {
        self.boards.is_empty()
    }

    /// Resolve a board token
    ///
    /// Tried in order: exact short name (case-insensitive), exact codename,
    /// case-insensitive substring of a codename (queries of at least four
    /// characters), exact long name.
    pub fn find_board(&self, query: &str) -> Option<&BoardDescriptor> {
        let lowered = query.to_lowercase();

        self.boards
            .iter()
            .find(|b| b.name == lowered)
            .or_else(|| self.boards.iter().find(|b| b.codename == query))
            .or_else(|| {
                if query.chars().count() < MIN_SUBSTRING_QUERY {
                    return None;
                }
                self.boards
                    .iter()
                    .find(|b| b.codename.to_lowercase().contains(&lowered))
            })
            .or_else(|| self.boards.iter().find(|b| b.longname == query))
    }

    /// Boards whose name, codename or long name contain `filter`
    pub fn search(&self, filter: &str) -> Vec<&BoardDescriptor> {
        let filter = filter.to_lowercase();
        self.boards
            .iter()
            .filter(|b| {
                b.name.contains(&filter)
                    || b.codename.to_lowercase().contains(&filter)
                    || b.longname.to_lowercase().contains(&filter)
            })
            .collect()
    }
}
