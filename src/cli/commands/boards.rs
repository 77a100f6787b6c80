//! CLI implementation for `iotz boards`
//!
//! Lists the board registry, or resolves a query the same way `init` and
//! `compile` resolve a target token.

use anyhow::{Context, Result};

use crate::cli::output::print_success;
use crate::error::BoardError;
use crate::infra::dirs::IotzDirs;
use crate::registry::{BoardCache, BoardDescriptor};

/// Execute the boards command
pub fn execute(query: Option<&str>, refresh: bool) -> Result<()> {
    let cache = BoardCache::from_dirs(&IotzDirs::new());
    let registry = cache
        .load(refresh)
        .with_context(|| format!("Failed to load board definitions from {}", cache.source_path().display()))?;

    let Some(query) = query else {
        println!("Boards ({} found):", registry.boards().len());
        println!();
        for board in registry.boards() {
            display_board(board);
        }
        return Ok(());
    };

    if let Some(board) = registry.find_board(query) {
        print_success(&format!("'{query}' resolves to {}", board.codename));
        display_board(board);
        for preference in &board.config {
            println!("    --pref {preference}");
        }
        return Ok(());
    }

    let matches = registry.search(query);
    if matches.is_empty() {
        return Err(BoardError::NotFound {
            name: query.to_string(),
        }
        .into());
    }

    println!("No exact match for '{query}'. Similar boards:");
    println!();
    for board in matches {
        display_board(board);
    }
    Ok(())
}

fn display_board(board: &BoardDescriptor) {
    println!("  {:<24} {:<40} {}", board.name, board.codename, board.longname);
}
