//! # Storage Layer
//!
//! Two components own everything on disk:
//!
//! - [`decks::DeckStore`]: deck files (one JSON file per deck), card CRUD,
//!   tag indexing, and the session-id registry that insulates callers from
//!   on-disk identifiers.
//! - [`scores::ScoreStore`]: per-card correct/incorrect tallies, kept in a
//!   file *separate* from deck content so decks stay shareable without
//!   personal statistics baked in, and scores survive deck renames.
//!
//! ## Storage Layout
//!
//! ```text
//! <base>/
//! ├── public_flashcards/
//! │   └── Fun Trivia Mix.json
//! ├── private_flashcards/
//! │   └── My Deck.json
//! └── .local/
//!     └── scores.json
//! ```
//!
//! ## Read outcomes
//!
//! Deck reads never hide what went wrong behind a catch-all: [`DeckReadError`]
//! distinguishes a missing file from an unreadable one from a corrupt one,
//! and each call site decides what that means. Listing and aggregate
//! operations skip the offending deck (a corrupt deck degrades gracefully
//! rather than blocking the whole listing); operations that target a specific
//! deck for writing propagate the failure as fatal.
//!
//! ## Durability
//!
//! Every write is write-through and atomic: serialize, write to a
//! uuid-suffixed temp file in the same directory, rename over the target.

use serde::Serialize;
use std::fs;
use std::io;
use std::path::Path;
use thiserror::Error;
use uuid::Uuid;

use crate::error::{CardzError, Result};
use crate::model::DeckFile;

pub mod decks;
pub mod registry;
pub mod scores;

pub use decks::{DeckEntry, DeckStore, TagCount};
pub use scores::ScoreStore;

/// Why a deck file could not be loaded.
#[derive(Debug, Error)]
pub enum DeckReadError {
    #[error("deck file not found")]
    Missing,

    #[error("deck file unreadable: {0}")]
    Unreadable(io::Error),

    #[error("deck file corrupt: {0}")]
    Corrupt(serde_json::Error),
}

/// Load and parse a deck file, classifying every failure.
pub(crate) fn read_deck_file(path: &Path) -> std::result::Result<DeckFile, DeckReadError> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(DeckReadError::Missing),
        Err(e) => return Err(DeckReadError::Unreadable(e)),
    };
    serde_json::from_str(&raw).map_err(DeckReadError::Corrupt)
}

/// Serialize `value` and atomically replace `path` with it.
pub(crate) fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let parent = path
        .parent()
        .ok_or_else(|| CardzError::Store(format!("no parent directory: {}", path.display())))?;
    let content = serde_json::to_string_pretty(value).map_err(CardzError::Serialization)?;

    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("file.json");
    let tmp = parent.join(format!(".{}-{}.tmp", file_name, Uuid::new_v4()));
    fs::write(&tmp, content).map_err(CardzError::Io)?;
    fs::rename(&tmp, path).map_err(CardzError::Io)?;
    Ok(())
}

/// Portable key for a path under `base`: relative, forward slashes only.
///
/// Keys derived this way match across machines and operating systems as long
/// as the base directory travels with its contents.
pub(crate) fn relative_key(base: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(base).unwrap_or(path);
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
