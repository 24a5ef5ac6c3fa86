//! # Directory layout
//!
//! Every path the storage layer touches is derived from a single base
//! directory, carried by [`CardzPaths`]:
//!
//! ```text
//! <base>/
//! ├── public_flashcards/    # bundled example decks
//! ├── private_flashcards/   # user decks
//! └── .local/
//!     └── scores.json       # per-card tallies, separate from deck content
//! ```
//!
//! Nothing reads a global or ambient path: production code builds a
//! `CardzPaths` once (usually via [`CardzPaths::default_paths`]) and hands it
//! to [`crate::store::DeckStore`]; tests point the whole stack at a temporary
//! directory instead.
//!
//! Deck files live directly under their scope directory and are addressed by
//! their full path. Score keys use the path *relative to base* with forward
//! slashes, so the base directory can be moved across machines (or operating
//! systems) without orphaning recorded scores.

use crate::model::Scope;
use directories::ProjectDirs;
use std::path::{Path, PathBuf};

pub const PUBLIC_DIR: &str = "public_flashcards";
pub const PRIVATE_DIR: &str = "private_flashcards";
pub const LOCAL_DIR: &str = ".local";
pub const SCORES_FILE: &str = "scores.json";

/// Resolved directory layout for one storage instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardzPaths {
    base: PathBuf,
}

impl CardzPaths {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    /// OS-appropriate production base directory (e.g. `~/.local/share/cardz`
    /// on Linux). Returns `None` when no home directory can be determined.
    pub fn default_paths() -> Option<Self> {
        ProjectDirs::from("", "", "cardz").map(|dirs| Self::new(dirs.data_dir()))
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    pub fn scope_dir(&self, scope: Scope) -> PathBuf {
        match scope {
            Scope::Public => self.base.join(PUBLIC_DIR),
            Scope::Private => self.base.join(PRIVATE_DIR),
        }
    }

    pub fn local_dir(&self) -> PathBuf {
        self.base.join(LOCAL_DIR)
    }

    pub fn scores_path(&self) -> PathBuf {
        self.local_dir().join(SCORES_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_dirs_under_base() {
        let paths = CardzPaths::new("/tmp/cardz-test");
        assert_eq!(
            paths.scope_dir(Scope::Public),
            PathBuf::from("/tmp/cardz-test/public_flashcards")
        );
        assert_eq!(
            paths.scope_dir(Scope::Private),
            PathBuf::from("/tmp/cardz-test/private_flashcards")
        );
    }

    #[test]
    fn test_scores_path_in_local_dir() {
        let paths = CardzPaths::new("/tmp/cardz-test");
        assert_eq!(
            paths.scores_path(),
            PathBuf::from("/tmp/cardz-test/.local/scores.json")
        );
    }
}
