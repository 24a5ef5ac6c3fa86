//! Score persistence, separate from deck content.
//!
//! Tallies live in `.local/scores.json`, keyed by the deck's base-relative
//! forward-slash path and the card's local id:
//!
//! ```json
//! {
//!   "private_flashcards/Geo.json": {
//!     "1": [3, 1]
//!   }
//! }
//! ```
//!
//! Keeping scores out of the deck files means decks can be shared or edited
//! without personal statistics baked in, and recorded scores survive deck
//! renames as long as the relative path is preserved.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::CardzPaths;
use crate::error::Result;
use crate::store::{relative_key, write_json};

type ScoreMap = HashMap<String, HashMap<String, (u64, u64)>>;

pub struct ScoreStore {
    base: PathBuf,
    path: PathBuf,
    data: ScoreMap,
}

impl ScoreStore {
    /// Open (or initialize) the score file under `paths`.
    ///
    /// A missing or unparsable file starts the store empty; prior scores are
    /// lost but the application stays usable. Only directory creation can
    /// fail here.
    pub fn open(paths: &CardzPaths) -> Result<Self> {
        fs::create_dir_all(paths.local_dir())?;
        let path = paths.scores_path();

        let data = match fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str(&raw) {
                Ok(data) => data,
                Err(e) => {
                    log::warn!("score file {} is corrupt, starting empty: {}", path.display(), e);
                    ScoreMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => ScoreMap::new(),
            Err(e) => {
                log::warn!("score file {} is unreadable, starting empty: {}", path.display(), e);
                ScoreMap::new()
            }
        };

        Ok(Self {
            base: paths.base().to_path_buf(),
            path,
            data,
        })
    }

    /// `(correct, incorrect)` for one card; `(0, 0)` if never recorded.
    pub fn get(&self, deck: &Path, local_id: u64) -> (u64, u64) {
        self.data
            .get(&relative_key(&self.base, deck))
            .and_then(|cards| cards.get(&local_id.to_string()))
            .copied()
            .unwrap_or((0, 0))
    }

    /// Increment the correct counter and persist before returning.
    pub fn record_correct(&mut self, deck: &Path, local_id: u64) -> Result<()> {
        self.entry(deck, local_id).0 += 1;
        self.flush()
    }

    /// Increment the incorrect counter and persist before returning.
    pub fn record_incorrect(&mut self, deck: &Path, local_id: u64) -> Result<()> {
        self.entry(deck, local_id).1 += 1;
        self.flush()
    }

    fn entry(&mut self, deck: &Path, local_id: u64) -> &mut (u64, u64) {
        self.data
            .entry(relative_key(&self.base, deck))
            .or_default()
            .entry(local_id.to_string())
            .or_default()
    }

    fn flush(&self) -> Result<()> {
        write_json(&self.path, &self.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup() -> (TempDir, CardzPaths) {
        let dir = TempDir::new().unwrap();
        let paths = CardzPaths::new(dir.path());
        (dir, paths)
    }

    #[test]
    fn test_unrecorded_card_is_zero_zero() {
        let (_dir, paths) = setup();
        let store = ScoreStore::open(&paths).unwrap();
        let deck = paths.base().join("private_flashcards/Geo.json");
        assert_eq!(store.get(&deck, 1), (0, 0));
    }

    #[test]
    fn test_interleaved_tallies_are_exact() {
        let (_dir, paths) = setup();
        let mut store = ScoreStore::open(&paths).unwrap();
        let deck = paths.base().join("private_flashcards/Geo.json");

        store.record_correct(&deck, 1).unwrap();
        store.record_incorrect(&deck, 1).unwrap();
        store.record_correct(&deck, 1).unwrap();
        store.record_correct(&deck, 1).unwrap();
        store.record_incorrect(&deck, 1).unwrap();

        assert_eq!(store.get(&deck, 1), (3, 2));
        // A neighbouring card is untouched.
        assert_eq!(store.get(&deck, 2), (0, 0));
    }

    #[test]
    fn test_scores_survive_reopen() {
        let (_dir, paths) = setup();
        let deck = paths.base().join("private_flashcards/Geo.json");
        {
            let mut store = ScoreStore::open(&paths).unwrap();
            store.record_correct(&deck, 3).unwrap();
        }
        let store = ScoreStore::open(&paths).unwrap();
        assert_eq!(store.get(&deck, 3), (1, 0));
    }

    #[test]
    fn test_keys_are_relative_forward_slash_paths() {
        let (_dir, paths) = setup();
        let deck = paths.base().join("private_flashcards").join("Geo.json");
        {
            let mut store = ScoreStore::open(&paths).unwrap();
            store.record_correct(&deck, 1).unwrap();
        }
        let raw = fs::read_to_string(paths.scores_path()).unwrap();
        assert!(raw.contains("private_flashcards/Geo.json"));
        assert!(!raw.contains(paths.base().to_str().unwrap()));
    }

    #[test]
    fn test_corrupt_file_starts_empty() {
        let (_dir, paths) = setup();
        fs::create_dir_all(paths.local_dir()).unwrap();
        fs::write(paths.scores_path(), "{ nonsense").unwrap();

        let store = ScoreStore::open(&paths).unwrap();
        let deck = paths.base().join("private_flashcards/Geo.json");
        assert_eq!(store.get(&deck, 1), (0, 0));
    }
}
