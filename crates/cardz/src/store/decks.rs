//! Deck and card storage.
//!
//! One JSON file per deck, living in either the public (bundled examples) or
//! private (user decks) directory. Callers address cards through opaque
//! session ids brokered by the [`HandleRegistry`]; nothing above this layer
//! sees file paths paired with local ids, which is what lets a study session
//! mix cards from several decks.

use chrono::Utc;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::CardzPaths;
use crate::error::{CardzError, Result};
use crate::model::{
    normalize_tags, sanitize_deck_name, validate_card, CardKind, CardRecord, CardView, DeckFile,
    Scope, SessionId,
};
use crate::store::registry::HandleRegistry;
use crate::store::scores::ScoreStore;
use crate::store::{read_deck_file, write_json, DeckReadError};

/// One row of a deck listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeckEntry {
    pub path: PathBuf,
    pub name: String,
}

/// Usage counts for one tag across all decks. Card-level and deck-level
/// taggings are counted independently.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagCount {
    pub name: String,
    pub card_count: usize,
    pub deck_count: usize,
}

pub struct DeckStore {
    paths: CardzPaths,
    scores: ScoreStore,
    registry: HandleRegistry,
}

impl DeckStore {
    /// Open the store rooted at `paths`, creating the directory layout and
    /// seeding the bundled example deck on first run.
    pub fn open(paths: CardzPaths) -> Result<Self> {
        fs::create_dir_all(paths.scope_dir(Scope::Public))?;
        fs::create_dir_all(paths.scope_dir(Scope::Private))?;
        let scores = ScoreStore::open(&paths)?;

        let store = Self {
            paths,
            scores,
            registry: HandleRegistry::new(),
        };
        store.seed_example_deck()?;
        Ok(store)
    }

    pub fn paths(&self) -> &CardzPaths {
        &self.paths
    }

    pub fn scores(&self) -> &ScoreStore {
        &self.scores
    }

    // --- File helpers ---

    fn load_deck_strict(&self, path: &Path) -> Result<DeckFile> {
        read_deck_file(path).map_err(|e| match e {
            DeckReadError::Missing => CardzError::DeckNotFound(path.to_path_buf()),
            DeckReadError::Unreadable(e) => CardzError::Io(e),
            DeckReadError::Corrupt(e) => CardzError::Serialization(e),
        })
    }

    /// Deck for a write through a handle that may have outlived its target:
    /// `Ok(None)` when the file is gone, fatal on unreadable/corrupt.
    fn load_deck_tolerant(&self, path: &Path) -> Result<Option<DeckFile>> {
        match read_deck_file(path) {
            Ok(deck) => Ok(Some(deck)),
            Err(DeckReadError::Missing) => Ok(None),
            Err(DeckReadError::Unreadable(e)) => Err(CardzError::Io(e)),
            Err(DeckReadError::Corrupt(e)) => Err(CardzError::Serialization(e)),
        }
    }

    fn save_deck(&self, path: &Path, deck: &mut DeckFile) -> Result<()> {
        deck.updated_at = Utc::now();
        write_json(path, deck)
    }

    /// Non-conflicting file path for a new deck named `name`.
    fn new_deck_path(&self, scope: Scope, name: &str) -> PathBuf {
        let dir = self.paths.scope_dir(scope);
        let base = sanitize_deck_name(name);
        let mut path = dir.join(format!("{}.json", base));
        let mut n = 2;
        while path.exists() {
            path = dir.join(format!("{}_{}.json", base, n));
            n += 1;
        }
        path
    }

    // --- Seeding ---

    /// Create the bundled example deck on first run. Idempotent: fires only
    /// when the target file does not exist yet.
    fn seed_example_deck(&self) -> Result<()> {
        let target = self.paths.scope_dir(Scope::Public).join("Fun Trivia Mix.json");
        if target.exists() {
            return Ok(());
        }

        let mc = |id: u64, front: &str, back: &str, wrong: &[&str]| CardRecord {
            id,
            front: front.to_string(),
            back: back.to_string(),
            kind: CardKind::MultipleChoice {
                wrong_choices: wrong.iter().map(|s| s.to_string()).collect(),
            },
            tags: Vec::new(),
        };
        let free = |id: u64, front: &str, back: &str| CardRecord {
            id,
            front: front.to_string(),
            back: back.to_string(),
            kind: CardKind::Free,
            tags: Vec::new(),
        };

        let mut deck = DeckFile::new("Fun Trivia Mix");
        deck.cards = vec![
            mc(
                1,
                "Which planet is closest to the Sun?",
                "Mercury",
                &["Venus", "Earth", "Mars"],
            ),
            mc(
                2,
                "What is the largest ocean on Earth?",
                "Pacific Ocean",
                &["Atlantic Ocean", "Indian Ocean", "Arctic Ocean"],
            ),
            mc(3, "How many sides does a pentagon have?", "5", &["4", "6", "8"]),
            mc(
                4,
                "What is the most spoken language in the world by native speakers?",
                "Mandarin Chinese",
                &["English", "Spanish", "Hindi"],
            ),
            mc(5, "What is 15% of 200?", "30", &["25", "35", "45"]),
            free(6, "What year did World War II end?", "1945"),
            free(
                7,
                "What gas do plants absorb during photosynthesis?",
                "Carbon dioxide (CO2)",
            ),
            free(8, "What is the square root of 64?", "8"),
        ];
        deck.next_id = 9;
        write_json(&target, &deck)
    }

    // --- Deck CRUD ---

    /// Decks in one partition, sorted case-insensitively by display name.
    /// Files that cannot be read or parsed are skipped, not fatal.
    pub fn list_decks(&self, scope: Scope) -> Result<Vec<DeckEntry>> {
        let dir = self.paths.scope_dir(scope);
        if !dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut entries = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let path = entry?.path();
            if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match read_deck_file(&path) {
                Ok(deck) => entries.push(DeckEntry {
                    path,
                    name: deck.name,
                }),
                Err(e) => {
                    log::warn!("skipping deck {}: {}", path.display(), e);
                }
            }
        }
        entries.sort_by_key(|e| e.name.to_lowercase());
        Ok(entries)
    }

    pub fn create_deck(&mut self, name: &str, scope: Scope) -> Result<PathBuf> {
        let name = name.trim();
        if name.is_empty() {
            return Err(CardzError::Validation("Deck name cannot be empty.".to_string()));
        }
        let path = self.new_deck_path(scope, name);
        let mut deck = DeckFile::new(name);
        self.save_deck(&path, &mut deck)?;
        Ok(path)
    }

    /// Update the display name only. The file path (and with it every session
    /// id and score key) is unaffected.
    pub fn rename_deck(&mut self, path: &Path, new_name: &str) -> Result<()> {
        let new_name = new_name.trim();
        if new_name.is_empty() {
            return Err(CardzError::Validation("Name cannot be empty.".to_string()));
        }
        let mut deck = self.load_deck_strict(path)?;
        deck.name = new_name.to_string();
        self.save_deck(path, &mut deck)
    }

    /// Remove the deck file and purge every session-id registration pointing
    /// into it, both directions.
    pub fn delete_deck(&mut self, path: &Path) -> Result<()> {
        if path.exists() {
            fs::remove_file(path)?;
        }
        self.registry.release_deck(path);
        Ok(())
    }

    pub fn card_count(&self, path: &Path) -> usize {
        read_deck_file(path).map(|d| d.cards.len()).unwrap_or(0)
    }

    pub fn get_deck_tags(&self, path: &Path) -> Vec<String> {
        read_deck_file(path).map(|d| d.tags).unwrap_or_default()
    }

    pub fn set_deck_tags(&mut self, path: &Path, tags: &[String]) -> Result<()> {
        let mut deck = self.load_deck_strict(path)?;
        deck.tags = normalize_tags(tags);
        self.save_deck(path, &mut deck)
    }

    // --- Card CRUD ---

    fn card_view(&mut self, deck_path: &Path, card: &CardRecord) -> CardView {
        let id = self.registry.handle_for(deck_path, card.id);
        let (correct, incorrect) = self.scores.get(deck_path, card.id);
        CardView {
            id,
            front: card.front.clone(),
            back: card.back.clone(),
            kind: card.kind.clone(),
            tags: card.tags.clone(),
            correct,
            incorrect,
        }
    }

    /// Every card in a deck, with session ids resolved and scores attached.
    pub fn get_cards(&mut self, path: &Path) -> Result<Vec<CardView>> {
        let deck = self.load_deck_strict(path)?;
        Ok(deck.cards.iter().map(|c| self.card_view(path, c)).collect())
    }

    /// Create a card and return its session id directly, so the caller needs
    /// no extra round trip to learn the new identifier.
    pub fn create_card(
        &mut self,
        path: &Path,
        front: &str,
        back: &str,
        kind: CardKind,
    ) -> Result<SessionId> {
        let front = front.trim();
        let back = back.trim();
        validate_card(front, back, &kind)?;

        let mut deck = self.load_deck_strict(path)?;
        let local_id = deck.next_id;
        deck.cards.push(CardRecord {
            id: local_id,
            front: front.to_string(),
            back: back.to_string(),
            kind,
            tags: Vec::new(),
        });
        deck.next_id = local_id + 1;
        self.save_deck(path, &mut deck)?;
        Ok(self.registry.handle_for(path, local_id))
    }

    /// Update a card's content. A stale session id, a vanished deck, or a
    /// vanished card silently no-ops; the handle may outlive a concurrent
    /// deletion.
    pub fn update_card(
        &mut self,
        sid: SessionId,
        front: &str,
        back: &str,
        kind: CardKind,
    ) -> Result<()> {
        let front = front.trim();
        let back = back.trim();
        validate_card(front, back, &kind)?;

        let Some((deck_path, local_id)) = self.resolve_owned(sid) else {
            return Ok(());
        };
        let Some(mut deck) = self.load_deck_tolerant(&deck_path)? else {
            return Ok(());
        };
        let Some(card) = deck.find_card_mut(local_id) else {
            return Ok(());
        };
        card.front = front.to_string();
        card.back = back.to_string();
        card.kind = kind;
        self.save_deck(&deck_path, &mut deck)
    }

    /// A single card by session id; absent (never an error) for stale ids,
    /// unreadable decks, or vanished cards.
    pub fn get_card(&mut self, sid: SessionId) -> Option<CardView> {
        let (deck_path, local_id) = self.resolve_owned(sid)?;
        let deck = read_deck_file(&deck_path).ok()?;
        let card = deck.find_card(local_id)?.clone();
        Some(self.card_view(&deck_path, &card))
    }

    /// Remove a card from its deck and deregister its session id both ways.
    pub fn delete_card(&mut self, sid: SessionId) -> Result<()> {
        let Some((deck_path, local_id)) = self.resolve_owned(sid) else {
            return Ok(());
        };
        if let Some(mut deck) = self.load_deck_tolerant(&deck_path)? {
            deck.cards.retain(|c| c.id != local_id);
            self.save_deck(&deck_path, &mut deck)?;
        }
        self.registry.release(sid);
        Ok(())
    }

    // --- Scores ---

    pub fn record_correct(&mut self, sid: SessionId) -> Result<()> {
        let Some((deck_path, local_id)) = self.resolve_owned(sid) else {
            return Ok(());
        };
        self.scores.record_correct(&deck_path, local_id)
    }

    pub fn record_incorrect(&mut self, sid: SessionId) -> Result<()> {
        let Some((deck_path, local_id)) = self.resolve_owned(sid) else {
            return Ok(());
        };
        self.scores.record_incorrect(&deck_path, local_id)
    }

    // --- Card tags ---

    pub fn get_card_tags(&self, sid: SessionId) -> Vec<String> {
        let Some((deck_path, local_id)) = self.registry.resolve(sid) else {
            return Vec::new();
        };
        read_deck_file(deck_path)
            .ok()
            .and_then(|deck| deck.find_card(local_id).map(|c| c.tags.clone()))
            .unwrap_or_default()
    }

    pub fn set_card_tags(&mut self, sid: SessionId, tags: &[String]) -> Result<()> {
        let Some((deck_path, local_id)) = self.resolve_owned(sid) else {
            return Ok(());
        };
        let Some(mut deck) = self.load_deck_tolerant(&deck_path)? else {
            return Ok(());
        };
        let Some(card) = deck.find_card_mut(local_id) else {
            return Ok(());
        };
        card.tags = normalize_tags(tags);
        self.save_deck(&deck_path, &mut deck)
    }

    // --- Tag queries across all decks ---

    fn all_deck_paths(&self) -> Vec<PathBuf> {
        let mut paths = Vec::new();
        for scope in [Scope::Public, Scope::Private] {
            if let Ok(entries) = self.list_decks(scope) {
                paths.extend(entries.into_iter().map(|e| e.path));
            }
        }
        paths
    }

    /// Cards whose own card-level tags include `tag`.
    pub fn cards_by_tag(&mut self, tag: &str) -> Vec<CardView> {
        let mut result = Vec::new();
        for deck_path in self.all_deck_paths() {
            let Ok(deck) = read_deck_file(&deck_path) else {
                continue;
            };
            for card in &deck.cards {
                if card.tags.iter().any(|t| t == tag) {
                    result.push(self.card_view(&deck_path, card));
                }
            }
        }
        result
    }

    /// All cards of every deck whose deck-level tags include `tag`.
    pub fn cards_by_deck_tag(&mut self, tag: &str) -> Vec<CardView> {
        let mut result = Vec::new();
        for deck_path in self.all_deck_paths() {
            let Ok(deck) = read_deck_file(&deck_path) else {
                continue;
            };
            if deck.tags.iter().any(|t| t == tag) {
                for card in &deck.cards {
                    result.push(self.card_view(&deck_path, card));
                }
            }
        }
        result
    }

    /// Every known tag with independent card and deck usage counts, sorted by
    /// tag name.
    pub fn all_tags_with_counts(&self) -> Vec<TagCount> {
        use std::collections::BTreeMap;

        let mut counts: BTreeMap<String, (usize, usize)> = BTreeMap::new();
        for deck_path in self.all_deck_paths() {
            let Ok(deck) = read_deck_file(&deck_path) else {
                continue;
            };
            for tag in &deck.tags {
                counts.entry(tag.clone()).or_default().1 += 1;
            }
            for card in &deck.cards {
                for tag in &card.tags {
                    counts.entry(tag.clone()).or_default().0 += 1;
                }
            }
        }
        counts
            .into_iter()
            .map(|(name, (card_count, deck_count))| TagCount {
                name,
                card_count,
                deck_count,
            })
            .collect()
    }

    fn resolve_owned(&self, sid: SessionId) -> Option<(PathBuf, u64)> {
        self.registry
            .resolve(sid)
            .map(|(deck, local_id)| (deck.to_path_buf(), local_id))
    }
}
