//! # API Facade
//!
//! [`Cardz`] is the single entry point for a presentation layer: it owns the
//! deck store and the one active study session, and exposes the stable method
//! surface the UI calls. It returns plain data (snapshots, views, counts)
//! and never renders anything.
//!
//! Responsibilities kept here rather than in the layers below:
//!
//! - Session lifecycle: at most one [`StudySession`] exists at a time, built
//!   from a whole deck or from a tag selection.
//! - Study-list assembly for tag study: card-level and deck-level matches are
//!   combined and de-duplicated by session id, so a card matched through
//!   several selected tags appears once.
//! - Session passthroughs that pair the session with the store for scoring.
//!
//! Session calls without an active session return the same soft `None`
//! sentinel the session uses for not-applicable transitions.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::config::CardzPaths;
use crate::error::{CardzError, Result};
use crate::model::{CardKind, CardView, Scope, SessionId};
use crate::session::{ChoiceOutcome, OrderMode, StudySession, StudyState};
use crate::store::{DeckStore, TagCount};

/// One deck row for a home-screen listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeckInfo {
    pub path: PathBuf,
    pub name: String,
    pub card_count: usize,
    pub tags: Vec<String>,
}

/// Both deck partitions, ready to render.
#[derive(Debug, Clone, Default)]
pub struct DeckOverview {
    pub public: Vec<DeckInfo>,
    pub private: Vec<DeckInfo>,
}

pub struct Cardz {
    store: DeckStore,
    session: Option<StudySession>,
}

impl Cardz {
    pub fn open(paths: CardzPaths) -> Result<Self> {
        Ok(Self {
            store: DeckStore::open(paths)?,
            session: None,
        })
    }

    pub fn store(&self) -> &DeckStore {
        &self.store
    }

    // --- Decks ---

    pub fn deck_overview(&self) -> Result<DeckOverview> {
        let info = |scope: Scope| -> Result<Vec<DeckInfo>> {
            Ok(self
                .store
                .list_decks(scope)?
                .into_iter()
                .map(|entry| DeckInfo {
                    card_count: self.store.card_count(&entry.path),
                    tags: self.store.get_deck_tags(&entry.path),
                    path: entry.path,
                    name: entry.name,
                })
                .collect())
        };
        Ok(DeckOverview {
            public: info(Scope::Public)?,
            private: info(Scope::Private)?,
        })
    }

    /// Create a new user deck.
    pub fn create_deck(&mut self, name: &str) -> Result<PathBuf> {
        self.store.create_deck(name, Scope::Private)
    }

    pub fn rename_deck(&mut self, path: &Path, new_name: &str) -> Result<()> {
        self.store.rename_deck(path, new_name)
    }

    pub fn delete_deck(&mut self, path: &Path) -> Result<()> {
        self.store.delete_deck(path)
    }

    pub fn deck_tags(&self, path: &Path) -> Vec<String> {
        self.store.get_deck_tags(path)
    }

    pub fn set_deck_tags(&mut self, path: &Path, tags: &[String]) -> Result<()> {
        self.store.set_deck_tags(path, tags)
    }

    // --- Cards ---

    pub fn deck_cards(&mut self, path: &Path) -> Result<Vec<CardView>> {
        self.store.get_cards(path)
    }

    pub fn create_card(
        &mut self,
        deck: &Path,
        front: &str,
        back: &str,
        kind: CardKind,
    ) -> Result<SessionId> {
        self.store.create_card(deck, front, back, kind)
    }

    pub fn update_card(
        &mut self,
        card: SessionId,
        front: &str,
        back: &str,
        kind: CardKind,
    ) -> Result<()> {
        self.store.update_card(card, front, back, kind)
    }

    pub fn get_card(&mut self, card: SessionId) -> Option<CardView> {
        self.store.get_card(card)
    }

    pub fn delete_card(&mut self, card: SessionId) -> Result<()> {
        self.store.delete_card(card)
    }

    pub fn card_tags(&self, card: SessionId) -> Vec<String> {
        self.store.get_card_tags(card)
    }

    pub fn set_card_tags(&mut self, card: SessionId, tags: &[String]) -> Result<()> {
        self.store.set_card_tags(card, tags)
    }

    // --- Tags ---

    pub fn all_tags(&self) -> Vec<TagCount> {
        self.store.all_tags_with_counts()
    }

    // --- Study session lifecycle ---

    /// Study every card of one deck.
    pub fn study_deck(&mut self, path: &Path, deck_name: &str) -> Result<StudyState> {
        let cards = self.store.get_cards(path)?;
        if cards.is_empty() {
            return Err(CardzError::Validation(
                "This deck has no cards to study.".to_string(),
            ));
        }
        let session = StudySession::new(cards, format!("Studying: {}", deck_name))?;
        let state = session.state();
        self.session = Some(session);
        Ok(state)
    }

    /// Study every card matching any of the selected tags, checking both
    /// card-level and deck-level tags. A card matched more than once is
    /// included once.
    pub fn study_tags(&mut self, tag_names: &[String]) -> Result<StudyState> {
        let mut seen: HashSet<SessionId> = HashSet::new();
        let mut cards: Vec<CardView> = Vec::new();

        for tag in tag_names {
            for card in self.store.cards_by_tag(tag) {
                if seen.insert(card.id) {
                    cards.push(card);
                }
            }
            for card in self.store.cards_by_deck_tag(tag) {
                if seen.insert(card.id) {
                    cards.push(card);
                }
            }
        }

        if cards.is_empty() {
            let tag_list = tag_names
                .iter()
                .map(|t| format!("'{}'", t))
                .collect::<Vec<_>>()
                .join(", ");
            return Err(CardzError::Validation(format!(
                "No cards found for tag(s) {}.",
                tag_list
            )));
        }

        let title = if tag_names.len() == 1 {
            format!("Tag: {}", tag_names[0])
        } else {
            format!("Tags: {}", tag_names.join(", "))
        };
        let session = StudySession::new(cards, title)?;
        let state = session.state();
        self.session = Some(session);
        Ok(state)
    }

    /// Discard the active session. Recorded scores are already on disk; the
    /// session state itself is not persisted.
    pub fn end_study(&mut self) {
        self.session = None;
    }

    // --- Study session passthroughs ---

    pub fn study_state(&self) -> Option<StudyState> {
        self.session.as_ref().map(|s| s.state())
    }

    pub fn flip(&mut self) -> Option<StudyState> {
        self.session.as_mut()?.flip()
    }

    pub fn submit_choice(&mut self, chosen: &str) -> Result<Option<ChoiceOutcome>> {
        match self.session.as_mut() {
            Some(session) => session.submit_choice(&mut self.store, chosen),
            None => Ok(None),
        }
    }

    pub fn mark_correct(&mut self) -> Result<Option<StudyState>> {
        match self.session.as_mut() {
            Some(session) => session.mark_correct(&mut self.store),
            None => Ok(None),
        }
    }

    pub fn mark_incorrect(&mut self) -> Result<Option<StudyState>> {
        match self.session.as_mut() {
            Some(session) => session.mark_incorrect(&mut self.store),
            None => Ok(None),
        }
    }

    pub fn next_card(&mut self) -> Option<StudyState> {
        self.session.as_mut().map(|s| s.next())
    }

    pub fn prev_card(&mut self) -> Option<StudyState> {
        self.session.as_mut().map(|s| s.prev())
    }

    pub fn set_order(&mut self, mode: OrderMode) -> Option<StudyState> {
        self.session.as_mut().map(|s| s.set_order(mode))
    }

    pub fn refresh_current(&mut self) -> Option<StudyState> {
        match self.session.as_mut() {
            Some(session) => Some(session.refresh_current(&mut self.store)),
            None => None,
        }
    }
}
