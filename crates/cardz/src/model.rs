//! # Domain Model: Decks, Cards, and Display Snapshots
//!
//! This module defines the persisted record types ([`DeckFile`],
//! [`CardRecord`]) and the display snapshot handed across the presentation
//! boundary ([`CardView`]).
//!
//! ## Card kinds
//!
//! A card is either free-response or multiple-choice. The distinction is a
//! tagged enum: [`CardKind::MultipleChoice`] carries its wrong choices as a
//! required field, so a multiple-choice card without choices cannot be
//! represented in memory. On disk the same card is stored flat, matching the
//! established deck-file shape:
//!
//! ```json
//! { "id": 3, "front": "...", "back": "...",
//!   "card_type": "mc", "choices": ["...", "..."], "tags": [] }
//! ```
//!
//! Free-response cards store `"card_type": "free"` and a null `choices`.
//! The mapping between the flat shape and the tagged enum happens in a serde
//! helper struct below.
//!
//! ## Identifiers
//!
//! Cards carry a *local id*, unique within their deck, assigned from the
//! deck's monotonic `next_id` counter and never reused after deletion.
//! Callers outside the storage layer never see local ids; they hold a
//! [`SessionId`], an opaque process-lifetime handle brokered by the store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CardzError, Result};

/// Which of the two deck partitions a deck lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Scope {
    /// Bundled example decks.
    Public,
    /// User-created decks.
    Private,
}

/// Opaque process-lifetime handle for one card.
///
/// Stands in for a `(deck path, local id)` pair so callers stay unaware of
/// the on-disk identifier scheme. Never persisted; the mapping resets each
/// run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(pub(crate) u64);

impl SessionId {
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CardKind {
    Free,
    MultipleChoice { wrong_choices: Vec<String> },
}

impl CardKind {
    pub fn is_multiple_choice(&self) -> bool {
        matches!(self, CardKind::MultipleChoice { .. })
    }
}

/// One card as persisted inside a deck file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardRecord {
    /// Unique within the owning deck, immutable once assigned.
    pub id: u64,
    pub front: String,
    pub back: String,
    pub kind: CardKind,
    pub tags: Vec<String>,
}

// On-disk card shape. The tagged `kind` flattens into a `card_type`
// discriminant plus a nullable `choices` array; `tags` may be absent in
// files written by older versions.
#[derive(Serialize, Deserialize)]
struct CardRecordHelper {
    id: u64,
    front: String,
    back: String,
    #[serde(default = "default_card_type")]
    card_type: String,
    #[serde(default)]
    choices: Option<Vec<String>>,
    #[serde(default)]
    tags: Vec<String>,
}

fn default_card_type() -> String {
    "free".to_string()
}

impl Serialize for CardRecord {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let (card_type, choices) = match &self.kind {
            CardKind::Free => ("free".to_string(), None),
            CardKind::MultipleChoice { wrong_choices } => {
                ("mc".to_string(), Some(wrong_choices.clone()))
            }
        };
        CardRecordHelper {
            id: self.id,
            front: self.front.clone(),
            back: self.back.clone(),
            card_type,
            choices,
            tags: self.tags.clone(),
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for CardRecord {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let helper = CardRecordHelper::deserialize(deserializer)?;

        let kind = match helper.card_type.as_str() {
            "free" => CardKind::Free,
            "mc" => {
                let wrong_choices = helper.choices.unwrap_or_default();
                if wrong_choices.is_empty() {
                    return Err(serde::de::Error::custom(format!(
                        "multiple-choice card {} has no wrong choices",
                        helper.id
                    )));
                }
                CardKind::MultipleChoice { wrong_choices }
            }
            other => {
                return Err(serde::de::Error::custom(format!(
                    "unknown card_type: {:?}",
                    other
                )));
            }
        };

        Ok(CardRecord {
            id: helper.id,
            front: helper.front,
            back: helper.back,
            kind,
            tags: helper.tags,
        })
    }
}

/// One deck as persisted on disk: display name, deck-level tags, the
/// monotonic card-id counter, and the ordered card list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeckFile {
    pub name: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub next_id: u64,
    pub cards: Vec<CardRecord>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl DeckFile {
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            name: name.into(),
            tags: Vec::new(),
            next_id: 1,
            cards: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn find_card(&self, local_id: u64) -> Option<&CardRecord> {
        self.cards.iter().find(|c| c.id == local_id)
    }

    pub fn find_card_mut(&mut self, local_id: u64) -> Option<&mut CardRecord> {
        self.cards.iter_mut().find(|c| c.id == local_id)
    }
}

/// Display snapshot of one card, with its externally stored score baked in.
///
/// This is what crosses the presentation boundary: the session id instead of
/// any storage identifier, and the current tallies so the caller never reads
/// the score file itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardView {
    pub id: SessionId,
    pub front: String,
    pub back: String,
    pub kind: CardKind,
    pub tags: Vec<String>,
    pub correct: u64,
    pub incorrect: u64,
}

impl CardView {
    pub fn attempts(&self) -> u64 {
        self.correct + self.incorrect
    }
}

/// Normalize a tag list: trim, lowercase, drop empties, de-duplicate while
/// preserving first-seen order.
pub fn normalize_tags<I, S>(tags: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out: Vec<String> = Vec::new();
    for tag in tags {
        let t = tag.as_ref().trim().to_lowercase();
        if !t.is_empty() && !out.contains(&t) {
            out.push(t);
        }
    }
    out
}

/// Strip characters that are illegal in filenames on common platforms.
/// Falls back to `"deck"` when nothing survives.
pub fn sanitize_deck_name(name: &str) -> String {
    const ILLEGAL: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];
    let cleaned: String = name.chars().filter(|c| !ILLEGAL.contains(c)).collect();
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        "deck".to_string()
    } else {
        cleaned.to_string()
    }
}

/// Validate card content before it is persisted.
///
/// Front and back must be non-blank, and a multiple-choice card needs at
/// least one wrong choice. Messages are presentation-ready.
pub fn validate_card(front: &str, back: &str, kind: &CardKind) -> Result<()> {
    if front.trim().is_empty() || back.trim().is_empty() {
        return Err(CardzError::Validation(
            "Front and answer are required.".to_string(),
        ));
    }
    if let CardKind::MultipleChoice { wrong_choices } = kind {
        if wrong_choices.iter().all(|c| c.trim().is_empty()) {
            return Err(CardzError::Validation(
                "Add at least 1 wrong choice for multiple choice.".to_string(),
            ));
        }
    }
    Ok(())
}
