//! Study-session state machine.
//!
//! One [`StudySession`] walks an ordered list of [`CardView`]s with a
//! current-card pointer, flip state, and a per-viewing `scored` flag. Free
//! cards move `front → back → judged`; multiple-choice cards never flip and
//! score directly through [`StudySession::submit_choice`]. A judgment
//! is recorded at most once per viewing: repeat calls return the same `None`
//! sentinel as other not-applicable transitions, so callers cannot
//! double-count.
//!
//! Only the score deltas persist (through [`DeckStore`]); session state
//! itself is discarded when the session ends. The presentation layer learns
//! everything from [`StudySession::state`] snapshots and never reads fields
//! directly.

use rand::seq::SliceRandom;
use rand::thread_rng;
use std::collections::HashMap;

use crate::error::{CardzError, Result};
use crate::model::{CardKind, CardView, SessionId};
use crate::store::DeckStore;

/// Active sorting strategy for the session's card list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderMode {
    Random,
    Original,
    LowestScored,
}

/// Snapshot handed to the presentation layer: the sole read channel.
#[derive(Debug, Clone)]
pub struct StudyState {
    pub title: String,
    pub card: CardView,
    /// 0-based position in the current display order.
    pub index: usize,
    pub total: usize,
    /// Irrelevant for multiple-choice cards, which have no front/back split.
    pub showing_front: bool,
    pub scored: bool,
    pub order: OrderMode,
    /// For a multiple-choice card: correct answer plus wrong choices, freshly
    /// shuffled on every snapshot so the answer's position varies between
    /// displays. Empty for free-response cards.
    pub choices: Vec<String>,
}

/// Result of one multiple-choice submission.
#[derive(Debug, Clone)]
pub struct ChoiceOutcome {
    pub is_correct: bool,
    pub correct_answer: String,
}

pub struct StudySession {
    cards: Vec<CardView>,
    /// Session-start order, for `OrderMode::Original` restoration. The
    /// snapshot is authoritative even if the decks change on disk afterwards.
    original_order: Vec<SessionId>,
    index: usize,
    showing_front: bool,
    scored: bool,
    order: OrderMode,
    title: String,
}

impl StudySession {
    /// Start a session over `cards`: snapshot the given order, then shuffle a
    /// working copy.
    pub fn new(mut cards: Vec<CardView>, title: impl Into<String>) -> Result<Self> {
        if cards.is_empty() {
            return Err(CardzError::Validation(
                "There are no cards to study.".to_string(),
            ));
        }
        let original_order = cards.iter().map(|c| c.id).collect();
        cards.shuffle(&mut thread_rng());
        Ok(Self {
            cards,
            original_order,
            index: 0,
            showing_front: true,
            scored: false,
            order: OrderMode::Random,
            title: title.into(),
        })
    }

    fn current(&self) -> &CardView {
        &self.cards[self.index]
    }

    /// Pure read of the current session state.
    pub fn state(&self) -> StudyState {
        let card = self.current();
        let choices = match &card.kind {
            CardKind::MultipleChoice { wrong_choices } => {
                let mut choices = Vec::with_capacity(wrong_choices.len() + 1);
                choices.push(card.back.clone());
                choices.extend(wrong_choices.iter().cloned());
                choices.shuffle(&mut thread_rng());
                choices
            }
            CardKind::Free => Vec::new(),
        };
        StudyState {
            title: self.title.clone(),
            card: card.clone(),
            index: self.index,
            total: self.cards.len(),
            showing_front: self.showing_front,
            scored: self.scored,
            order: self.order,
            choices,
        }
    }

    /// Flip the current free-response card to its back. `None` for
    /// multiple-choice cards and when already flipped.
    pub fn flip(&mut self) -> Option<StudyState> {
        if self.current().kind.is_multiple_choice() || !self.showing_front {
            return None;
        }
        self.showing_front = false;
        Some(self.state())
    }

    /// Score the current multiple-choice card against `chosen`. Records
    /// exactly once; `None` when the card is already scored this viewing or
    /// is not multiple-choice.
    pub fn submit_choice(
        &mut self,
        store: &mut DeckStore,
        chosen: &str,
    ) -> Result<Option<ChoiceOutcome>> {
        if self.scored || !self.current().kind.is_multiple_choice() {
            return Ok(None);
        }

        let is_correct = chosen == self.current().back;
        let sid = self.current().id;
        if is_correct {
            store.record_correct(sid)?;
            self.cards[self.index].correct += 1;
        } else {
            store.record_incorrect(sid)?;
            self.cards[self.index].incorrect += 1;
        }
        self.scored = true;

        Ok(Some(ChoiceOutcome {
            is_correct,
            correct_answer: self.current().back.clone(),
        }))
    }

    /// Judge the current free-response card correct. Valid once it has been
    /// flipped and not yet scored; `None` otherwise.
    pub fn mark_correct(&mut self, store: &mut DeckStore) -> Result<Option<StudyState>> {
        if !self.can_mark() {
            return Ok(None);
        }
        store.record_correct(self.current().id)?;
        self.cards[self.index].correct += 1;
        self.scored = true;
        Ok(Some(self.state()))
    }

    /// Judge the current free-response card incorrect.
    pub fn mark_incorrect(&mut self, store: &mut DeckStore) -> Result<Option<StudyState>> {
        if !self.can_mark() {
            return Ok(None);
        }
        store.record_incorrect(self.current().id)?;
        self.cards[self.index].incorrect += 1;
        self.scored = true;
        Ok(Some(self.state()))
    }

    fn can_mark(&self) -> bool {
        !self.current().kind.is_multiple_choice() && !self.showing_front && !self.scored
    }

    /// Advance to the next card, wrapping past the end. The new card always
    /// starts front-up and unscored.
    pub fn next(&mut self) -> StudyState {
        self.index = (self.index + 1) % self.cards.len();
        self.reset_card_state();
        self.state()
    }

    /// Retreat to the previous card, wrapping past the start.
    pub fn prev(&mut self) -> StudyState {
        self.index = (self.index + self.cards.len() - 1) % self.cards.len();
        self.reset_card_state();
        self.state()
    }

    /// Re-sort the working list and restart from the first card.
    pub fn set_order(&mut self, mode: OrderMode) -> StudyState {
        match mode {
            OrderMode::Random => {
                self.cards.shuffle(&mut thread_rng());
            }
            OrderMode::Original => {
                let rank: HashMap<SessionId, usize> = self
                    .original_order
                    .iter()
                    .enumerate()
                    .map(|(i, id)| (*id, i))
                    .collect();
                self.cards
                    .sort_by_key(|c| rank.get(&c.id).copied().unwrap_or(usize::MAX));
            }
            OrderMode::LowestScored => {
                // Zero-attempt cards key below any real ratio so wholly
                // unseen cards always come first; the stable sort keeps their
                // relative order.
                fn ratio(card: &CardView) -> f64 {
                    let attempts = card.attempts();
                    if attempts == 0 {
                        -1.0
                    } else {
                        card.correct as f64 / attempts as f64
                    }
                }
                self.cards.sort_by(|a, b| ratio(a).total_cmp(&ratio(b)));
            }
        }
        self.order = mode;
        self.index = 0;
        self.reset_card_state();
        self.state()
    }

    /// Re-read the current card from storage after an out-of-band edit. The
    /// card restarts front-up and unscored; a card that vanished stays as
    /// last seen.
    pub fn refresh_current(&mut self, store: &mut DeckStore) -> StudyState {
        if let Some(view) = store.get_card(self.current().id) {
            self.cards[self.index] = view;
        }
        self.reset_card_state();
        self.state()
    }

    fn reset_card_state(&mut self) {
        self.showing_front = true;
        self.scored = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CardzPaths;
    use crate::model::Scope;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn free_card(id: u64, front: &str, back: &str) -> CardView {
        CardView {
            id: SessionId(id),
            front: front.to_string(),
            back: back.to_string(),
            kind: CardKind::Free,
            tags: Vec::new(),
            correct: 0,
            incorrect: 0,
        }
    }

    fn mc_card(id: u64, front: &str, back: &str, wrong: &[&str]) -> CardView {
        CardView {
            id: SessionId(id),
            front: front.to_string(),
            back: back.to_string(),
            kind: CardKind::MultipleChoice {
                wrong_choices: wrong.iter().map(|s| s.to_string()).collect(),
            },
            tags: Vec::new(),
            correct: 0,
            incorrect: 0,
        }
    }

    fn ids(session: &StudySession) -> Vec<SessionId> {
        session.cards.iter().map(|c| c.id).collect()
    }

    /// Store over a temp dir with one deck of `n` free cards, for tests that
    /// need scoring to hit real storage.
    fn store_with_deck(n: u64) -> (TempDir, DeckStore, PathBuf) {
        let dir = TempDir::new().unwrap();
        let mut store = DeckStore::open(CardzPaths::new(dir.path())).unwrap();
        let deck = store.create_deck("Test", Scope::Private).unwrap();
        for i in 1..=n {
            store
                .create_card(&deck, &format!("Q{}", i), &format!("A{}", i), CardKind::Free)
                .unwrap();
        }
        (dir, store, deck)
    }

    #[test]
    fn test_empty_session_is_rejected() {
        let err = StudySession::new(Vec::new(), "Nothing").unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_new_session_starts_front_unscored_random() {
        let session = StudySession::new(vec![free_card(1, "Q", "A")], "T").unwrap();
        let state = session.state();
        assert_eq!(state.index, 0);
        assert_eq!(state.total, 1);
        assert!(state.showing_front);
        assert!(!state.scored);
        assert_eq!(state.order, OrderMode::Random);
    }

    #[test]
    fn test_shuffle_keeps_card_set() {
        let cards: Vec<CardView> = (1..=20)
            .map(|i| free_card(i, &format!("Q{}", i), "A"))
            .collect();
        let session = StudySession::new(cards, "T").unwrap();
        let mut got = ids(&session);
        got.sort();
        let want: Vec<SessionId> = (1..=20).map(SessionId).collect();
        assert_eq!(got, want);
    }

    #[test]
    fn test_wraparound_single_card() {
        let mut session = StudySession::new(vec![free_card(1, "Q", "A")], "T").unwrap();
        assert_eq!(session.next().index, 0);
        assert_eq!(session.prev().index, 0);
    }

    #[test]
    fn test_wraparound_five_cards() {
        let cards: Vec<CardView> = (1..=5).map(|i| free_card(i, "Q", "A")).collect();
        let mut session = StudySession::new(cards, "T").unwrap();

        for expected in [1, 2, 3, 4, 0] {
            assert_eq!(session.next().index, expected);
        }
        assert_eq!(session.prev().index, 4);
    }

    #[test]
    fn test_navigation_resets_flip_and_scored() {
        let cards = vec![free_card(1, "Q", "A"), free_card(2, "Q", "A")];
        let mut session = StudySession::new(cards, "T").unwrap();
        session.flip().unwrap();
        assert!(!session.state().showing_front);

        let state = session.next();
        assert!(state.showing_front);
        assert!(!state.scored);
    }

    #[test]
    fn test_flip_only_from_front_on_free_cards() {
        let mut session = StudySession::new(vec![free_card(1, "Q", "A")], "T").unwrap();
        assert!(session.flip().is_some());
        // Already flipped.
        assert!(session.flip().is_none());

        let mut session =
            StudySession::new(vec![mc_card(1, "Q", "A", &["B"])], "T").unwrap();
        assert!(session.flip().is_none());
    }

    #[test]
    fn test_original_order_restored_after_reshuffles() {
        let (_dir, mut store, deck) = store_with_deck(8);
        let cards = store.get_cards(&deck).unwrap();
        let given: Vec<SessionId> = cards.iter().map(|c| c.id).collect();

        let mut session = StudySession::new(cards, "T").unwrap();
        session.set_order(OrderMode::Random);
        session.set_order(OrderMode::Random);
        let state = session.set_order(OrderMode::Original);

        assert_eq!(ids(&session), given);
        assert_eq!(state.index, 0);
    }

    #[test]
    fn test_lowest_scored_puts_unattempted_first() {
        let mut veteran = free_card(3, "Q3", "A");
        veteran.correct = 2;
        veteran.incorrect = 2;
        let cards = vec![free_card(1, "Q1", "A"), free_card(2, "Q2", "A"), veteran];

        let mut session = StudySession::new(cards, "T").unwrap();
        // Pin a known order first so the stable sort's tie-break is
        // deterministic.
        session.set_order(OrderMode::Original);
        session.set_order(OrderMode::LowestScored);

        assert_eq!(
            ids(&session),
            vec![SessionId(1), SessionId(2), SessionId(3)]
        );
    }

    #[test]
    fn test_lowest_scored_sorts_by_ratio() {
        let mut good = free_card(1, "Q", "A");
        good.correct = 9;
        good.incorrect = 1;
        let mut bad = free_card(2, "Q", "A");
        bad.correct = 1;
        bad.incorrect = 9;
        let mut middling = free_card(3, "Q", "A");
        middling.correct = 5;
        middling.incorrect = 5;

        let mut session = StudySession::new(vec![good, bad, middling], "T").unwrap();
        session.set_order(OrderMode::LowestScored);
        assert_eq!(
            ids(&session),
            vec![SessionId(2), SessionId(3), SessionId(1)]
        );
    }

    #[test]
    fn test_mc_choices_reshuffled_per_snapshot() {
        let wrong: Vec<String> = (1..=7).map(|i| format!("wrong {}", i)).collect();
        let wrong_refs: Vec<&str> = wrong.iter().map(|s| s.as_str()).collect();
        let session =
            StudySession::new(vec![mc_card(1, "Q", "right", &wrong_refs)], "T").unwrap();

        let first = session.state().choices;
        assert_eq!(first.len(), 8);
        assert!(first.contains(&"right".to_string()));

        // 8! orderings; twenty snapshots all identical would mean the
        // choices are cached rather than re-derived.
        let varied = (0..20).any(|_| session.state().choices != first);
        assert!(varied);
    }

    #[test]
    fn test_free_card_has_no_choices() {
        let session = StudySession::new(vec![free_card(1, "Q", "A")], "T").unwrap();
        assert!(session.state().choices.is_empty());
    }

    #[test]
    fn test_submit_choice_records_once() {
        let (_dir, mut store, deck) = store_with_deck(0);
        let sid = store
            .create_card(
                &deck,
                "Q",
                "right",
                CardKind::MultipleChoice {
                    wrong_choices: vec!["wrong".to_string()],
                },
            )
            .unwrap();
        let cards = store.get_cards(&deck).unwrap();
        let mut session = StudySession::new(cards, "T").unwrap();

        let outcome = session.submit_choice(&mut store, "right").unwrap().unwrap();
        assert!(outcome.is_correct);
        assert_eq!(outcome.correct_answer, "right");
        assert!(session.state().scored);

        // Second submission before navigating away must not double count.
        assert!(session.submit_choice(&mut store, "right").unwrap().is_none());
        let card = store.get_card(sid).unwrap();
        assert_eq!((card.correct, card.incorrect), (1, 0));
    }

    #[test]
    fn test_submit_choice_wrong_answer() {
        let (_dir, mut store, deck) = store_with_deck(0);
        let sid = store
            .create_card(
                &deck,
                "Q",
                "right",
                CardKind::MultipleChoice {
                    wrong_choices: vec!["wrong".to_string()],
                },
            )
            .unwrap();
        let cards = store.get_cards(&deck).unwrap();
        let mut session = StudySession::new(cards, "T").unwrap();

        let outcome = session.submit_choice(&mut store, "wrong").unwrap().unwrap();
        assert!(!outcome.is_correct);
        assert_eq!(outcome.correct_answer, "right");

        let card = store.get_card(sid).unwrap();
        assert_eq!((card.correct, card.incorrect), (0, 1));
    }

    #[test]
    fn test_submit_choice_rejected_on_free_card() {
        let (_dir, mut store, deck) = store_with_deck(1);
        let cards = store.get_cards(&deck).unwrap();
        let mut session = StudySession::new(cards, "T").unwrap();
        assert!(session.submit_choice(&mut store, "A1").unwrap().is_none());
    }

    #[test]
    fn test_mark_requires_flip_and_records_once() {
        let (_dir, mut store, deck) = store_with_deck(1);
        let cards = store.get_cards(&deck).unwrap();
        let sid = cards[0].id;
        let mut session = StudySession::new(cards, "T").unwrap();

        // Not flipped yet.
        assert!(session.mark_correct(&mut store).unwrap().is_none());

        session.flip().unwrap();
        let state = session.mark_correct(&mut store).unwrap().unwrap();
        assert!(state.scored);
        assert_eq!(state.card.correct, 1);

        // Already judged this viewing.
        assert!(session.mark_incorrect(&mut store).unwrap().is_none());
        let card = store.get_card(sid).unwrap();
        assert_eq!((card.correct, card.incorrect), (1, 0));
    }

    #[test]
    fn test_revisiting_card_allows_new_judgment() {
        let (_dir, mut store, deck) = store_with_deck(1);
        let cards = store.get_cards(&deck).unwrap();
        let sid = cards[0].id;
        let mut session = StudySession::new(cards, "T").unwrap();

        session.flip().unwrap();
        session.mark_correct(&mut store).unwrap().unwrap();

        // Wrap back around to the same card: the transient flag resets, the
        // historical tally does not.
        session.next();
        session.flip().unwrap();
        session.mark_incorrect(&mut store).unwrap().unwrap();

        let card = store.get_card(sid).unwrap();
        assert_eq!((card.correct, card.incorrect), (1, 1));
    }

    #[test]
    fn test_refresh_current_picks_up_edit() {
        let (_dir, mut store, deck) = store_with_deck(1);
        let cards = store.get_cards(&deck).unwrap();
        let sid = cards[0].id;
        let mut session = StudySession::new(cards, "T").unwrap();
        session.flip().unwrap();

        store
            .update_card(sid, "Edited front", "Edited back", CardKind::Free)
            .unwrap();
        let state = session.refresh_current(&mut store);

        assert_eq!(state.card.front, "Edited front");
        assert!(state.showing_front);
        assert!(!state.scored);
    }
}
