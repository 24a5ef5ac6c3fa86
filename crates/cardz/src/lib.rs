//! # cardz
//!
//! Deck storage and study-session engine for a personal flashcard tool.
//! Three layers, each with one responsibility:
//!
//! - **Storage** ([`store`]): one JSON file per deck, plus a separate score
//!   file so decks stay shareable without personal statistics baked in.
//!   Callers address cards through opaque session ids, never file paths.
//! - **Session** ([`session`]): the flip/score state machine for one run
//!   through an ordered card list, covering ordering modes, wraparound
//!   navigation, and single-judgment scoring.
//! - **Facade** ([`api`]): the stable method surface a frontend calls. It
//!   returns plain data snapshots; rendering, dialogs, and navigation belong
//!   to whatever UI sits on top.
//!
//! Swapping the frontend means rewriting only the layer above [`api::Cardz`];
//! the facade's method signatures are the contract.

pub mod api;
pub mod config;
pub mod error;
pub mod model;
pub mod session;
pub mod store;

pub use api::{Cardz, DeckInfo, DeckOverview};
pub use config::CardzPaths;
pub use error::{CardzError, Result};
pub use model::{CardKind, CardView, Scope, SessionId};
pub use session::{ChoiceOutcome, OrderMode, StudySession, StudyState};
pub use store::{DeckEntry, DeckStore, ScoreStore, TagCount};
