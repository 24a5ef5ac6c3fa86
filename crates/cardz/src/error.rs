use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CardzError {
    #[error("Deck not found: {}", .0.display())]
    DeckNotFound(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Store error: {0}")]
    Store(String),

    /// Recoverable user-input failure. The message is meant to be shown
    /// verbatim by the presentation layer.
    #[error("{0}")]
    Validation(String),
}

impl CardzError {
    pub fn is_validation(&self) -> bool {
        matches!(self, CardzError::Validation(_))
    }
}

pub type Result<T> = std::result::Result<T, CardzError>;
