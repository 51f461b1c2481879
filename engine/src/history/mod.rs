//! Conversation history
//!
//! Turn records, their delimited on-disk format, and the file-backed store
//! that is the single source of truth for every conversation turn.

pub mod codec;
pub mod record;
pub mod store;

pub use record::{MalformedRow, TurnProgress, TurnRecord, COLUMNS};
pub use store::{next_turn, recent, upsert, HistoryStore};

use std::path::PathBuf;

/// Result type for history operations
pub type Result<T> = std::result::Result<T, HistoryError>;

/// Errors reading or writing the history file
#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    #[error("Failed to read history file {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write history file {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl From<HistoryError> for sdk::EngineError {
    fn from(e: HistoryError) -> Self {
        sdk::EngineError::History(e.to_string())
    }
}
