//! Persistence errors.

use crate::data::ParseOutcomeError;
use crate::training::TableError;

/// Errors raised while reading a model.
#[derive(Debug, thiserror::Error)]
pub enum ReadError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed model JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid outcome key in model: {0}")]
    Outcome(#[from] ParseOutcomeError),

    #[error("invalid model: {0}")]
    Validation(String),

    #[error(transparent)]
    Table(#[from] TableError),
}

/// Errors raised while writing a model.
#[derive(Debug, thiserror::Error)]
pub enum WriteError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to serialize model: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Table(#[from] TableError),
}
