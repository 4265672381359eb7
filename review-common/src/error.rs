//! Common error types for the review enrichment tools

use thiserror::Error;

/// Common result type for review enrichment operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across the review enrichment crates
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding or decoding error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Metadata store holds more than one record for a review.
    ///
    /// Fatal: the run must stop before anything is written.
    #[error("Duplicate review_id {0} in metadata store")]
    DuplicateReviewId(i64),

    /// A persisted JSONL line that no longer parses.
    ///
    /// Fatal for the metadata store: rewriting it would drop the line.
    #[error("Corrupt line {line} in {path}: {message}")]
    CorruptLine {
        path: String,
        line: usize,
        message: String,
    },

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}
