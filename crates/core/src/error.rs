//! Error types for the relay domain.
//!
//! Uses `thiserror` for ergonomic error definitions. Each bounded context
//! (session store, versioned store, auth) defines its own error enum in its
//! own crate; this top-level `Error` aggregates them for callers that cross
//! crate boundaries without caring which context failed.

use thiserror::Error;

/// The top-level error type for relay operations that span crates.
#[derive(Debug, Error)]
pub enum Error {
    #[error("storage error: {0}")]
    Storage(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
