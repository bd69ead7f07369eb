//! Document store error types.

use thiserror::Error;

/// Errors returned by [`crate::NoteCollection`] implementations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// HTTP request failed before a response arrived.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The store answered with an error status.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// No identity to authorise the call, or the store rejected its token.
    #[error("not authenticated")]
    Unauthenticated,

    /// A document id that cannot address a single document.
    #[error("invalid document id: {0:?}")]
    InvalidId(String),

    /// A document is missing fields a note needs.
    #[error("malformed document {name}: {reason}")]
    MalformedDocument { name: String, reason: String },

    /// Failure injected by [`crate::MemoryStore`].
    #[error("store unavailable")]
    Unavailable,
}
