//! Error types for sign-in and notebook operations.

use store::StoreError;
use thiserror::Error;

/// Errors raised by an [`crate::auth::IdentityProvider`].
#[derive(Debug, Error)]
pub enum AuthError {
    /// The user declined or abandoned the consent screen.
    #[error("sign-in cancelled: {0}")]
    Cancelled(String),

    /// Callback state did not match the request we issued.
    #[error("sign-in state mismatch")]
    StateMismatch,

    /// The session can no longer be renewed without signing in again.
    #[error("session expired, sign in again")]
    SessionExpired,

    /// Callback arrived without an authorization code.
    #[error("callback missing authorization code")]
    MissingCode,

    /// Invalid OAuth configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// The browser could not be opened.
    #[error("failed to open browser: {0}")]
    Browser(String),

    /// Loopback listener failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Token exchange or revocation with the OAuth provider failed.
    #[error("OAuth error: {0}")]
    OAuth(String),

    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The identity service answered with an error.
    #[error("identity service error: {status} - {message}")]
    Api { status: u16, message: String },
}

/// One failure kind per remote operation the notebook performs.
#[derive(Debug, Error)]
pub enum NotesError {
    #[error("authentication failed: {0}")]
    AuthFailure(#[from] AuthError),

    #[error("failed to fetch notes: {0}")]
    FetchFailure(#[source] StoreError),

    #[error("failed to add note: {0}")]
    CreateFailure(#[source] StoreError),

    #[error("failed to delete note: {0}")]
    DeleteFailure(#[source] StoreError),
}
