//! # Domain models for notes and identities
//!
//! | Struct | Represents |
//! |--------|-----------|
//! | [`Note`] | A note as the document store returned it. The `id` is always store-assigned. |
//! | [`NewNote`] | The payload sent when creating a note. Serialises with the `userId` field name the collection uses. |
//! | [`Identity`] | The signed-in user as issued by the identity provider, including the bearer tokens used to authorise store calls. |
//!
//! [`Identity`] lives here rather than next to the sign-in code because every
//! [`crate::NoteCollection`] call is scoped by it.

use std::fmt;
use std::time::{Duration, SystemTime};

use serde::{Deserialize, Serialize};

/// A note stored in the remote collection.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    /// Store-assigned document id: "Xk2b9..."
    pub id: String,
    /// Body text as entered by the user
    pub text: String,
    /// Id of the identity that created the note, when the document carries one
    #[serde(rename = "userId", default, skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<String>,
}

/// Fields written when creating a note.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewNote {
    pub text: String,
    #[serde(rename = "userId")]
    pub owner_id: String,
}

impl NewNote {
    pub fn new(text: impl Into<String>, owner_id: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            owner_id: owner_id.into(),
        }
    }
}

/// An authenticated user.
#[derive(Clone, PartialEq, Eq)]
pub struct Identity {
    /// Provider-wide unique user id
    pub id: String,
    pub display_name: Option<String>,
    pub email: Option<String>,
    /// Token presented to the document store
    pub id_token: String,
    /// Long-lived token traded for a new `id_token` once it expires
    pub refresh_token: String,
    /// When `id_token` stops being accepted, if the provider said
    pub expires_at: Option<SystemTime>,
    /// Token issued by the upstream sign-in provider, revoked on sign-out
    pub provider_token: String,
}

/// How long before `expires_at` an id token is already treated as expired.
pub const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(60);

impl Identity {
    /// Display name, falling back to the email and then the id.
    pub fn display_name(&self) -> &str {
        self.display_name
            .as_deref()
            .or(self.email.as_deref())
            .unwrap_or(&self.id)
    }

    /// Whether `id_token` has to be refreshed before the next store call.
    pub fn token_expired(&self, now: SystemTime) -> bool {
        self.expires_at
            .is_some_and(|expires_at| now + TOKEN_EXPIRY_MARGIN >= expires_at)
    }
}

// Tokens stay out of logs.
impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Identity")
            .field("id", &self.id)
            .field("display_name", &self.display_name)
            .field("email", &self.email)
            .field("expires_at", &self.expires_at)
            .finish_non_exhaustive()
    }
}
