//! # User model for the signed-in user
//!
//! [`UserInfo`] is the token-free projection of a [`store::Identity`] that UI
//! state carries around. It is `PartialEq` so it can sit inside component
//! props and signals; the identity itself, with its bearer tokens, stays inside
//! the [`crate::Notebook`].

use serde::{Deserialize, Serialize};
use store::Identity;

/// User information safe to render.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserInfo {
    pub id: String,
    pub name: Option<String>,
    pub email: Option<String>,
}

impl UserInfo {
    /// Get display name, falling back to email and then the id.
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .or(self.email.as_deref())
            .unwrap_or(&self.id)
    }
}

impl From<&Identity> for UserInfo {
    fn from(identity: &Identity) -> Self {
        Self {
            id: identity.id.clone(),
            name: identity.display_name.clone(),
            email: identity.email.clone(),
        }
    }
}
