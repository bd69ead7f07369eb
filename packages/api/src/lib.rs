//! # API crate — sign-in and notebook state for the notes app
//!
//! Everything between the UI and the hosted services lives here.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`auth`] | [`IdentityProvider`] trait, Google OAuth with PKCE over a loopback redirect, Firebase sign-in exchange and token refresh, OAuth configuration |
//! | [`notebook`] | [`Notebook`]: the current identity plus the local note list, reconciled with remote results; [`NotebookCommand`] for queued frontends |
//! | [`error`] | [`AuthError`] and the per-operation [`NotesError`] taxonomy |
//! | [`models`] | [`UserInfo`], the renderable projection of an identity |
//!
//! [`Services`] bundles the production provider and note collection. It is
//! built once at startup from the configuration and handed to the frontend;
//! tests build a [`Notebook`] from fakes instead.

pub mod auth;
pub mod error;
pub mod models;
pub mod notebook;

pub use auth::{GoogleSignIn, IdentityProvider, OAuthConfig};
pub use error::{AuthError, NotesError};
pub use models::UserInfo;
pub use notebook::{Notebook, NotebookCommand, NotebookSnapshot};

pub use store::{FirebaseConfig, FirestoreStore, Identity, Note, NoteCollection};

/// The production provider and collection.
#[derive(Clone, Debug)]
pub struct Services {
    pub provider: GoogleSignIn,
    pub collection: FirestoreStore,
}

impl Services {
    pub fn new(firebase: &FirebaseConfig, oauth: OAuthConfig) -> Result<Self, AuthError> {
        let http = reqwest::Client::new();
        // Token endpoints must not follow redirects.
        let oauth_http = reqwest::ClientBuilder::new()
            .redirect(reqwest::redirect::Policy::none())
            .build()?;
        let provider = GoogleSignIn::new(
            auth::GoogleOAuth::new(oauth, oauth_http),
            auth::FirebaseAuth::new(firebase, http.clone()),
        );
        let collection = FirestoreStore::with_client(http, firebase);
        Ok(Self {
            provider,
            collection,
        })
    }

    /// A signed-out notebook over these services.
    pub fn notebook(&self) -> Notebook<GoogleSignIn, FirestoreStore> {
        Notebook::new(self.provider.clone(), self.collection.clone())
    }
}
