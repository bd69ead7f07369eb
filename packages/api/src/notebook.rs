//! # Notebook — session and local note state
//!
//! [`Notebook`] owns the signed-in [`Identity`] (if any) and the local copy of
//! the note collection, and reconciles that copy with the results of remote
//! calls made through an [`IdentityProvider`] and a [`NoteCollection`].
//!
//! | Method | On success | On failure |
//! |--------|-----------|------------|
//! | [`login`](Notebook::login) | sets the identity, then fetches | identity stays unset |
//! | [`logout`](Notebook::logout) | clears identity and notes | nothing changes |
//! | [`fetch_all`](Notebook::fetch_all) | replaces local notes | previous notes stay |
//! | [`add`](Notebook::add) | appends the note as the store returned it | nothing changes |
//! | [`remove`](Notebook::remove) | drops the local note with that id | nothing changes |
//!
//! Before every store call an expired ID token is renewed through
//! [`IdentityProvider::refresh`]. A failed renewal fails that call as
//! unauthenticated and keeps the session, so signing out still works.
//!
//! Frontends queue [`NotebookCommand`]s and hand them to
//! [`apply`](Notebook::apply) one at a time, which keeps operations from
//! interleaving.
//!
//! Every failure is logged here, at the call site of the remote operation,
//! and returned as a [`NotesError`]. Frontends are free to ignore it.
//!
//! Local notes reflect the store only as of the last successful call. There
//! is no listener keeping them in sync.

use std::time::SystemTime;

use store::{Identity, NewNote, Note, NoteCollection, StoreError};

use crate::auth::IdentityProvider;
use crate::error::NotesError;
use crate::models::UserInfo;

/// Session state plus the locally held notes.
pub struct Notebook<P, C> {
    provider: P,
    collection: C,
    identity: Option<Identity>,
    notes: Vec<Note>,
}

/// What a frontend renders.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NotebookSnapshot {
    pub user: Option<UserInfo>,
    pub notes: Vec<Note>,
}

/// A user action for the notebook.
#[derive(Clone, Debug, PartialEq)]
pub enum NotebookCommand {
    Login,
    Logout,
    Add(String),
    Remove(String),
}

impl<P: IdentityProvider, C: NoteCollection> Notebook<P, C> {
    pub fn new(provider: P, collection: C) -> Self {
        Self {
            provider,
            collection,
            identity: None,
            notes: Vec::new(),
        }
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.identity.is_some()
    }

    /// Local notes. Always empty while signed out.
    pub fn notes(&self) -> &[Note] {
        if self.identity.is_none() {
            return &[];
        }
        &self.notes
    }

    pub fn snapshot(&self) -> NotebookSnapshot {
        NotebookSnapshot {
            user: self.identity.as_ref().map(UserInfo::from),
            notes: self.notes().to_vec(),
        }
    }

    /// Sign in and load the collection.
    ///
    /// Does nothing when already signed in. A failed fetch after a successful
    /// sign-in is logged but does not fail the login.
    pub async fn login(&mut self) -> Result<(), NotesError> {
        if let Some(identity) = &self.identity {
            tracing::debug!("Already signed in as {}", identity.id);
            return Ok(());
        }

        match self.provider.sign_in().await {
            Ok(identity) => {
                tracing::info!("Login succeeded for {}", identity.id);
                self.identity = Some(identity);
            }
            Err(e) => {
                let e = NotesError::AuthFailure(e);
                tracing::error!("Login failed: {}", e);
                return Err(e);
            }
        }

        self.fetch_all().await.ok();
        Ok(())
    }

    /// Sign out and forget every local note.
    pub async fn logout(&mut self) -> Result<(), NotesError> {
        if let Some(identity) = &self.identity {
            if let Err(e) = self.provider.sign_out(identity).await {
                let e = NotesError::AuthFailure(e);
                tracing::error!("Logout failed: {}", e);
                return Err(e);
            }
        }
        self.identity = None;
        self.notes.clear();
        Ok(())
    }

    /// Apply one queued command.
    ///
    /// Failures are already logged by the operation and go no further.
    /// Returns `true` only when a note was added, which is the frontend's cue
    /// to clear its draft.
    pub async fn apply(&mut self, command: NotebookCommand) -> bool {
        tracing::debug!("Applying {:?}", command);
        match command {
            NotebookCommand::Login => {
                self.login().await.ok();
                false
            }
            NotebookCommand::Logout => {
                self.logout().await.ok();
                false
            }
            NotebookCommand::Add(text) => matches!(self.add(&text).await, Ok(Some(_))),
            NotebookCommand::Remove(id) => {
                self.remove(&id).await.ok();
                false
            }
        }
    }

    /// The identity to authorise a store call with, renewed first if its
    /// token has expired.
    async fn fresh_identity(&mut self) -> Result<Identity, StoreError> {
        let identity = match &self.identity {
            Some(identity) if identity.token_expired(SystemTime::now()) => identity,
            Some(identity) => return Ok(identity.clone()),
            None => return Err(StoreError::Unauthenticated),
        };

        let refreshed = self.provider.refresh(identity).await;
        match refreshed {
            Ok(fresh) => {
                tracing::debug!("Renewed session for {}", fresh.id);
                self.identity = Some(fresh.clone());
                Ok(fresh)
            }
            Err(e) => {
                tracing::error!("Failed to renew session: {}", e);
                Err(StoreError::Unauthenticated)
            }
        }
    }

    /// Replace local notes with every note in the collection.
    pub async fn fetch_all(&mut self) -> Result<(), NotesError> {
        let result = match self.fresh_identity().await {
            Ok(identity) => self.collection.list_all(&identity).await,
            Err(e) => Err(e),
        };
        match result {
            Ok(notes) => {
                tracing::debug!("Fetched {} notes", notes.len());
                self.notes = notes;
                Ok(())
            }
            Err(e) => {
                let e = NotesError::FetchFailure(e);
                tracing::error!("Failed to fetch notes: {}", e);
                Err(e)
            }
        }
    }

    /// Create a note owned by the signed-in identity.
    ///
    /// Blank text is ignored without a remote call and yields `Ok(None)`.
    pub async fn add(&mut self, text: &str) -> Result<Option<Note>, NotesError> {
        if text.trim().is_empty() {
            return Ok(None);
        }

        let result = match self.fresh_identity().await {
            Ok(identity) => {
                let new_note = NewNote::new(text, identity.id.clone());
                self.collection.create(&identity, new_note).await
            }
            Err(e) => Err(e),
        };
        match result {
            Ok(note) => {
                tracing::debug!("Added note {}", note.id);
                self.notes.push(note.clone());
                Ok(Some(note))
            }
            Err(e) => {
                let e = NotesError::CreateFailure(e);
                tracing::error!("Failed to add note: {}", e);
                Err(e)
            }
        }
    }

    /// Delete a note remotely, then locally.
    ///
    /// The remote call is made even when no local note has that id.
    pub async fn remove(&mut self, id: &str) -> Result<(), NotesError> {
        let result = match self.fresh_identity().await {
            Ok(identity) => self.collection.delete(&identity, id).await,
            Err(e) => Err(e),
        };
        match result {
            Ok(()) => {
                tracing::debug!("Deleted note {}", id);
                self.notes.retain(|note| note.id != id);
                Ok(())
            }
            Err(e) => {
                let e = NotesError::DeleteFailure(e);
                tracing::error!("Failed to delete note {}: {}", id, e);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use oauth2::CsrfToken;
    use store::{MemoryStore, StoreOp};

    use super::*;
    use crate::auth::LoopbackServer;
    use crate::error::AuthError;

    /// Identity provider whose outcomes are set by the test.
    #[derive(Clone, Default)]
    struct ScriptedProvider {
        fail_sign_in: Arc<AtomicBool>,
        fail_sign_out: Arc<AtomicBool>,
        fail_refresh: Arc<AtomicBool>,
        /// Sign in with a token that has already expired.
        issue_expired: Arc<AtomicBool>,
        sign_ins: Arc<AtomicUsize>,
        sign_outs: Arc<AtomicUsize>,
        refreshes: Arc<AtomicUsize>,
    }

    impl IdentityProvider for ScriptedProvider {
        async fn sign_in(&self) -> Result<Identity, AuthError> {
            self.sign_ins.fetch_add(1, Ordering::SeqCst);
            if self.fail_sign_in.load(Ordering::SeqCst) {
                return Err(AuthError::Cancelled("popup closed".to_string()));
            }
            let expires_at = if self.issue_expired.load(Ordering::SeqCst) {
                SystemTime::now() - Duration::from_secs(1)
            } else {
                SystemTime::now() + Duration::from_secs(3600)
            };
            Ok(Identity {
                id: "u1".to_string(),
                display_name: Some("Ann".to_string()),
                email: Some("ann@example.com".to_string()),
                id_token: "id-token".to_string(),
                refresh_token: "refresh-token".to_string(),
                expires_at: Some(expires_at),
                provider_token: "access-token".to_string(),
            })
        }

        async fn refresh(&self, identity: &Identity) -> Result<Identity, AuthError> {
            self.refreshes.fetch_add(1, Ordering::SeqCst);
            if self.fail_refresh.load(Ordering::SeqCst) {
                return Err(AuthError::Api {
                    status: 400,
                    message: "TOKEN_EXPIRED".to_string(),
                });
            }
            Ok(Identity {
                id_token: "renewed-id-token".to_string(),
                expires_at: Some(SystemTime::now() + Duration::from_secs(3600)),
                ..identity.clone()
            })
        }

        async fn sign_out(&self, _identity: &Identity) -> Result<(), AuthError> {
            self.sign_outs.fetch_add(1, Ordering::SeqCst);
            if self.fail_sign_out.load(Ordering::SeqCst) {
                return Err(AuthError::OAuth("revocation failed".to_string()));
            }
            Ok(())
        }
    }

    /// Runs the real loopback wait, but nobody ever answers the consent page.
    struct AbandonedConsent;

    impl IdentityProvider for AbandonedConsent {
        async fn sign_in(&self) -> Result<Identity, AuthError> {
            let server = LoopbackServer::bind(0).await?;
            let state = CsrfToken::new("issued".to_string());
            let code = server
                .wait_for_code(&state, Duration::from_millis(100))
                .await?;
            Err(AuthError::OAuth(format!("unexpected redirect with code {code}")))
        }

        async fn refresh(&self, identity: &Identity) -> Result<Identity, AuthError> {
            Ok(identity.clone())
        }

        async fn sign_out(&self, _identity: &Identity) -> Result<(), AuthError> {
            Ok(())
        }
    }

    fn note(id: &str, text: &str, owner: &str) -> Note {
        Note {
            id: id.to_string(),
            text: text.to_string(),
            owner_id: Some(owner.to_string()),
        }
    }

    async fn signed_in(store: &MemoryStore) -> Notebook<ScriptedProvider, MemoryStore> {
        let mut notebook = Notebook::new(ScriptedProvider::default(), store.clone());
        notebook.login().await.unwrap();
        notebook
    }

    #[tokio::test]
    async fn test_signed_out_shows_nothing() {
        let store = MemoryStore::with_notes(vec![note("n1", "buy milk", "u1")]);
        let mut notebook = Notebook::new(ScriptedProvider::default(), store.clone());

        assert!(!notebook.is_authenticated());
        assert!(notebook.notes().is_empty());
        assert_eq!(notebook.snapshot(), NotebookSnapshot::default());

        assert!(matches!(
            notebook.fetch_all().await,
            Err(NotesError::FetchFailure(StoreError::Unauthenticated))
        ));
        assert!(matches!(
            notebook.add("hello").await,
            Err(NotesError::CreateFailure(StoreError::Unauthenticated))
        ));
        assert_eq!(store.calls(StoreOp::List), 0);
        assert_eq!(store.calls(StoreOp::Create), 0);
    }

    #[tokio::test]
    async fn test_login_fetches_collection() {
        let store = MemoryStore::with_notes(vec![note("n1", "buy milk", "u1")]);
        let notebook = signed_in(&store).await;

        assert_eq!(notebook.identity().unwrap().display_name(), "Ann");
        assert_eq!(notebook.notes(), &[note("n1", "buy milk", "u1")]);
        assert_eq!(store.calls(StoreOp::List), 1);

        let snapshot = notebook.snapshot();
        assert_eq!(snapshot.user.unwrap().display_name(), "Ann");
        assert_eq!(snapshot.notes.len(), 1);
    }

    #[tokio::test]
    async fn test_login_failure_leaves_identity_unset() {
        let provider = ScriptedProvider::default();
        provider.fail_sign_in.store(true, Ordering::SeqCst);
        let store = MemoryStore::new();
        let mut notebook = Notebook::new(provider.clone(), store.clone());

        assert!(matches!(notebook.login().await, Err(NotesError::AuthFailure(_))));
        assert!(!notebook.is_authenticated());
        assert_eq!(store.calls(StoreOp::List), 0);

        provider.fail_sign_in.store(false, Ordering::SeqCst);
        notebook.login().await.unwrap();
        assert!(notebook.is_authenticated());
        assert_eq!(provider.sign_ins.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_login_when_signed_in_is_noop() {
        let provider = ScriptedProvider::default();
        let mut notebook = Notebook::new(provider.clone(), MemoryStore::new());

        notebook.login().await.unwrap();
        notebook.login().await.unwrap();

        assert_eq!(provider.sign_ins.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_login_survives_failed_fetch() {
        let store = MemoryStore::new();
        store.set_failing(StoreOp::List, true);
        let mut notebook = Notebook::new(ScriptedProvider::default(), store.clone());

        notebook.login().await.unwrap();

        assert!(notebook.is_authenticated());
        assert!(notebook.notes().is_empty());
    }

    #[tokio::test]
    async fn test_add_appends_stored_note() {
        let store = MemoryStore::new();
        let mut notebook = signed_in(&store).await;

        let added = notebook.add("call mom").await.unwrap().unwrap();

        assert_eq!(added.text, "call mom");
        assert_eq!(added.owner_id.as_deref(), Some("u1"));
        assert_eq!(notebook.notes(), &[added.clone()]);
        assert_eq!(store.documents(), vec![added]);
    }

    #[tokio::test]
    async fn test_blank_add_is_noop() {
        let store = MemoryStore::new();
        let mut notebook = signed_in(&store).await;

        assert!(notebook.add("").await.unwrap().is_none());
        assert!(notebook.add("   ").await.unwrap().is_none());
        assert!(notebook.add("\n\t").await.unwrap().is_none());

        assert!(notebook.notes().is_empty());
        assert_eq!(store.calls(StoreOp::Create), 0);
    }

    #[tokio::test]
    async fn test_failed_add_keeps_local_state() {
        let store = MemoryStore::with_notes(vec![note("n1", "buy milk", "u1")]);
        let mut notebook = signed_in(&store).await;
        store.set_failing(StoreOp::Create, true);

        assert!(matches!(notebook.add("lost").await, Err(NotesError::CreateFailure(_))));
        assert_eq!(notebook.notes(), &[note("n1", "buy milk", "u1")]);
    }

    #[tokio::test]
    async fn test_remove_drops_exactly_one() {
        let store = MemoryStore::with_notes(vec![
            note("n1", "buy milk", "u1"),
            note("n2", "walk dog", "u1"),
        ]);
        let mut notebook = signed_in(&store).await;

        notebook.remove("n1").await.unwrap();

        assert_eq!(notebook.notes(), &[note("n2", "walk dog", "u1")]);
        assert_eq!(store.documents(), vec![note("n2", "walk dog", "u1")]);
    }

    #[tokio::test]
    async fn test_remove_unknown_id_still_calls_store() {
        let store = MemoryStore::with_notes(vec![note("n1", "buy milk", "u1")]);
        let mut notebook = signed_in(&store).await;

        notebook.remove("missing").await.unwrap();

        assert_eq!(notebook.notes().len(), 1);
        assert_eq!(store.calls(StoreOp::Delete), 1);
    }

    #[tokio::test]
    async fn test_failed_remove_keeps_local_state() {
        let store = MemoryStore::with_notes(vec![note("n1", "buy milk", "u1")]);
        let mut notebook = signed_in(&store).await;
        store.set_failing(StoreOp::Delete, true);

        assert!(matches!(notebook.remove("n1").await, Err(NotesError::DeleteFailure(_))));
        assert_eq!(notebook.notes().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_fetch_keeps_stale_notes() {
        let store = MemoryStore::with_notes(vec![note("n1", "buy milk", "u1")]);
        let mut notebook = signed_in(&store).await;
        store.set_failing(StoreOp::List, true);

        assert!(matches!(notebook.fetch_all().await, Err(NotesError::FetchFailure(_))));
        assert_eq!(notebook.notes(), &[note("n1", "buy milk", "u1")]);
    }

    #[tokio::test]
    async fn test_fetch_includes_other_owners() {
        let store = MemoryStore::with_notes(vec![
            note("n1", "mine", "u1"),
            note("n2", "theirs", "u2"),
        ]);
        let notebook = signed_in(&store).await;

        assert_eq!(notebook.notes().len(), 2);
    }

    #[tokio::test]
    async fn test_logout_clears_everything() {
        let provider = ScriptedProvider::default();
        let store = MemoryStore::with_notes(vec![note("n1", "buy milk", "u1")]);
        let mut notebook = Notebook::new(provider.clone(), store);
        notebook.login().await.unwrap();

        notebook.logout().await.unwrap();

        assert!(!notebook.is_authenticated());
        assert!(notebook.notes().is_empty());
        assert!(notebook.snapshot().user.is_none());
        assert_eq!(provider.sign_outs.load(Ordering::SeqCst), 1);

        // Signed out already: still succeeds, nothing to revoke.
        notebook.logout().await.unwrap();
        assert_eq!(provider.sign_outs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_logout_keeps_session() {
        let provider = ScriptedProvider::default();
        let store = MemoryStore::with_notes(vec![note("n1", "buy milk", "u1")]);
        let mut notebook = Notebook::new(provider.clone(), store);
        notebook.login().await.unwrap();
        provider.fail_sign_out.store(true, Ordering::SeqCst);

        assert!(matches!(notebook.logout().await, Err(NotesError::AuthFailure(_))));
        assert!(notebook.is_authenticated());
        assert_eq!(notebook.notes().len(), 1);
    }

    #[tokio::test]
    async fn test_add_then_remove_scenario() {
        let store = MemoryStore::with_notes(vec![Note {
            id: "n1".to_string(),
            text: "buy milk".to_string(),
            owner_id: None,
        }]);
        let mut notebook = signed_in(&store).await;

        let added = notebook.add("call mom").await.unwrap().unwrap();
        let ids: Vec<&str> = notebook.notes().iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["n1", added.id.as_str()]);

        notebook.remove("n1").await.unwrap();
        assert_eq!(notebook.notes(), &[added]);
    }

    #[tokio::test]
    async fn test_abandoned_consent_fails_login() {
        let store = MemoryStore::new();
        let mut notebook = Notebook::new(AbandonedConsent, store.clone());

        let result = notebook.login().await;

        assert!(matches!(
            result,
            Err(NotesError::AuthFailure(AuthError::Cancelled(_)))
        ));
        assert!(!notebook.is_authenticated());
        assert_eq!(notebook.snapshot(), NotebookSnapshot::default());
        assert_eq!(store.calls(StoreOp::List), 0);
    }

    #[tokio::test]
    async fn test_expired_token_is_renewed_before_store_calls() {
        let provider = ScriptedProvider::default();
        provider.issue_expired.store(true, Ordering::SeqCst);
        let store = MemoryStore::with_notes(vec![note("n1", "buy milk", "u1")]);
        let mut notebook = Notebook::new(provider.clone(), store.clone());

        notebook.login().await.unwrap();

        assert_eq!(provider.refreshes.load(Ordering::SeqCst), 1);
        assert_eq!(notebook.identity().unwrap().id_token, "renewed-id-token");
        assert_eq!(notebook.notes().len(), 1);

        // The renewed token is good for another hour.
        notebook.add("call mom").await.unwrap();
        notebook.remove("n1").await.unwrap();
        assert_eq!(provider.refreshes.load(Ordering::SeqCst), 1);
        assert_eq!(store.calls(StoreOp::Create), 1);
    }

    #[tokio::test]
    async fn test_failed_renewal_keeps_session() {
        let provider = ScriptedProvider::default();
        provider.issue_expired.store(true, Ordering::SeqCst);
        provider.fail_refresh.store(true, Ordering::SeqCst);
        let store = MemoryStore::with_notes(vec![note("n1", "buy milk", "u1")]);
        let mut notebook = Notebook::new(provider.clone(), store.clone());

        notebook.login().await.unwrap();
        assert!(notebook.notes().is_empty());

        assert!(matches!(
            notebook.add("lost").await,
            Err(NotesError::CreateFailure(StoreError::Unauthenticated))
        ));
        assert_eq!(store.calls(StoreOp::List), 0);
        assert_eq!(store.calls(StoreOp::Create), 0);
        assert!(notebook.is_authenticated());

        notebook.logout().await.unwrap();
        assert!(!notebook.is_authenticated());
        assert_eq!(provider.sign_outs.load(Ordering::SeqCst), 1);
    }

    fn texts(snapshot: &NotebookSnapshot) -> Vec<&str> {
        snapshot.notes.iter().map(|n| n.text.as_str()).collect()
    }

    #[tokio::test]
    async fn test_queued_commands_apply_in_order() {
        let store = MemoryStore::with_notes(vec![note("n1", "buy milk", "u1")]);
        let mut notebook = Notebook::new(ScriptedProvider::default(), store.clone());

        let (queue, mut commands) = tokio::sync::mpsc::unbounded_channel();
        for command in [
            NotebookCommand::Login,
            NotebookCommand::Add("call mom".to_string()),
            NotebookCommand::Remove("n1".to_string()),
            NotebookCommand::Logout,
        ] {
            queue.send(command).unwrap();
        }
        drop(queue);

        let mut snapshots = Vec::new();
        let mut added = 0;
        while let Some(command) = commands.recv().await {
            if notebook.apply(command).await {
                added += 1;
            }
            snapshots.push(notebook.snapshot());
        }

        assert_eq!(snapshots.len(), 4);
        assert_eq!(snapshots[0].user.as_ref().unwrap().display_name(), "Ann");
        assert_eq!(texts(&snapshots[0]), ["buy milk"]);
        assert_eq!(texts(&snapshots[1]), ["buy milk", "call mom"]);
        assert_eq!(texts(&snapshots[2]), ["call mom"]);
        assert_eq!(snapshots[3], NotebookSnapshot::default());
        assert_eq!(added, 1);

        let remaining = store.documents();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].text, "call mom");
    }

    #[tokio::test]
    async fn test_apply_reports_only_stored_adds() {
        let store = MemoryStore::new();
        let mut notebook = Notebook::new(ScriptedProvider::default(), store.clone());

        assert!(!notebook.apply(NotebookCommand::Add("early".to_string())).await);
        assert!(!notebook.apply(NotebookCommand::Login).await);
        assert!(!notebook.apply(NotebookCommand::Add("   ".to_string())).await);

        store.set_failing(StoreOp::Create, true);
        assert!(!notebook.apply(NotebookCommand::Add("lost".to_string())).await);

        store.set_failing(StoreOp::Create, false);
        assert!(notebook.apply(NotebookCommand::Add("kept".to_string())).await);
        assert_eq!(texts(&notebook.snapshot()), ["kept"]);
    }
}
