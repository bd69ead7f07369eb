//! # Note collection — the seam between notebook state and the document store
//!
//! [`NoteCollection`] is an async interface with three methods matching the
//! remote operations the app performs: list every document, create one with a
//! store-assigned id, and delete one by id. Every call carries the signed-in
//! [`Identity`] so implementations can authorise the request.
//!
//! Implementations live in sibling modules: [`crate::memory`] for tests and
//! [`crate::firestore`] for the hosted store.
//!
//! Nothing here guarantees ordering; listings come back in whatever order the
//! store produces.

use crate::error::StoreError;
use crate::models::{Identity, NewNote, Note};

/// Async trait for the remote `notes` collection.
pub trait NoteCollection {
    /// Fetch every note in the collection. Not filtered by owner.
    fn list_all(
        &self,
        identity: &Identity,
    ) -> impl std::future::Future<Output = Result<Vec<Note>, StoreError>>;

    /// Create a note and return it as stored, with its new id.
    fn create(
        &self,
        identity: &Identity,
        note: NewNote,
    ) -> impl std::future::Future<Output = Result<Note, StoreError>>;

    /// Delete a note by id. Deleting an id that does not exist succeeds.
    fn delete(
        &self,
        identity: &Identity,
        id: &str,
    ) -> impl std::future::Future<Output = Result<(), StoreError>>;
}
