use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::error::StoreError;
use crate::models::{Identity, NewNote, Note};
use crate::repo::NoteCollection;

/// Remote operation selector for failure injection and call counts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StoreOp {
    List,
    Create,
    Delete,
}

#[derive(Debug, Default)]
struct OpState {
    failing: AtomicBool,
    calls: AtomicUsize,
}

/// In-memory NoteCollection for tests and offline runs.
///
/// Clones share the same documents, so a test can keep one handle for
/// inspection while the notebook owns another.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    notes: Arc<Mutex<Vec<Note>>>,
    next_id: Arc<AtomicUsize>,
    list: Arc<OpState>,
    create: Arc<OpState>,
    delete: Arc<OpState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with documents, as if other sessions wrote them.
    pub fn with_notes(notes: Vec<Note>) -> Self {
        let store = Self::default();
        *store.notes.lock().unwrap() = notes;
        store
    }

    /// Make every subsequent call of `op` fail until reset.
    pub fn set_failing(&self, op: StoreOp, failing: bool) {
        self.op(op).failing.store(failing, Ordering::SeqCst);
    }

    /// Number of times `op` has been invoked, failed calls included.
    pub fn calls(&self, op: StoreOp) -> usize {
        self.op(op).calls.load(Ordering::SeqCst)
    }

    /// Documents currently held, in insertion order.
    pub fn documents(&self) -> Vec<Note> {
        self.notes.lock().unwrap().clone()
    }

    fn op(&self, op: StoreOp) -> &OpState {
        match op {
            StoreOp::List => &self.list,
            StoreOp::Create => &self.create,
            StoreOp::Delete => &self.delete,
        }
    }

    fn enter(&self, op: StoreOp) -> Result<(), StoreError> {
        let state = self.op(op);
        state.calls.fetch_add(1, Ordering::SeqCst);
        if state.failing.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable);
        }
        Ok(())
    }
}

impl NoteCollection for MemoryStore {
    async fn list_all(&self, _identity: &Identity) -> Result<Vec<Note>, StoreError> {
        self.enter(StoreOp::List)?;
        Ok(self.notes.lock().unwrap().clone())
    }

    async fn create(&self, _identity: &Identity, note: NewNote) -> Result<Note, StoreError> {
        self.enter(StoreOp::Create)?;
        let id = format!("note-{}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        let stored = Note {
            id,
            text: note.text,
            owner_id: Some(note.owner_id),
        };
        self.notes.lock().unwrap().push(stored.clone());
        Ok(stored)
    }

    async fn delete(&self, _identity: &Identity, id: &str) -> Result<(), StoreError> {
        self.enter(StoreOp::Delete)?;
        self.notes.lock().unwrap().retain(|n| n.id != id);
        Ok(())
    }
}
