pub mod config;
pub mod error;
pub mod models;
pub mod repo;

mod firestore;
pub use firestore::{FirestoreStore, NOTES_COLLECTION};

mod memory;
pub use memory::{MemoryStore, StoreOp};

pub use config::FirebaseConfig;
pub use error::StoreError;
pub use models::{Identity, NewNote, Note, TOKEN_EXPIRY_MARGIN};
pub use repo::NoteCollection;
