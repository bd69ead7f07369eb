//! This crate contains all shared UI for the workspace.

pub mod views;

mod notebook;
pub use notebook::{
    use_notebook, use_notebook_queue, NotebookCommand, NotebookProvider, NotebookState,
};

mod auth;
pub use auth::{LoginButton, LogoutButton};

mod note_composer;
pub use note_composer::NoteComposer;

mod note_list;
pub use note_list::NoteList;
