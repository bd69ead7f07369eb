mod notes_page;
pub use notes_page::NotesPage;
