use dioxus::prelude::*;

use crate::auth::{LoginButton, LogoutButton};
use crate::note_composer::NoteComposer;
use crate::note_list::NoteList;
use crate::notebook::{use_notebook, use_notebook_queue, NotebookCommand};

/// The whole app: a login button while signed out, the notes once signed in.
#[component]
pub fn NotesPage() -> Element {
    let notebook = use_notebook();
    let queue = use_notebook_queue();
    let state = notebook();

    let body = match state.snapshot.user {
        Some(user) => {
            let name = user.display_name().to_string();
            rsx! {
                div {
                    p { "Welcome, {name}" }
                    LogoutButton {}
                    NoteComposer {}
                    NoteList {
                        notes: state.snapshot.notes,
                        on_delete: move |id: String| queue.send(NotebookCommand::Remove(id)),
                    }
                }
            }
        }
        None => rsx! {
            LoginButton {}
        },
    };

    rsx! {
        div {
            style: "padding: 20px; font-family: Arial;",
            h1 { "Notes App" }
            {body}
        }
    }
}
