use dioxus::prelude::*;
use store::Note;

/// The notes, in the order the store returned them, each with a delete button.
#[component]
pub fn NoteList(notes: Vec<Note>, on_delete: EventHandler<String>) -> Element {
    rsx! {
        ul {
            class: "note-list",
            for note in notes {
                NoteItem {
                    key: "{note.id}",
                    note: note.clone(),
                    on_delete: on_delete,
                }
            }
        }
    }
}

#[component]
fn NoteItem(note: Note, on_delete: EventHandler<String>) -> Element {
    let id = note.id.clone();

    rsx! {
        li {
            "{note.text} "
            button {
                onclick: move |_| on_delete.call(id.clone()),
                "Delete"
            }
        }
    }
}
