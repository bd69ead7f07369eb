use dioxus::prelude::*;

use crate::notebook::{use_notebook, use_notebook_queue, NotebookCommand};

/// Text input plus "Add Note" button.
///
/// The draft is cleared only once the note was actually stored; a failed add
/// leaves it in place.
#[component]
pub fn NoteComposer() -> Element {
    let notebook = use_notebook();
    let queue = use_notebook_queue();
    let mut draft = use_signal(String::new);

    let added = use_memo(move || notebook.read().added);
    use_effect(move || {
        if added() > 0 {
            draft.set(String::new());
        }
    });

    let submit = move || {
        let text = draft();
        if text.trim().is_empty() {
            return;
        }
        queue.send(NotebookCommand::Add(text));
    };

    rsx! {
        div {
            class: "note-composer",
            input {
                r#type: "text",
                placeholder: "Write a note...",
                value: draft(),
                oninput: move |evt: FormEvent| draft.set(evt.value()),
                onkeydown: move |evt: KeyboardEvent| {
                    if evt.key() == Key::Enter {
                        submit();
                    }
                },
            }
            button {
                onclick: move |_| submit(),
                "Add Note"
            }
        }
    }
}
