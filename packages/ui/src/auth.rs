//! Sign-in and sign-out buttons.

use dioxus::prelude::*;

use crate::notebook::{use_notebook, use_notebook_queue, NotebookCommand};

/// Button to start the Google sign-in flow.
#[component]
pub fn LoginButton(
    #[props(default = "Login with Google".to_string())] label: String,
    #[props(default = "".to_string())] class: String,
) -> Element {
    let notebook = use_notebook();
    let queue = use_notebook_queue();
    let busy = notebook().busy;

    rsx! {
        button {
            class: "{class}",
            disabled: busy,
            onclick: move |_| queue.send(NotebookCommand::Login),
            if busy {
                "Waiting for sign-in..."
            } else {
                "{label}"
            }
        }
    }
}

/// Button to log out the current user.
#[component]
pub fn LogoutButton(
    #[props(default = "Logout".to_string())] label: String,
    #[props(default = "".to_string())] class: String,
) -> Element {
    let queue = use_notebook_queue();

    rsx! {
        button {
            class: "{class}",
            onclick: move |_| queue.send(NotebookCommand::Logout),
            "{label}"
        }
    }
}
