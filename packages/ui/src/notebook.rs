//! Notebook context: a single-writer command queue around [`api::Notebook`].
//!
//! [`NotebookProvider`] spawns one coroutine that owns the notebook. Buttons
//! and forms never touch it directly; they send a [`NotebookCommand`] and the
//! coroutine applies commands strictly one after another, publishing a fresh
//! [`NotebookState`] after each. A delete can therefore never race a fetch.

pub use api::NotebookCommand;

use api::{NotebookSnapshot, Services};
use dioxus::prelude::*;
use futures_util::StreamExt;

/// What the views render.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NotebookState {
    pub snapshot: NotebookSnapshot,
    /// A command is being applied.
    pub busy: bool,
    /// Bumped after every successful add.
    pub added: u64,
}

/// Get the current notebook state.
pub fn use_notebook() -> Signal<NotebookState> {
    use_context::<Signal<NotebookState>>()
}

/// Handle for sending commands to the notebook.
pub fn use_notebook_queue() -> Coroutine<NotebookCommand> {
    use_coroutine_handle::<NotebookCommand>()
}

/// Provider component that owns the notebook.
/// Requires [`api::Services`] in context.
#[component]
pub fn NotebookProvider(children: Element) -> Element {
    let services = use_context::<Services>();
    let mut state = use_signal(NotebookState::default);

    use_coroutine(move |mut rx: UnboundedReceiver<NotebookCommand>| {
        let mut notebook = services.notebook();
        async move {
            while let Some(command) = rx.next().await {
                state.write().busy = true;
                let added = notebook.apply(command).await;

                let mut current = state.write();
                current.snapshot = notebook.snapshot();
                current.busy = false;
                if added {
                    current.added += 1;
                }
            }
        }
    });

    use_context_provider(|| state);

    rsx! {
        {children}
    }
}
