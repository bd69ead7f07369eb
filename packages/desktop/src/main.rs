use dioxus::prelude::*;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let firebase = store::FirebaseConfig::load()?;
    let missing = firebase.missing_keys();
    if !missing.is_empty() {
        tracing::warn!("Firebase configuration incomplete, missing: {}", missing.join(", "));
    }
    if let Some(host) = &firebase.firestore_emulator_host {
        tracing::info!("Using Firestore emulator at {}", host);
    }
    if let Some(host) = &firebase.auth_emulator_host {
        tracing::info!("Using Authentication emulator at {}", host);
    }

    let oauth = api::OAuthConfig::google()?;
    let services = api::Services::new(&firebase, oauth)?;

    dioxus::LaunchBuilder::new()
        .with_context(services)
        .launch(App);
    Ok(())
}

#[component]
fn App() -> Element {
    rsx! {
        document::Title { "Notes App" }
        ui::NotebookProvider {
            ui::views::NotesPage {}
        }
    }
}
