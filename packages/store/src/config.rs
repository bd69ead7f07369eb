//! # Firebase project configuration
//!
//! The six parameters a Firebase web app is initialised with, read once at
//! startup and handed to the services that need them. Sources, later ones
//! overriding earlier ones:
//!
//! 1. an optional `notes.toml` in the working directory
//! 2. `FIREBASE_*` environment variables (`FIREBASE_API_KEY`, `FIREBASE_PROJECT_ID`, ...)
//!
//! ```toml
//! api_key = "AIza..."
//! auth_domain = "my-notes.firebaseapp.com"
//! project_id = "my-notes"
//! storage_bucket = "my-notes.appspot.com"
//! messaging_sender_id = "1234567890"
//! app_id = "1:1234567890:web:abc"
//! ```
//!
//! Missing values are left empty rather than rejected. A misconfigured
//! project therefore starts normally and fails on its first remote call.
//!
//! `FIRESTORE_EMULATOR_HOST` (e.g. `localhost:8080`) is honoured the same way
//! the Firebase SDKs honour it: when set, the document store is reached over
//! plain HTTP at that host. `FIREBASE_AUTH_EMULATOR_HOST` does the same for
//! sign-in and token refresh.

use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

/// Firebase web app configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FirebaseConfig {
    pub api_key: String,
    pub auth_domain: String,
    pub project_id: String,
    pub storage_bucket: String,
    pub messaging_sender_id: String,
    pub app_id: String,
    /// Local Firestore emulator, `host:port`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub firestore_emulator_host: Option<String>,
    /// Local Authentication emulator, `host:port`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_emulator_host: Option<String>,
}

impl FirebaseConfig {
    /// The optional configuration file looked up in the working directory.
    pub fn filename() -> &'static str {
        "notes.toml"
    }

    /// Load from `notes.toml` and the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(
                File::with_name(Self::filename())
                    .format(FileFormat::Toml)
                    .required(false),
            )
            .add_source(Environment::with_prefix("FIREBASE"))
            .build()?;

        let mut firebase: Self = config.try_deserialize()?;
        if let Ok(host) = std::env::var("FIRESTORE_EMULATOR_HOST") {
            firebase.firestore_emulator_host = Some(host);
        }
        firebase.firestore_emulator_host = non_blank(firebase.firestore_emulator_host);
        firebase.auth_emulator_host = non_blank(firebase.auth_emulator_host);
        Ok(firebase)
    }

    /// Parse from TOML string.
    pub fn from_toml(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }

    /// Keys that are still empty. Used for a startup warning only.
    pub fn missing_keys(&self) -> Vec<&'static str> {
        [
            ("api_key", &self.api_key),
            ("auth_domain", &self.auth_domain),
            ("project_id", &self.project_id),
            ("storage_bucket", &self.storage_bucket),
            ("messaging_sender_id", &self.messaging_sender_id),
            ("app_id", &self.app_id),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(key, _)| key)
        .collect()
    }
}

fn non_blank(host: Option<String>) -> Option<String> {
    host.filter(|host| !host.trim().is_empty())
}
