//! # Cloud Firestore REST store
//!
//! [`FirestoreStore`] implements [`NoteCollection`] against the Firestore REST
//! API (`v1`). All documents live in a single top-level collection:
//!
//! ```text
//! projects/{project_id}/databases/(default)/documents/notes/{note_id}
//! ```
//!
//! | Operation | Request |
//! |-----------|---------|
//! | `list_all` | `GET .../documents/notes`, following `nextPageToken` until exhausted |
//! | `create` | `POST .../documents/notes` with `text` and `userId` string fields; the id is assigned by Firestore |
//! | `delete` | `DELETE .../documents/notes/{id}` |
//!
//! Requests are authorised with the signed-in identity's Firebase ID token
//! (`Authorization: Bearer`) and carry the project API key as `key`.
//!
//! ## Documents
//!
//! Firestore wraps each field in a typed value (`{"stringValue": "..."}`).
//! Only string fields are read. A listed document without a `text` string is
//! skipped with a warning; a create response without one is an error, since
//! the note it describes cannot be displayed.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::config::FirebaseConfig;
use crate::error::StoreError;
use crate::models::{Identity, NewNote, Note};
use crate::repo::NoteCollection;

/// Hosted Firestore endpoint.
const FIRESTORE_HOST: &str = "https://firestore.googleapis.com";

/// Collection holding every note.
pub const NOTES_COLLECTION: &str = "notes";

/// Firestore-backed NoteCollection.
#[derive(Clone, Debug)]
pub struct FirestoreStore {
    client: reqwest::Client,
    collection_url: String,
    api_key: String,
}

/// A typed Firestore value. Only strings are used by notes.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Value {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    string_value: Option<String>,
}

impl Value {
    fn string(s: impl Into<String>) -> Self {
        Self {
            string_value: Some(s.into()),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct Document {
    #[serde(default)]
    name: String,
    #[serde(default)]
    fields: HashMap<String, Value>,
}

#[derive(Debug, Serialize)]
struct WriteDocument {
    fields: HashMap<String, Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListDocumentsResponse {
    #[serde(default)]
    documents: Vec<Document>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

impl Document {
    /// Document id: the last segment of the resource name.
    fn id(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or_default()
    }

    fn string_field(&self, key: &str) -> Option<&str> {
        self.fields.get(key)?.string_value.as_deref()
    }
}

impl TryFrom<Document> for Note {
    type Error = StoreError;

    fn try_from(doc: Document) -> Result<Self, Self::Error> {
        let id = doc.id();
        if id.is_empty() {
            return Err(StoreError::MalformedDocument {
                name: doc.name.clone(),
                reason: "missing document name".to_string(),
            });
        }
        let Some(text) = doc.string_field("text") else {
            return Err(StoreError::MalformedDocument {
                name: doc.name.clone(),
                reason: "missing text field".to_string(),
            });
        };
        Ok(Note {
            id: id.to_string(),
            text: text.to_string(),
            owner_id: doc.string_field("userId").map(str::to_string),
        })
    }
}

impl From<NewNote> for WriteDocument {
    fn from(note: NewNote) -> Self {
        let mut fields = HashMap::new();
        fields.insert("text".to_string(), Value::string(note.text));
        fields.insert("userId".to_string(), Value::string(note.owner_id));
        Self { fields }
    }
}

impl FirestoreStore {
    /// Create a store for the configured project.
    pub fn new(config: &FirebaseConfig) -> Self {
        Self::with_client(reqwest::Client::new(), config)
    }

    pub fn with_client(client: reqwest::Client, config: &FirebaseConfig) -> Self {
        let host = match &config.firestore_emulator_host {
            Some(host) => format!("http://{}", host.trim_end_matches('/')),
            None => FIRESTORE_HOST.to_string(),
        };
        Self {
            client,
            collection_url: collection_url(&host, &config.project_id),
            api_key: config.api_key.clone(),
        }
    }

    /// Full URL of the notes collection.
    pub fn collection_url(&self) -> &str {
        &self.collection_url
    }

    fn document_url(&self, id: &str) -> Result<String, StoreError> {
        if id.is_empty() || id.contains('/') {
            return Err(StoreError::InvalidId(id.to_string()));
        }
        Ok(format!("{}/{}", self.collection_url, id))
    }

    fn authorise(
        &self,
        request: reqwest::RequestBuilder,
        identity: &Identity,
    ) -> reqwest::RequestBuilder {
        request
            .bearer_auth(&identity.id_token)
            .query(&[("key", self.api_key.as_str())])
    }
}

fn collection_url(host: &str, project_id: &str) -> String {
    format!("{host}/v1/projects/{project_id}/databases/(default)/documents/{NOTES_COLLECTION}")
}

/// Turn a non-success response into a [`StoreError`].
async fn check(response: reqwest::Response) -> Result<reqwest::Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
        tracing::debug!("Firestore rejected credentials: {}", status);
        return Err(StoreError::Unauthenticated);
    }
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorEnvelope>(&body)
        .map(|e| e.error.message)
        .unwrap_or(body);
    Err(StoreError::Api {
        status: status.as_u16(),
        message,
    })
}

impl NoteCollection for FirestoreStore {
    async fn list_all(&self, identity: &Identity) -> Result<Vec<Note>, StoreError> {
        let mut notes = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut request = self.authorise(self.client.get(&self.collection_url), identity);
            if let Some(token) = &page_token {
                request = request.query(&[("pageToken", token.as_str())]);
            }
            let page: ListDocumentsResponse = check(request.send().await?).await?.json().await?;

            for doc in page.documents {
                match Note::try_from(doc) {
                    Ok(note) => notes.push(note),
                    Err(e) => tracing::warn!("Skipping note document: {}", e),
                }
            }

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        tracing::debug!("Listed {} notes", notes.len());
        Ok(notes)
    }

    async fn create(&self, identity: &Identity, note: NewNote) -> Result<Note, StoreError> {
        let body = WriteDocument::from(note);
        let request = self.authorise(self.client.post(&self.collection_url), identity);
        let doc: Document = check(request.json(&body).send().await?).await?.json().await?;
        Note::try_from(doc)
    }

    async fn delete(&self, identity: &Identity, id: &str) -> Result<(), StoreError> {
        let url = self.document_url(id)?;
        let request = self.authorise(self.client.delete(url), identity);
        check(request.send().await?).await?;
        Ok(())
    }
}
