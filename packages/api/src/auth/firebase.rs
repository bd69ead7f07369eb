//! Firebase Authentication via the Identity Toolkit REST API.
//!
//! A Google access token obtained by [`super::GoogleOAuth`] is exchanged at
//! `accounts:signInWithIdp` for a Firebase user. The returned `idToken` is what
//! Firestore security rules see as `request.auth`.
//!
//! That ID token lasts about an hour. [`FirebaseAuth::refresh`] trades the
//! refresh token issued alongside it at the secure token endpoint for a new one.

use std::time::{Duration, SystemTime};

use serde::{Deserialize, Serialize};
use store::{FirebaseConfig, Identity};

use crate::error::AuthError;

const IDENTITY_TOOLKIT_URL: &str = "https://identitytoolkit.googleapis.com/v1";

const SECURE_TOKEN_URL: &str = "https://securetoken.googleapis.com/v1";

const GOOGLE_PROVIDER_ID: &str = "google.com";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SignInWithIdpRequest<'a> {
    post_body: String,
    request_uri: &'a str,
    return_secure_token: bool,
    return_idp_credential: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignInWithIdpResponse {
    local_id: String,
    id_token: String,
    #[serde(default)]
    refresh_token: String,
    /// Seconds, as a decimal string
    #[serde(default)]
    expires_in: Option<String>,
    display_name: Option<String>,
    #[serde(default)]
    full_name: Option<String>,
    email: Option<String>,
}

/// The secure token endpoint answers in snake_case, unlike the Identity Toolkit.
#[derive(Debug, Deserialize)]
struct RefreshTokenResponse {
    id_token: String,
    refresh_token: String,
    #[serde(default)]
    expires_in: Option<String>,
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

/// Firebase Authentication client.
#[derive(Clone, Debug)]
pub struct FirebaseAuth {
    http: reqwest::Client,
    sign_in_endpoint: String,
    refresh_endpoint: String,
    api_key: String,
}

impl FirebaseAuth {
    /// Hosted endpoints, or the Authentication emulator when one is configured.
    pub fn new(config: &FirebaseConfig, http: reqwest::Client) -> Self {
        let (identity_toolkit, secure_token) = match &config.auth_emulator_host {
            Some(host) => {
                let host = host.trim_end_matches('/');
                (
                    format!("http://{host}/identitytoolkit.googleapis.com/v1"),
                    format!("http://{host}/securetoken.googleapis.com/v1"),
                )
            }
            None => (IDENTITY_TOOLKIT_URL.to_string(), SECURE_TOKEN_URL.to_string()),
        };
        Self {
            http,
            sign_in_endpoint: format!("{identity_toolkit}/accounts:signInWithIdp"),
            refresh_endpoint: format!("{secure_token}/token"),
            api_key: config.api_key.clone(),
        }
    }

    /// Sign in to Firebase with a Google OAuth access token.
    pub async fn sign_in_with_google(
        &self,
        access_token: &str,
        request_uri: &str,
    ) -> Result<Identity, AuthError> {
        let body = SignInWithIdpRequest {
            post_body: format!("access_token={access_token}&providerId={GOOGLE_PROVIDER_ID}"),
            request_uri,
            return_secure_token: true,
            return_idp_credential: true,
        };

        let response = self
            .http
            .post(&self.sign_in_endpoint)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await?;

        let user: SignInWithIdpResponse = check(response).await?.json().await?;
        Ok(identity_from_response(user, access_token, SystemTime::now()))
    }

    /// Trade the refresh token of `identity` for a new ID token.
    ///
    /// Everything but the tokens and their expiry is carried over.
    pub async fn refresh(&self, identity: &Identity) -> Result<Identity, AuthError> {
        if identity.refresh_token.is_empty() {
            return Err(AuthError::SessionExpired);
        }

        let response = self
            .http
            .post(&self.refresh_endpoint)
            .query(&[("key", self.api_key.as_str())])
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", identity.refresh_token.as_str()),
            ])
            .send()
            .await?;

        let tokens: RefreshTokenResponse = check(response).await?.json().await?;
        tracing::debug!("Refreshed ID token for {}", identity.id);
        Ok(Identity {
            id_token: tokens.id_token,
            refresh_token: tokens.refresh_token,
            expires_at: expiry(tokens.expires_in.as_deref(), SystemTime::now()),
            ..identity.clone()
        })
    }
}

/// Turn an error status into [`AuthError::Api`] with Firebase's message.
async fn check(response: reqwest::Response) -> Result<reqwest::Response, AuthError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorEnvelope>(&text)
        .map(|e| e.error.message)
        .unwrap_or(text);
    Err(AuthError::Api {
        status: status.as_u16(),
        message,
    })
}

fn expiry(expires_in: Option<&str>, now: SystemTime) -> Option<SystemTime> {
    let secs = expires_in?.trim().parse::<u64>().ok()?;
    Some(now + Duration::from_secs(secs))
}

fn identity_from_response(
    user: SignInWithIdpResponse,
    access_token: &str,
    now: SystemTime,
) -> Identity {
    Identity {
        id: user.local_id,
        display_name: user.display_name.or(user.full_name),
        email: user.email,
        id_token: user.id_token,
        refresh_token: user.refresh_token,
        expires_at: expiry(user.expires_in.as_deref(), now),
        provider_token: access_token.to_string(),
    }
}
