//! OAuth configuration from environment variables.

use std::time::Duration;

use oauth2::{AuthUrl, ClientId, ClientSecret, RevocationUrl, TokenUrl};

use crate::error::AuthError;

/// OAuth provider configuration.
///
/// The redirect URL is not part of it: the loopback listener picks its port
/// when sign-in starts and the redirect is derived from that.
#[derive(Debug, Clone)]
pub struct OAuthConfig {
    pub client_id: ClientId,
    pub client_secret: Option<ClientSecret>,
    pub auth_url: AuthUrl,
    pub token_url: TokenUrl,
    pub revocation_url: RevocationUrl,
    /// Loopback port for the redirect. 0 lets the OS choose.
    pub redirect_port: u16,
    /// How long the consent page may stay open before sign-in is abandoned.
    pub sign_in_timeout: Duration,
}

/// Default for `AUTH_TIMEOUT_SECS`.
pub const DEFAULT_SIGN_IN_TIMEOUT: Duration = Duration::from_secs(300);

impl OAuthConfig {
    /// Create Google OAuth config from environment variables.
    ///
    /// `AUTH_REDIRECT_PORT` pins the loopback port and `AUTH_TIMEOUT_SECS`
    /// bounds the wait for the consent page (five minutes when unset).
    ///
    /// `GOOGLE_CLIENT_ID` and `GOOGLE_CLIENT_SECRET` are read but not required;
    /// an unset client id only fails once the consent screen rejects it.
    pub fn google() -> Result<Self, AuthError> {
        dotenvy::dotenv().ok();

        let client_id = std::env::var("GOOGLE_CLIENT_ID").unwrap_or_default();
        let client_secret = std::env::var("GOOGLE_CLIENT_SECRET")
            .ok()
            .filter(|s| !s.is_empty());
        let redirect_port = match std::env::var("AUTH_REDIRECT_PORT") {
            Ok(port) => port
                .parse()
                .map_err(|_| AuthError::Config(format!("invalid AUTH_REDIRECT_PORT: {port}")))?,
            Err(_) => 0,
        };
        let sign_in_timeout = match std::env::var("AUTH_TIMEOUT_SECS") {
            Ok(secs) => secs
                .parse()
                .map(Duration::from_secs)
                .map_err(|_| AuthError::Config(format!("invalid AUTH_TIMEOUT_SECS: {secs}")))?,
            Err(_) => DEFAULT_SIGN_IN_TIMEOUT,
        };

        Ok(Self {
            client_id: ClientId::new(client_id),
            client_secret: client_secret.map(ClientSecret::new),
            auth_url: AuthUrl::new("https://accounts.google.com/o/oauth2/v2/auth".to_string())
                .map_err(|e| AuthError::Config(e.to_string()))?,
            token_url: TokenUrl::new("https://oauth2.googleapis.com/token".to_string())
                .map_err(|e| AuthError::Config(e.to_string()))?,
            revocation_url: RevocationUrl::new("https://oauth2.googleapis.com/revoke".to_string())
                .map_err(|e| AuthError::Config(e.to_string()))?,
            redirect_port,
            sign_in_timeout,
        })
    }
}
