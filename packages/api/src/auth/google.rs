//! # Google OAuth 2.0 for an installed app
//!
//! Authorization Code flow with PKCE, redirecting to a loopback address the
//! way Google documents for desktop clients.
//!
//! ## Flow
//!
//! 1. **[`authorize_url`](GoogleOAuth::authorize_url)** builds the consent URL for
//!    the `openid`, `email` and `profile` scopes with a fresh CSRF state and
//!    PKCE challenge. The verifier stays with the caller; nothing is persisted.
//! 2. **[`exchange_code`](GoogleOAuth::exchange_code)** trades the code from the
//!    loopback callback plus the verifier for an access token.
//! 3. **[`revoke`](GoogleOAuth::revoke)** revokes that access token on sign-out.
//!    A token Google already considers invalid (expired after about an hour,
//!    or revoked elsewhere) counts as revoked.

use oauth2::basic::{BasicClient, BasicErrorResponseType};
use oauth2::{
    AccessToken, AuthorizationCode, CsrfToken, EndpointNotSet, EndpointSet, PkceCodeChallenge,
    PkceCodeVerifier, RedirectUrl, RequestTokenError, RevocationErrorResponseType, Scope,
    StandardRevocableToken, TokenResponse,
};

use super::config::OAuthConfig;
use crate::error::AuthError;

/// OAuth client type with auth, token and revocation URLs set.
type ConfiguredClient = oauth2::Client<
    oauth2::basic::BasicErrorResponse,
    oauth2::basic::BasicTokenResponse,
    oauth2::basic::BasicTokenIntrospectionResponse,
    oauth2::StandardRevocableToken,
    oauth2::basic::BasicRevocationErrorResponse,
    EndpointSet,
    EndpointNotSet,
    EndpointNotSet,
    EndpointSet,
    EndpointSet,
>;

/// A consent URL plus the secrets needed to finish the flow.
pub struct AuthorizationRequest {
    pub url: url::Url,
    pub state: CsrfToken,
    pub pkce_verifier: PkceCodeVerifier,
}

/// Google OAuth handler.
#[derive(Clone, Debug)]
pub struct GoogleOAuth {
    config: OAuthConfig,
    http: reqwest::Client,
}

impl GoogleOAuth {
    pub fn new(config: OAuthConfig, http: reqwest::Client) -> Self {
        Self { config, http }
    }

    pub fn config(&self) -> &OAuthConfig {
        &self.config
    }

    fn create_client(&self) -> ConfiguredClient {
        let client = BasicClient::new(self.config.client_id.clone())
            .set_auth_uri(self.config.auth_url.clone())
            .set_token_uri(self.config.token_url.clone())
            .set_revocation_url(self.config.revocation_url.clone());
        match &self.config.client_secret {
            Some(secret) => client.set_client_secret(secret.clone()),
            None => client,
        }
    }

    /// Generate the consent URL with PKCE for the given redirect.
    pub fn authorize_url(&self, redirect_url: RedirectUrl) -> AuthorizationRequest {
        let (pkce_challenge, pkce_verifier) = PkceCodeChallenge::new_random_sha256();

        let (url, state) = self
            .create_client()
            .set_redirect_uri(redirect_url)
            .authorize_url(CsrfToken::new_random)
            .add_scope(Scope::new("openid".to_string()))
            .add_scope(Scope::new("email".to_string()))
            .add_scope(Scope::new("profile".to_string()))
            .add_extra_param("prompt", "select_account")
            .set_pkce_challenge(pkce_challenge)
            .url();

        AuthorizationRequest {
            url,
            state,
            pkce_verifier,
        }
    }

    /// Exchange an authorization code for an access token.
    pub async fn exchange_code(
        &self,
        code: String,
        pkce_verifier: PkceCodeVerifier,
        redirect_url: RedirectUrl,
    ) -> Result<AccessToken, AuthError> {
        let token = self
            .create_client()
            .set_redirect_uri(redirect_url)
            .exchange_code(AuthorizationCode::new(code))
            .set_pkce_verifier(pkce_verifier)
            .request_async(&self.http)
            .await
            .map_err(|e| AuthError::OAuth(format!("Token exchange failed: {e}")))?;

        Ok(token.access_token().clone())
    }

    /// Revoke a previously issued access token.
    pub async fn revoke(&self, access_token: &str) -> Result<(), AuthError> {
        let token = StandardRevocableToken::AccessToken(AccessToken::new(access_token.to_string()));
        let result = self
            .create_client()
            .revoke_token(token)
            .map_err(|e| AuthError::Config(e.to_string()))?
            .request_async(&self.http)
            .await;

        match result {
            Ok(()) => Ok(()),
            Err(RequestTokenError::ServerResponse(response))
                if already_invalid(response.error()) =>
            {
                tracing::debug!("Access token was already invalid: {}", response);
                Ok(())
            }
            Err(e) => Err(AuthError::OAuth(format!("Token revocation failed: {e}"))),
        }
    }
}

/// Google answers `invalid_token` for tokens that expired or were revoked before.
fn already_invalid(error: &RevocationErrorResponseType) -> bool {
    matches!(
        error,
        RevocationErrorResponseType::Basic(BasicErrorResponseType::Extension(code))
            if code == "invalid_token"
    )
}
