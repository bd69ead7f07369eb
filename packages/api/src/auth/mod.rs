//! Authentication: the [`IdentityProvider`] seam and its Google/Firebase implementation.
//!
//! [`GoogleSignIn::sign_in`] runs the whole interactive flow:
//!
//! 1. bind a [`LoopbackServer`] and derive the redirect URL from its port
//! 2. open the Google consent page in the system browser
//! 3. wait for the redirect (bounded by [`OAuthConfig::sign_in_timeout`]),
//!    check the CSRF state, take the code
//! 4. exchange the code (with the PKCE verifier) for a Google access token
//! 5. exchange that token with Firebase for an [`Identity`]
//!
//! [`GoogleSignIn::refresh`] renews the hour-long Firebase ID token.
//!
//! [`GoogleSignIn::sign_out`] revokes the Google access token. Firebase ID
//! tokens are not revocable client-side; they are simply dropped.

mod config;
mod firebase;
mod google;
mod loopback;

pub use config::OAuthConfig;
pub use firebase::FirebaseAuth;
pub use google::{AuthorizationRequest, GoogleOAuth};
pub use loopback::LoopbackServer;

use store::Identity;

use crate::error::AuthError;

/// Async trait for an interactive identity provider.
pub trait IdentityProvider {
    /// Run the sign-in flow and return the signed-in identity.
    fn sign_in(&self) -> impl std::future::Future<Output = Result<Identity, AuthError>>;

    /// Renew the store token of `identity`, returning the updated identity.
    fn refresh(
        &self,
        identity: &Identity,
    ) -> impl std::future::Future<Output = Result<Identity, AuthError>>;

    /// End the session of `identity` with the provider.
    fn sign_out(
        &self,
        identity: &Identity,
    ) -> impl std::future::Future<Output = Result<(), AuthError>>;
}

/// "Sign in with Google" backed by Firebase Authentication.
#[derive(Clone, Debug)]
pub struct GoogleSignIn {
    google: GoogleOAuth,
    firebase: FirebaseAuth,
}

impl GoogleSignIn {
    pub fn new(google: GoogleOAuth, firebase: FirebaseAuth) -> Self {
        Self { google, firebase }
    }
}

impl IdentityProvider for GoogleSignIn {
    async fn sign_in(&self) -> Result<Identity, AuthError> {
        let server = LoopbackServer::bind(self.google.config().redirect_port).await?;
        let redirect_url = server.redirect_url().clone();
        let request = self.google.authorize_url(redirect_url.clone());

        tracing::info!("Opening browser for Google sign-in");
        open::that(request.url.as_str()).map_err(|e| AuthError::Browser(e.to_string()))?;

        let code = server
            .wait_for_code(&request.state, self.google.config().sign_in_timeout)
            .await?;
        let access_token = self
            .google
            .exchange_code(code, request.pkce_verifier, redirect_url.clone())
            .await?;

        let identity = self
            .firebase
            .sign_in_with_google(access_token.secret(), redirect_url.as_str())
            .await?;
        tracing::info!("Signed in as {}", identity.id);
        Ok(identity)
    }

    async fn refresh(&self, identity: &Identity) -> Result<Identity, AuthError> {
        self.firebase.refresh(identity).await
    }

    async fn sign_out(&self, identity: &Identity) -> Result<(), AuthError> {
        self.google.revoke(&identity.provider_token).await?;
        tracing::info!("Signed out {}", identity.id);
        Ok(())
    }
}
