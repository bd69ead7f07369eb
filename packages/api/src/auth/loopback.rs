//! Loopback redirect receiver for the desktop sign-in flow.
//!
//! Binds `127.0.0.1`, hands out `http://127.0.0.1:<port>/callback` as the
//! OAuth redirect, and serves a one-route axum app until the browser lands
//! there or the user runs out of time.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::Html;
use axum::routing::get;
use axum::Router;
use oauth2::{CsrfToken, RedirectUrl};
use tokio::net::TcpListener;
use tokio::sync::{oneshot, Mutex};

use crate::error::AuthError;

const CALLBACK_PATH: &str = "/callback";

const DONE_PAGE: &str = "<!doctype html><html><body style=\"font-family: sans-serif\">\
<h1>Signed in</h1><p>You can close this window and return to Notes.</p></body></html>";

const FAILED_PAGE: &str = "<!doctype html><html><body style=\"font-family: sans-serif\">\
<h1>Sign-in failed</h1><p>Return to Notes and try again.</p></body></html>";

type Outcome = Result<String, AuthError>;

/// Shared with the callback handler. The sender is taken by the first
/// callback; later ones only get a page.
struct PendingCallback {
    expected_state: String,
    outcome: Mutex<Option<oneshot::Sender<Outcome>>>,
}

pub struct LoopbackServer {
    listener: TcpListener,
    redirect_url: RedirectUrl,
}

impl LoopbackServer {
    /// Bind the listener. Port 0 picks a free port.
    pub async fn bind(port: u16) -> Result<Self, AuthError> {
        let listener = TcpListener::bind(("127.0.0.1", port)).await?;
        let addr = listener.local_addr()?;
        let redirect_url = RedirectUrl::new(format!("http://{addr}{CALLBACK_PATH}"))
            .map_err(|e| AuthError::Config(e.to_string()))?;
        tracing::debug!("Waiting for OAuth redirect on {}", redirect_url.as_str());
        Ok(Self {
            listener,
            redirect_url,
        })
    }

    pub fn redirect_url(&self) -> &RedirectUrl {
        &self.redirect_url
    }

    /// Wait for the redirect and return its authorization code.
    ///
    /// Requests to other paths get axum's 404 and are otherwise ignored. When
    /// nothing arrives within `timeout` the user is taken to have abandoned
    /// the consent screen and the wait ends with [`AuthError::Cancelled`].
    /// The listener is shut down either way.
    pub async fn wait_for_code(
        self,
        expected_state: &CsrfToken,
        timeout: Duration,
    ) -> Result<String, AuthError> {
        let (outcome_tx, outcome_rx) = oneshot::channel();
        let (stop_tx, stop_rx) = oneshot::channel::<()>();

        let pending = Arc::new(PendingCallback {
            expected_state: expected_state.secret().clone(),
            outcome: Mutex::new(Some(outcome_tx)),
        });
        let router = Router::new()
            .route(CALLBACK_PATH, get(callback))
            .with_state(pending);

        let server = axum::serve(self.listener, router).with_graceful_shutdown(async {
            stop_rx.await.ok();
        });
        tokio::spawn(async move {
            if let Err(e) = server.await {
                tracing::warn!("Loopback listener failed: {}", e);
            }
        });

        let outcome = tokio::time::timeout(timeout, outcome_rx).await;
        stop_tx.send(()).ok();

        match outcome {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(_)) => Err(AuthError::Cancelled(
                "redirect listener stopped".to_string(),
            )),
            Err(_) => {
                tracing::warn!(
                    "No sign-in redirect within {}s, giving up",
                    timeout.as_secs()
                );
                Err(AuthError::Cancelled(format!(
                    "no answer from the consent page within {}s",
                    timeout.as_secs()
                )))
            }
        }
    }
}

async fn callback(
    State(pending): State<Arc<PendingCallback>>,
    Query(params): Query<HashMap<String, String>>,
) -> (StatusCode, Html<&'static str>) {
    let outcome = check_callback(&params, &pending.expected_state);
    let page = match &outcome {
        Ok(_) => (StatusCode::OK, Html(DONE_PAGE)),
        Err(AuthError::Cancelled(_)) => (StatusCode::OK, Html(FAILED_PAGE)),
        Err(_) => (StatusCode::BAD_REQUEST, Html(FAILED_PAGE)),
    };

    match pending.outcome.lock().await.take() {
        Some(sender) => {
            sender.send(outcome).ok();
        }
        None => tracing::debug!("Ignoring repeated OAuth callback"),
    }
    page
}

/// Interpret the callback query against the state we issued.
fn check_callback(params: &HashMap<String, String>, expected_state: &str) -> Outcome {
    if let Some(error) = params.get("error") {
        return Err(AuthError::Cancelled(error.clone()));
    }
    let Some(code) = params.get("code") else {
        tracing::error!("OAuth callback missing code");
        return Err(AuthError::MissingCode);
    };
    let Some(state) = params.get("state") else {
        tracing::error!("OAuth callback missing state");
        return Err(AuthError::StateMismatch);
    };
    if state != expected_state {
        return Err(AuthError::StateMismatch);
    }
    Ok(code.clone())
}
