//! OAuth handshake and webhook registration.
//!
//! One-time operator flow: visiting `/` redirects to GitHub's authorize
//! page with a fresh `state` nonce; GitHub calls back to `/callback` with
//! a code, which is exchanged for an access token; with the token in hand
//! the `pull_request` webhook is registered. Until this completes, inbound
//! webhook deliveries are accepted and ignored.

use axum::extract::{Query, State};
use axum::response::{IntoResponse, Redirect, Response};
use serde::Deserialize;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::server::AppState;

const AUTHORIZE_URL: &str = "https://github.com/login/oauth/authorize";
const OAUTH_SCOPE: &str = "repo write:repo_hook";
const RETRY_MESSAGE: &str = "Process couldn't be completed, please try again.";

/// `GET /` — starts the handshake by redirecting to GitHub's authorize
/// page, or reports that access was already granted.
pub async fn request_access(State(app): State<AppState>) -> Response {
    let mut auth = app.auth.write().await;
    if auth.token.is_some() {
        return "Access already granted.".into_response();
    }

    let nonce = Uuid::new_v4().to_string();
    let url = match reqwest::Url::parse_with_params(
        AUTHORIZE_URL,
        &[
            ("client_id", app.service.client_id.as_str()),
            ("scope", OAUTH_SCOPE),
            ("state", nonce.as_str()),
        ],
    ) {
        Ok(url) => url,
        Err(e) => {
            error!(error = %e, "could not build authorize URL");
            return "Something went wrong.".into_response();
        }
    };
    auth.pending_state = Some(nonce);
    Redirect::to(url.as_str()).into_response()
}

/// Query half of GitHub's callback redirect.
#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub state: String,
}

/// `GET /callback` — validates the state nonce, exchanges the code for an
/// access token, and registers the webhook.
pub async fn callback(State(app): State<AppState>, Query(query): Query<CallbackQuery>) -> Response {
    let expected = app.auth.read().await.pending_state.clone();
    if query.code.is_empty() || expected.as_deref() != Some(query.state.as_str()) {
        warn!("OAuth callback with missing code or mismatched state");
        return RETRY_MESSAGE.into_response();
    }

    let token = match app
        .github
        .exchange_code(
            &app.service.client_id,
            &app.service.client_secret,
            &query.code,
            &query.state,
        )
        .await
    {
        Ok(token) => token,
        Err(e) => {
            warn!(error = %e, "OAuth token exchange failed");
            return RETRY_MESSAGE.into_response();
        }
    };

    {
        let mut auth = app.auth.write().await;
        auth.token = Some(token.clone());
        auth.pending_state = None;
    }
    info!("access token acquired");

    let callback_url = format!("{}/payload", app.service.public_url);
    if let Err(e) = app.github.create_webhook(&token, &callback_url).await {
        // The token is kept: the operator can re-register the hook by
        // hand without another handshake.
        warn!(error = %e, "webhook registration failed");
        return RETRY_MESSAGE.into_response();
    }
    info!(url = %callback_url, "pull_request webhook registered");

    "Access granted successfully".into_response()
}
