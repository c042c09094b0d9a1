//! Thin reqwest client for the handful of GitHub endpoints this service
//! touches: commit listing, raw content, review comments, webhook
//! registration, and the OAuth code exchange.
//!
//! No retries and no rate limiting here — a failed call is reported to the
//! caller, which scopes the damage (one file, one comment, or one
//! handshake attempt).

use reqwest::StatusCode;
use thiserror::Error;

use prlint_core::ReviewComment;

use crate::github::types::{AccessTokenResponse, CommitInfo, GhFile, WebhookRequest};

const OAUTH_TOKEN_URL: &str = "https://github.com/login/oauth/access_token";

/// A failed exchange with the GitHub API.
#[derive(Debug, Error)]
pub enum GithubError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("unexpected status {status} from {context}")]
    Status {
        status: StatusCode,
        context: &'static str,
    },
    #[error("OAuth response carried no access token")]
    MissingToken,
}

/// REST client bound to one repository's API base
/// (`https://api.github.com/repos/{owner}/{repo}`).
#[derive(Debug, Clone)]
pub struct GithubClient {
    http: reqwest::Client,
    base: String,
}

impl GithubClient {
    /// Builds a client for `base`. GitHub rejects requests without a
    /// User-Agent, so one is baked into the underlying client.
    pub fn new(base: String) -> Self {
        let http = reqwest::Client::builder()
            .user_agent(concat!("prlint/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_default();
        Self { http, base }
    }

    /// Lists the files touched by `sha` (`GET {base}/commits/{sha}`).
    pub async fn list_changed_files(&self, sha: &str) -> Result<Vec<GhFile>, GithubError> {
        let url = format!("{}/commits/{}", self.base, sha);
        let response = self.http.get(&url).send().await?;
        let response = expect_success(response, "commit listing")?;
        let info: CommitInfo = response.json().await?;
        tracing::debug!(sha = %info.sha, files = info.files.len(), "listed changed files");
        Ok(info.files)
    }

    /// Fetches the raw bytes behind a changed file's `raw_url`.
    pub async fn fetch_raw(&self, url: &str) -> Result<Vec<u8>, GithubError> {
        let response = self.http.get(url).send().await?;
        let response = expect_success(response, "raw content")?;
        Ok(response.bytes().await?.to_vec())
    }

    /// Posts one review comment on pull request `number`
    /// (`POST {base}/pulls/{number}/comments`).
    pub async fn create_comment(
        &self,
        token: &str,
        number: u64,
        comment: &ReviewComment,
    ) -> Result<(), GithubError> {
        let url = format!("{}/pulls/{}/comments", self.base, number);
        let response = self
            .http
            .post(&url)
            .header(reqwest::header::AUTHORIZATION, format!("token {token}"))
            .json(comment)
            .send()
            .await?;
        expect_success(response, "create comment")?;
        Ok(())
    }

    /// Registers the `pull_request` webhook (`POST {base}/hooks`); the API
    /// answers 201 on success and anything else is a failure.
    pub async fn create_webhook(&self, token: &str, callback_url: &str) -> Result<(), GithubError> {
        let body = WebhookRequest::pull_request_hook(callback_url.to_owned());
        let response = self
            .http
            .post(format!("{}/hooks", self.base))
            .header(reqwest::header::AUTHORIZATION, format!("token {token}"))
            .json(&body)
            .send()
            .await?;
        if response.status() != StatusCode::CREATED {
            return Err(GithubError::Status {
                status: response.status(),
                context: "create webhook",
            });
        }
        Ok(())
    }

    /// Exchanges an OAuth authorization code for an access token.
    pub async fn exchange_code(
        &self,
        client_id: &str,
        client_secret: &str,
        code: &str,
        state: &str,
    ) -> Result<String, GithubError> {
        let form = [
            ("client_id", client_id),
            ("client_secret", client_secret),
            ("code", code),
            ("state", state),
        ];
        let response = self
            .http
            .post(OAUTH_TOKEN_URL)
            .header(reqwest::header::ACCEPT, "application/json")
            .form(&form)
            .send()
            .await?;
        let response = expect_success(response, "OAuth token exchange")?;
        let token: AccessTokenResponse = response.json().await?;
        if token.access_token.is_empty() {
            return Err(GithubError::MissingToken);
        }
        Ok(token.access_token)
    }
}

/// Maps any non-2xx status to a `GithubError::Status` tagged with the call
/// site, leaving the response usable on success.
fn expect_success(
    response: reqwest::Response,
    context: &'static str,
) -> Result<reqwest::Response, GithubError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(GithubError::Status { status, context })
    }
}
