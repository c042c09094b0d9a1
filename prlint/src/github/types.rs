//! Serde types for the GitHub payloads this service reads and writes.

use serde::{Deserialize, Serialize};

use prlint_core::ChangedFile;

/// Response of `GET /repos/{owner}/{repo}/commits/{sha}` — only the fields
/// this service reads.
#[derive(Debug, Clone, Deserialize)]
pub struct CommitInfo {
    pub sha: String,
    #[serde(default)]
    pub files: Vec<GhFile>,
}

/// One changed file as the commit listing reports it.
#[derive(Debug, Clone, Deserialize)]
pub struct GhFile {
    #[serde(rename = "filename")]
    pub name: String,
    #[serde(default)]
    pub status: String,
    #[serde(rename = "raw_url")]
    pub raw_url: String,
    /// Unified-diff hunks. Absent for binary files and for changes too
    /// large for the API to inline.
    #[serde(default)]
    pub patch: Option<String>,
}

impl GhFile {
    /// Converts to the core's `ChangedFile`, or `None` when GitHub supplied
    /// no patch — with no patch there is no line mapping and therefore no
    /// commentable line.
    pub fn into_changed_file(self) -> Option<ChangedFile> {
        let patch_text = self.patch?;
        Some(ChangedFile {
            name: self.name,
            status: self.status,
            content_locator: self.raw_url,
            patch_text,
        })
    }
}

/// The slice of a `pull_request` webhook delivery this service acts on.
#[derive(Debug, Clone, Deserialize)]
pub struct PullRequestEvent {
    pub number: u64,
    pub pull_request: PullRequestRef,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PullRequestRef {
    pub head: HeadRef,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HeadRef {
    /// Head revision of the pull request; comments attach to this sha.
    pub sha: String,
}

/// Response of the OAuth access-token exchange.
#[derive(Debug, Deserialize)]
pub struct AccessTokenResponse {
    #[serde(default)]
    pub access_token: String,
}

/// Request body of `POST /repos/{owner}/{repo}/hooks`.
#[derive(Debug, Serialize)]
pub struct WebhookRequest {
    pub name: &'static str,
    pub config: WebhookConfig,
    pub events: Vec<&'static str>,
    pub active: bool,
}

#[derive(Debug, Serialize)]
pub struct WebhookConfig {
    pub url: String,
    pub content_type: &'static str,
}

impl WebhookRequest {
    /// A `pull_request` web hook delivering JSON to `callback_url`.
    pub fn pull_request_hook(callback_url: String) -> Self {
        Self {
            name: "web",
            config: WebhookConfig { url: callback_url, content_type: "json" },
            events: vec!["pull_request"],
            active: true,
        }
    }
}
