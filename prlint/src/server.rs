//! HTTP surface and the GitHub-backed pipeline collaborators.
//!
//! Three routes: `GET /` and `GET /callback` drive the one-time OAuth
//! handshake (`oauth`), and `POST /payload` receives `pull_request`
//! webhook deliveries. A delivery is answered with 202 immediately; the
//! review itself runs in a spawned task so GitHub's delivery timeout never
//! races a slow analyzer, and the task logs the invocation summary when
//! the pipeline's consumer has fully drained.

use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use tokio::sync::RwLock;
use tracing::{debug, error, info};

use prlint_core::{
    run_review, BoxError, ChangedFile, CommentSink, ContentFetcher, ReviewComment, ReviewConfig,
};

use crate::analyzer::CommandAnalyzer;
use crate::config::{AnalyzerSettings, IgnoreList};
use crate::github::types::{GhFile, PullRequestEvent};
use crate::github::GithubClient;
use crate::oauth;

/// Static service identity from the CLI flags.
#[derive(Debug)]
pub struct ServiceConfig {
    pub client_id: String,
    pub client_secret: String,
    /// Externally reachable base URL; the webhook targets `/payload` here.
    pub public_url: String,
    /// Diagnostic mode: log comments instead of posting them.
    pub dry_run: bool,
}

/// Review tuning shared by every invocation, built once at startup and
/// only ever read afterwards.
#[derive(Debug)]
pub struct ReviewContext {
    pub pipeline: ReviewConfig,
    pub ignore: IgnoreList,
    pub analyzer: AnalyzerSettings,
}

/// Credentials acquired at runtime through the OAuth handshake.
#[derive(Debug, Default)]
pub struct AuthState {
    pub token: Option<String>,
    /// Nonce of the in-flight authorize redirect, if any.
    pub pending_state: Option<String>,
}

/// Shared state behind every handler. Cheap to clone: two `Arc`s, a
/// `reqwest`-backed client, and the auth lock.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<ServiceConfig>,
    pub review: Arc<ReviewContext>,
    pub github: GithubClient,
    pub auth: Arc<RwLock<AuthState>>,
}

/// Builds the three-route router over `state`.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(oauth::request_access))
        .route("/callback", get(oauth::callback))
        .route("/payload", post(payload))
        .with_state(state)
}

/// `POST /payload` — webhook deliveries for pull-request activity.
///
/// Before the handshake has produced a token there is nothing useful to
/// do, so the delivery is acknowledged and dropped. Otherwise the review
/// runs detached and the delivery is answered 202.
async fn payload(State(app): State<AppState>, Json(event): Json<PullRequestEvent>) -> StatusCode {
    let token = app.auth.read().await.token.clone();
    let Some(token) = token else {
        debug!("webhook delivery before access grant, ignoring");
        return StatusCode::OK;
    };

    tokio::spawn(review_pull_request(app, token, event));
    StatusCode::ACCEPTED
}

/// One full review invocation for a pull-request head revision.
async fn review_pull_request(app: AppState, token: String, event: PullRequestEvent) {
    let number = event.number;
    let sha = event.pull_request.head.sha;
    info!(pr = number, sha = %sha, "review started");

    let listed = match app.github.list_changed_files(&sha).await {
        Ok(files) => files,
        Err(e) => {
            error!(pr = number, error = %e, "could not list changed files");
            return;
        }
    };

    let files: Vec<ChangedFile> = listed
        .into_iter()
        .filter_map(GhFile::into_changed_file)
        .filter(|f| app.review.ignore.is_eligible(&f.name))
        .inspect(|f| debug!(file = %f.name, status = %f.status, "file eligible"))
        .collect();

    let fetcher = Arc::new(RawContentFetcher { github: app.github.clone() });
    let analyzer = Arc::new(CommandAnalyzer::new(app.review.analyzer.clone()));
    let sink = Arc::new(CommentPublisher {
        github: app.github.clone(),
        token,
        number,
        dry_run: app.service.dry_run,
    });

    let summary = run_review(&sha, files, fetcher, analyzer, sink, &app.review.pipeline).await;
    info!(
        pr = number,
        files = summary.files_submitted,
        failed = summary.files_failed,
        published = summary.comments_published,
        "review finished"
    );
}

/// Content fetcher over the changed file's raw-content URL.
struct RawContentFetcher {
    github: GithubClient,
}

#[async_trait]
impl ContentFetcher for RawContentFetcher {
    async fn fetch(&self, locator: &str) -> Result<Vec<u8>, BoxError> {
        Ok(self.github.fetch_raw(locator).await?)
    }
}

/// Publishing sink: posts comments on the pull request, or logs them in
/// dry-run mode.
struct CommentPublisher {
    github: GithubClient,
    token: String,
    number: u64,
    dry_run: bool,
}

#[async_trait]
impl CommentSink for CommentPublisher {
    async fn publish(&self, comment: ReviewComment) -> Result<(), BoxError> {
        if self.dry_run {
            info!(
                file = %comment.path,
                position = comment.position,
                body = %comment.body,
                "finding (dry run)"
            );
            return Ok(());
        }
        self.github
            .create_comment(&self.token, self.number, &comment)
            .await?;
        Ok(())
    }
}
