//! Concurrent analysis pipeline: fan out per file, fan in through one queue.
//!
//! One producer task per changed file fetches content, runs the analyzer,
//! maps the file's patch, filters the findings, and pushes survivors onto a
//! shared bounded queue. A single consumer, spawned before any producer,
//! drains the queue and hands each comment to the publishing sink.
//!
//! The shutdown ordering is the whole point: the orchestrator drops its own
//! sender before waiting, each producer holds a clone for exactly its own
//! lifetime, so the channel closes when — and only when — the last producer
//! finishes. The consumer then drains what is left and returns, and the
//! orchestrator awaits that return. No comment is lost to an early close,
//! none is duplicated, and a full queue blocks producers instead of
//! dropping data.

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::filter::filter_findings;
use crate::patch::{compute_line_mapping, PatchError};
use crate::types::{ChangedFile, Finding, ReviewComment, ReviewSummary};

/// Boxed error for collaborator implementations, so adapters keep their own
/// error types (reqwest, io, …) without this crate naming them.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Retrieves the raw bytes behind a [`ChangedFile::content_locator`].
#[async_trait]
pub trait ContentFetcher: Send + Sync {
    async fn fetch(&self, locator: &str) -> Result<Vec<u8>, BoxError>;
}

/// The external static-analysis tool, treated as a black box: the pipeline
/// reads only `line`, `confidence`, and `message` from its findings.
#[async_trait]
pub trait Analyzer: Send + Sync {
    async fn analyze(&self, name: &str, content: &[u8]) -> Result<Vec<Finding>, BoxError>;
}

/// Where resolved comments go. The binary posts them to the review API or,
/// in dry-run mode, logs them locally.
#[async_trait]
pub trait CommentSink: Send + Sync {
    async fn publish(&self, comment: ReviewComment) -> Result<(), BoxError>;
}

/// Tuning knobs for one review invocation.
///
/// Neither value is load-bearing for correctness — the pipeline terminates
/// and publishes exactly once at any capacity ≥ 1 — so both are plain
/// configuration rather than constants.
#[derive(Debug, Clone, Copy)]
pub struct ReviewConfig {
    /// Findings below this confidence are discarded before the queue.
    pub confidence_threshold: f64,
    /// Capacity of the shared comment queue; a full queue blocks producers.
    pub queue_capacity: usize,
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self { confidence_threshold: 0.8, queue_capacity: 100 }
    }
}

/// Why a single file's task ended without producing comments.
///
/// Always scoped to one file: siblings keep running and the invocation
/// still terminates normally.
#[derive(Debug, Error)]
pub enum FileError {
    #[error("content fetch failed: {0}")]
    Fetch(#[source] BoxError),
    #[error("analyzer failed: {0}")]
    Analyze(#[source] BoxError),
    #[error(transparent)]
    Patch(#[from] PatchError),
}

/// Runs one full review invocation over `files` and returns its summary.
///
/// Spawns the consumer first, then one producer task per file. Producers
/// run independently: a fetch, analyzer, or patch error in one file is
/// logged and ends only that task. `join_all` over the producer handles is
/// the completion barrier; once it passes, every sender clone is gone, the
/// queue closes, and the awaited consumer drains the remainder.
///
/// Ordering: findings from one file are enqueued in scan order, so they
/// publish in that relative order; across files there is no ordering at
/// all — tasks finish as they finish.
pub async fn run_review<F, A, S>(
    revision_id: &str,
    files: Vec<ChangedFile>,
    fetcher: Arc<F>,
    analyzer: Arc<A>,
    sink: Arc<S>,
    config: &ReviewConfig,
) -> ReviewSummary
where
    F: ContentFetcher + 'static,
    A: Analyzer + 'static,
    S: CommentSink + 'static,
{
    let (tx, mut rx) = mpsc::channel::<ReviewComment>(config.queue_capacity.max(1));

    // Consumer first, so producers can never fill the queue against a
    // reader that does not exist yet. Returns the number published.
    let consumer = tokio::spawn(async move {
        let mut published = 0usize;
        while let Some(comment) = rx.recv().await {
            match sink.publish(comment).await {
                Ok(()) => published += 1,
                Err(e) => warn!(error = %e, "failed to publish review comment"),
            }
        }
        published
    });

    let threshold = config.confidence_threshold;
    let mut producers = Vec::with_capacity(files.len());
    for file in files {
        let tx = tx.clone();
        let fetcher = Arc::clone(&fetcher);
        let analyzer = Arc::clone(&analyzer);
        let revision_id = revision_id.to_owned();
        producers.push(tokio::spawn(async move {
            let name = file.name.clone();
            match process_file(file, &revision_id, &*fetcher, &*analyzer, threshold, tx).await {
                Ok(sent) => {
                    debug!(file = %name, comments = sent, "file processed");
                    Ok(())
                }
                Err(e) => {
                    warn!(file = %name, error = %e, "skipping file");
                    Err(())
                }
            }
        }));
    }
    let files_submitted = producers.len();

    // The orchestrator's sender must die before the wait: the channel then
    // closes exactly when the last producer drops its clone.
    drop(tx);

    let mut files_failed = 0usize;
    for result in join_all(producers).await {
        match result {
            Ok(Ok(())) => {}
            // A panicked producer still releases its sender, so the
            // invocation terminates; count it like any other failed file.
            Ok(Err(())) | Err(_) => files_failed += 1,
        }
    }

    let comments_published = match consumer.await {
        Ok(n) => n,
        Err(e) => {
            warn!(error = %e, "consumer task failed");
            0
        }
    };

    ReviewSummary { files_submitted, files_failed, comments_published }
}

/// Fetch → analyze → map → filter → enqueue, for one file.
///
/// Returns the number of comments enqueued. Suspends on the fetch, the
/// analyzer call, and any send into a full queue; everything it computes
/// (mapping, findings) is private to this task.
async fn process_file(
    file: ChangedFile,
    revision_id: &str,
    fetcher: &dyn ContentFetcher,
    analyzer: &dyn Analyzer,
    threshold: f64,
    tx: mpsc::Sender<ReviewComment>,
) -> Result<usize, FileError> {
    let content = fetcher
        .fetch(&file.content_locator)
        .await
        .map_err(FileError::Fetch)?;
    let findings = analyzer
        .analyze(&file.name, &content)
        .await
        .map_err(FileError::Analyze)?;
    let mapping = compute_line_mapping(&file.patch_text)?;

    let mut sent = 0usize;
    for (finding, position) in filter_findings(findings, &mapping, threshold) {
        let comment = ReviewComment {
            path: file.name.clone(),
            position,
            body: finding.message,
            revision_id: revision_id.to_owned(),
        };
        // Send fails only when the receiver is gone, i.e. the consumer
        // died; there is nothing useful left for this task to do then.
        if tx.send(comment).await.is_err() {
            break;
        }
        sent += 1;
    }
    Ok(sent)
}
