//! Owned data types shared across the review pipeline.
//!
//! All types here are fully owned (no borrowed lifetimes) and implement
//! `Send`, so they can move freely between the per-file producer tasks and
//! the consumer task without arena allocation or reference counting.

use serde::{Deserialize, Serialize};

/// One file touched by the change set under review.
///
/// Produced by the change-set lister (the GitHub commit listing in the
/// binary) and immutable from then on. `patch_text` holds the unified-diff
/// hunks for this single file; it may be empty for files the provider could
/// not diff (binary content), which yields an empty line mapping.
#[derive(Debug, Clone)]
pub struct ChangedFile {
    /// Repository-relative path of the file.
    pub name: String,
    /// Provider status string: `"modified"`, `"added"`, `"removed"`, ….
    pub status: String,
    /// Opaque reference used by the content fetcher to retrieve the file's
    /// bytes (a raw-content URL for GitHub).
    pub content_locator: String,
    /// Unified-diff hunk text for this file only.
    pub patch_text: String,
}

/// A single raw result from the external analyzer.
///
/// Ephemeral — produced and consumed inside one file's producer task.
/// Derives `Deserialize` because the command-analyzer adapter parses these
/// straight out of the tool's JSON output.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Finding {
    /// 1-based line number in the analyzed (new) file.
    pub line: u32,
    /// Analyzer confidence in `[0, 1]`.
    pub confidence: f64,
    /// Human-readable description of the problem.
    pub message: String,
}

/// The one entity that crosses the system boundary outward.
///
/// Serializes to the GitHub create-review-comment request body, so the
/// field names follow that wire format (`commit_id`, `position`).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewComment {
    /// Repository-relative path of the commented file.
    pub path: String,
    /// Diff position — zero-based offset into the file's patch blob, the
    /// addressing unit the commenting API expects instead of line numbers.
    pub position: usize,
    /// Comment text (the finding's message).
    pub body: String,
    /// Head revision the comment is attached to.
    #[serde(rename = "commit_id")]
    pub revision_id: String,
}

/// Outcome of one review invocation, returned by the pipeline so callers
/// can log what happened without inspecting per-task state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReviewSummary {
    /// Number of per-file producer tasks started.
    pub files_submitted: usize,
    /// Tasks that ended early with a fetch, analyzer, or patch error.
    pub files_failed: usize,
    /// Comments the consumer handed to the publishing sink.
    pub comments_published: usize,
}
