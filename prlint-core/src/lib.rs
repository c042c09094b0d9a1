//! Core review engine for prlint.
//!
//! Everything network-shaped lives behind the trait seams in [`pipeline`];
//! this crate only knows how to turn a unified-diff patch blob into a
//! line → position mapping ([`patch`]), restrict analyzer findings to the
//! lines a change actually touched ([`filter`]), and fan per-file work out
//! and back in through a single bounded queue ([`pipeline`]).

pub mod filter;
pub mod patch;
pub mod pipeline;
pub mod types;

pub use filter::filter_findings;
pub use patch::{compute_line_mapping, LineMapping, PatchError};
pub use pipeline::{
    run_review, Analyzer, BoxError, CommentSink, ContentFetcher, FileError, ReviewConfig,
};
pub use types::{ChangedFile, Finding, ReviewComment, ReviewSummary};
