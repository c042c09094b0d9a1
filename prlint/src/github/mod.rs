//! GitHub boundary: wire types and the REST client.
//!
//! Everything that knows GitHub's JSON shapes or endpoints lives here; the
//! core pipeline only ever sees `ChangedFile` and `ReviewComment`.

pub mod client;
pub mod types;

pub use client::{GithubClient, GithubError};
