//! prlint — reviews pull requests with an external static analyzer and
//! comments only on the lines the change touched.
//!
//! # Startup sequence
//!
//! 1. Tracing subscriber — `RUST_LOG` controls the filter, default `info`.
//! 2. Flags — missing identity flags (repo API, OAuth credentials, public
//!    URL) are fatal here, before anything binds.
//! 3. Settings + ignore list — an explicitly named file that cannot be
//!    read or parsed is fatal; no file means defaults.
//! 4. Bind and serve. The OAuth handshake (`GET /`) happens at the
//!    operator's leisure; webhook deliveries before it completes are
//!    acknowledged and ignored.
//!
//! Shutdown is ctrl-c; in-flight review tasks are detached and end with
//! the process.

mod analyzer;
mod config;
mod github;
mod oauth;
mod server;

use std::sync::Arc;

use clap::Parser;
use tokio::sync::RwLock;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::{Args, IgnoreList, Settings};
use crate::github::GithubClient;
use crate::server::{AppState, AuthState, ReviewContext, ServiceConfig};

fn fatal(err: impl std::fmt::Display) -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::InvalidInput, err.to_string())
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let settings = Settings::load(args.settings.as_deref()).map_err(fatal)?;

    let ignore = match &args.ignore_file {
        Some(path) => {
            let raw = std::fs::read_to_string(path)?;
            IgnoreList::parse(&raw, &settings.extension)
        }
        None => IgnoreList::empty(&settings.extension),
    };
    info!(
        rules = ignore.len(),
        extension = %settings.extension,
        analyzer = %settings.analyzer.program,
        "configuration loaded"
    );

    let state = AppState {
        service: Arc::new(ServiceConfig {
            client_id: args.client_id,
            client_secret: args.client_secret,
            public_url: args.public_url.trim_end_matches('/').to_owned(),
            dry_run: args.dry_run,
        }),
        review: Arc::new(ReviewContext {
            pipeline: settings.review_config(),
            ignore,
            analyzer: settings.analyzer,
        }),
        github: GithubClient::new(args.repo_api.trim_end_matches('/').to_owned()),
        auth: Arc::new(RwLock::new(AuthState::default())),
    };

    let listener = tokio::net::TcpListener::bind(&args.listen).await?;
    info!(addr = %args.listen, dry_run = args.dry_run, "HTTP server listening");

    axum::serve(listener, server::router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutting down");
        })
        .await
}
