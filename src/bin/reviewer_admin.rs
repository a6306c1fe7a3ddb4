//! Operator commands for the reviewer assignment store.
//!
//! Usage:
//!
//! ```text
//! reviewer-admin [--database-url <url>] <migrate|stats>
//! ```
//!
//! `migrate` creates the review tables in an empty database. `stats` prints
//! the current assignment statistics as JSON on standard output. Connection
//! settings are read from flags or the environment (`DATABASE_URL`,
//! `REVIEWER_POOL_*`). Log verbosity follows `RUST_LOG`, defaulting to
//! `info`.

use clap::{Parser, Subcommand};
use mockable::DefaultClock;
use reviewer_assigner::config::EngineConfig;
use reviewer_assigner::review::adapters::postgres::PostgresReviewStore;
use reviewer_assigner::review::ports::ReviewStoreError;
use reviewer_assigner::review::services::{ReviewEngine, ReviewError};
use std::io::{self, Write};
use std::sync::Arc;
use thiserror::Error;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "reviewer-admin", about = "Administer the reviewer assignment store")]
struct Cli {
    #[command(flatten)]
    config: EngineConfig,

    #[command(subcommand)]
    command: AdminCommand,
}

#[derive(Debug, Clone, Copy, Subcommand)]
enum AdminCommand {
    /// Create the review tables.
    Migrate,
    /// Print assignment statistics as JSON.
    Stats,
}

/// Errors that can occur while running an admin command.
#[derive(Debug, Error)]
enum AdminError {
    #[error("store error: {0}")]
    Store(#[from] ReviewStoreError),
    #[error("review error: {0}")]
    Review(#[from] ReviewError),
    #[error("failed to join connection task: {0}")]
    Join(#[from] tokio::task::JoinError),
    #[error("failed to encode statistics: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to write output: {0}")]
    Io(#[from] io::Error),
}

#[tokio::main]
async fn main() -> Result<(), AdminError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let settings = cli.config.service_settings();
    let database = cli.config.database;
    let store = tokio::task::spawn_blocking(move || PostgresReviewStore::connect(&database))
        .await??;

    match cli.command {
        AdminCommand::Migrate => {
            store.apply_schema().await?;
            info!("migration complete");
        }
        AdminCommand::Stats => {
            let engine = ReviewEngine::new(Arc::new(store), Arc::new(DefaultClock), settings);
            let stats = engine.stats().stats().await?;
            let mut stdout = io::stdout().lock();
            serde_json::to_writer_pretty(&mut stdout, &stats)?;
            writeln!(stdout)?;
        }
    }
    Ok(())
}
