pub mod config;
pub mod doctor;
pub mod generate;
pub mod suggest;

use std::sync::Arc;

use anyhow::Context;
use cotiza_core::config::AppConfig;
use cotiza_core::{HistoryStore, InMemoryHistoryStore};
use tracing::warn;

pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

impl CommandResult {
    pub fn ok(output: impl Into<String>) -> Self {
        Self { exit_code: 0, output: output.into() }
    }

    pub fn failure(exit_code: u8, output: impl Into<String>) -> Self {
        Self { exit_code, output: output.into() }
    }
}

async fn connect_and_migrate(config: &AppConfig) -> anyhow::Result<cotiza_db::DbPool> {
    let pool = cotiza_db::connect_with_settings(
        &config.database.url,
        config.database.max_connections,
        config.database.timeout_secs,
    )
    .await
    .with_context(|| format!("connecting to {}", config.database.url))?;
    cotiza_db::run_pending(&pool).await.context("running migrations")?;
    Ok(pool)
}

/// Open the configured sqlite history store, degrading to the in-memory
/// store when the database is unreachable. Quote generation must not
/// depend on persistence being healthy.
pub(crate) async fn open_history_store(config: &AppConfig) -> Arc<dyn HistoryStore> {
    match connect_and_migrate(config).await {
        Ok(pool) => Arc::new(cotiza_db::SqlHistoryStore::new(pool)),
        Err(error) => {
            warn!(%error, "history store unavailable; using in-memory history");
            Arc::new(InMemoryHistoryStore::new())
        }
    }
}
