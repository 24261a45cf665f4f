//! Sqlite implementation of the core `HistoryStore` trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::Row;
use tracing::debug;

use cotiza_core::domain::history::QuoteHistoryEntry;
use cotiza_core::{HistoryStore, Sector, StoreError};

use crate::DbPool;

pub struct SqlHistoryStore {
    pool: DbPool,
}

impl SqlHistoryStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl HistoryStore for SqlHistoryStore {
    async fn append(&self, entry: QuoteHistoryEntry) -> Result<(), StoreError> {
        let embedding_json = entry
            .embedding
            .as_ref()
            .map(|vector| serde_json::to_string(vector))
            .transpose()
            .map_err(|error| StoreError::Corrupt(error.to_string()))?;
        let items_json = serde_json::to_string(&entry.items)
            .map_err(|error| StoreError::Corrupt(error.to_string()))?;

        sqlx::query(
            "INSERT INTO quote_history
                 (id, owner_id, sector, title, total_amount, items, embedding, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&entry.id)
        .bind(&entry.owner_id)
        .bind(entry.sector.key())
        .bind(&entry.title)
        .bind(entry.total_amount)
        .bind(items_json)
        .bind(embedding_json)
        .bind(entry.created_at)
        .execute(&self.pool)
        .await
        .map_err(|error| StoreError::Unavailable(error.to_string()))?;

        debug!(id = %entry.id, owner_id = %entry.owner_id, "history entry recorded");
        Ok(())
    }

    async fn recent(
        &self,
        owner_id: &str,
        sector: Option<Sector>,
        limit: usize,
    ) -> Result<Vec<QuoteHistoryEntry>, StoreError> {
        let rows = match sector {
            Some(sector) => {
                sqlx::query(
                    "SELECT id, owner_id, sector, title, total_amount, items, embedding,
                            created_at
                     FROM quote_history
                     WHERE owner_id = ? AND sector = ?
                     ORDER BY created_at DESC
                     LIMIT ?",
                )
                .bind(owner_id)
                .bind(sector.key())
                .bind(limit as i64)
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query(
                    "SELECT id, owner_id, sector, title, total_amount, items, embedding,
                            created_at
                     FROM quote_history
                     WHERE owner_id = ?
                     ORDER BY created_at DESC
                     LIMIT ?",
                )
                .bind(owner_id)
                .bind(limit as i64)
                .fetch_all(&self.pool)
                .await
            }
        }
        .map_err(|error| StoreError::Unavailable(error.to_string()))?;

        rows.into_iter()
            .map(|row| {
                let sector_key: String = row.get("sector");
                let sector = Sector::from_key(&sector_key).ok_or_else(|| {
                    StoreError::Corrupt(format!("unknown sector key `{sector_key}`"))
                })?;

                let items: serde_json::Value =
                    serde_json::from_str(row.get::<&str, _>("items"))
                        .map_err(|error| StoreError::Corrupt(error.to_string()))?;
                let embedding = row
                    .get::<Option<&str>, _>("embedding")
                    .map(serde_json::from_str::<Vec<f32>>)
                    .transpose()
                    .map_err(|error| StoreError::Corrupt(error.to_string()))?;

                Ok(QuoteHistoryEntry {
                    id: row.get("id"),
                    owner_id: row.get("owner_id"),
                    sector,
                    title: row.get("title"),
                    total_amount: row.get("total_amount"),
                    items,
                    embedding,
                    created_at: row.get::<DateTime<Utc>, _>("created_at"),
                })
            })
            .collect()
    }
}
