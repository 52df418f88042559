//! Key-value storage over SQLite.
//!
//! Every write runs in a transaction together with the revision bump, so a
//! reader sees either the old value or the new one.

use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};

use crate::errors::AppError;
use crate::models::RevisionInfo;

/// Local key-value storage.
#[derive(Clone)]
pub struct KeyValueStore {
    pool: SqlitePool,
}

impl KeyValueStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Read the value stored under `key`.
    pub async fn get_item(&self, key: &str) -> Result<Option<String>, AppError> {
        let row = sqlx::query("SELECT value FROM kv_store WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|r| r.get("value")))
    }

    /// Overwrite the value under `key` and return the new revision.
    pub async fn set_item(&self, key: &str, value: &str) -> Result<i64, AppError> {
        let now = Utc::now().to_rfc3339();
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO kv_store (key, value, updated_at) VALUES (?, ?, ?) \
             ON CONFLICT(key) DO UPDATE \
             SET value = excluded.value, updated_at = excluded.updated_at",
        )
        .bind(key)
        .bind(value)
        .bind(&now)
        .execute(&mut *tx)
        .await?;

        sqlx::query("UPDATE meta SET revision_id = revision_id + 1, generated_at = ? WHERE id = 1")
            .bind(&now)
            .execute(&mut *tx)
            .await?;

        let row = sqlx::query("SELECT revision_id FROM meta WHERE id = 1")
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(row.get("revision_id"))
    }

    /// Get the current revision ID.
    pub async fn revision_id(&self) -> Result<i64, AppError> {
        let row = sqlx::query("SELECT revision_id FROM meta WHERE id = 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get("revision_id"))
    }

    /// Get revision info.
    pub async fn revision_info(&self) -> Result<RevisionInfo, AppError> {
        let row = sqlx::query("SELECT revision_id, generated_at FROM meta WHERE id = 1")
            .fetch_one(&self.pool)
            .await?;

        let generated_at: String = row.get("generated_at");
        Ok(RevisionInfo {
            revision_id: row.get("revision_id"),
            generated_at: parse_timestamp(&generated_at),
        })
    }

    /// Get the schema version recorded in the meta row.
    pub async fn schema_version(&self) -> Result<i32, AppError> {
        let row = sqlx::query("SELECT schema_version FROM meta WHERE id = 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get("schema_version"))
    }
}

fn parse_timestamp(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|e| {
            tracing::warn!("Unparsable meta timestamp {:?}: {}", raw, e);
            DateTime::<Utc>::default()
        })
}
