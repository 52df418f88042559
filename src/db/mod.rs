//! Database module for local persistence.
//!
//! SQLite backs a small key-value table; the catalog lives as one JSON value
//! under a single key.

mod catalog;
mod kv;

pub use catalog::*;
pub use kv::*;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;

/// Initialize the database connection pool and run migrations.
pub async fn init_database(db_path: &Path) -> Result<SqlitePool, sqlx::Error> {
    // Ensure the parent directory exists
    if let Some(parent) = db_path.parent() {
        tokio::fs::create_dir_all(parent).await.ok();
    }

    let db_url = format!("sqlite:{}?mode=rwc", db_path.display());

    let options = SqliteConnectOptions::from_str(&db_url)?
        .create_if_missing(true)
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
        .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
        .busy_timeout(std::time::Duration::from_secs(30));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    run_migrations(&pool).await?;

    Ok(pool)
}

/// Run database migrations.
async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS meta (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            schema_version INTEGER NOT NULL DEFAULT 1,
            revision_id INTEGER NOT NULL DEFAULT 0,
            generated_at TEXT NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "INSERT OR IGNORE INTO meta (id, schema_version, revision_id, generated_at) \
         VALUES (1, 1, 0, ?)",
    )
    .bind(chrono::Utc::now().to_rfc3339())
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS kv_store (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_init_creates_nested_directories() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("nested").join("wardrobe.sqlite");

        let pool = init_database(&db_path).await.unwrap();

        assert!(db_path.exists());
        let kv = KeyValueStore::new(pool);
        assert_eq!(kv.revision_info().await.unwrap().revision_id, 0);
    }

    #[tokio::test]
    async fn test_migrations_are_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("wardrobe.sqlite");

        let pool = init_database(&db_path).await.unwrap();
        let kv = KeyValueStore::new(pool.clone());
        kv.set_item("wardrobe", "[]").await.unwrap();
        pool.close().await;

        let reopened = KeyValueStore::new(init_database(&db_path).await.unwrap());
        assert_eq!(reopened.get_item("wardrobe").await.unwrap().as_deref(), Some("[]"));
        assert_eq!(reopened.revision_info().await.unwrap().revision_id, 1);
    }
}
