//! SQLite-backed key-value store using sqlx.
//!
//! Schema: `kv(key TEXT PRIMARY KEY, value TEXT NOT NULL, updated_at INTEGER)`.

use async_trait::async_trait;
use jobtrackr_types::{KeyValueStore, error::Result};
use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};
use std::str::FromStr;

/// A persistent [`KeyValueStore`] backed by `SQLite`.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Connects to a `SQLite` database (e.g. `"sqlite:./state.db"`).
    ///
    /// Creates the database file and the `kv` table if they do not exist.
    ///
    /// # Errors
    ///
    /// Returns a [`sqlx::Error`] if the connection or table creation fails.
    pub async fn new(database_url: &str) -> std::result::Result<Self, sqlx::Error> {
        let opts = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(opts)
            .await?;
        Self::migrate(&pool).await?;
        Ok(Self { pool })
    }

    async fn migrate(pool: &SqlitePool) -> std::result::Result<(), sqlx::Error> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS kv (
                key         TEXT    PRIMARY KEY,
                value       TEXT    NOT NULL,
                updated_at  INTEGER NOT NULL DEFAULT (unixepoch())
            )",
        )
        .execute(pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for SqliteStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let row: Option<(String,)> = sqlx::query_as("SELECT value FROM kv WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|(value,)| value))
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query(
            "INSERT INTO kv (key, value) VALUES (?, ?)
             ON CONFLICT(key) DO UPDATE SET
                 value = excluded.value,
                 updated_at = unixepoch()",
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        sqlx::query("DELETE FROM kv WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
