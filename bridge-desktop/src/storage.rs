//! Key-Value Storage using SQLite

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    storage::KeyValueStore,
};
use sqlx::{sqlite::SqlitePool, Row};
use std::path::PathBuf;
use tracing::debug;

/// SQLite-backed key-value store implementation
///
/// Plays the role a browser's local storage plays for the web host: plain
/// text values, persisted across restarts, shared by every component that
/// holds the same database path. Writes are last-write-wins.
pub struct SqliteKeyValueStore {
    pool: SqlitePool,
}

impl SqliteKeyValueStore {
    /// Open (or create) the store at the given database path.
    pub async fn new(db_path: PathBuf) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(BridgeError::Io)?;
        }

        // Forward slashes keep the URL valid on Windows; mode=rwc creates
        // the database file on first use.
        let path_str = db_path.to_string_lossy().replace('\\', "/");
        let db_url = format!("sqlite://{}?mode=rwc", path_str);

        let store = Self::connect(&db_url).await?;
        debug!(path = ?db_path, "Initialized key-value store");
        Ok(store)
    }

    /// Create an in-memory store (for testing)
    pub async fn in_memory() -> Result<Self> {
        Self::connect("sqlite::memory:").await
    }

    async fn connect(db_url: &str) -> Result<Self> {
        let pool = SqlitePool::connect(db_url)
            .await
            .map_err(|e| BridgeError::OperationFailed(format!("Failed to connect to DB: {}", e)))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS kv_entries (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at INTEGER NOT NULL
            )
            "#,
        )
        .execute(&pool)
        .await
        .map_err(|e| BridgeError::OperationFailed(format!("Failed to create table: {}", e)))?;

        Ok(Self { pool })
    }

    /// Current Unix timestamp for the updated_at column.
    fn now() -> i64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0)
    }
}

#[async_trait]
impl KeyValueStore for SqliteKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let row = sqlx::query("SELECT value FROM kv_entries WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| BridgeError::OperationFailed(format!("Failed to get value: {}", e)))?;

        Ok(row.map(|row| row.get(0)))
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO kv_entries (key, value, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(Self::now())
        .execute(&self.pool)
        .await
        .map_err(|e| BridgeError::OperationFailed(format!("Failed to set value: {}", e)))?;

        debug!(key = key, "Stored value");
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        sqlx::query("DELETE FROM kv_entries WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(|e| BridgeError::OperationFailed(format!("Failed to remove value: {}", e)))?;

        debug!(key = key, "Removed value");
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        sqlx::query("DELETE FROM kv_entries")
            .execute(&self.pool)
            .await
            .map_err(|e| BridgeError::OperationFailed(format!("Failed to clear store: {}", e)))?;

        debug!("Cleared key-value store");
        Ok(())
    }

    async fn contains(&self, key: &str) -> Result<bool> {
        let row = sqlx::query("SELECT 1 FROM kv_entries WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| BridgeError::OperationFailed(format!("Failed to check key: {}", e)))?;

        Ok(row.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_store_creation() {
        let _store = SqliteKeyValueStore::in_memory().await.unwrap();
        // Just verify it constructs
    }

    #[tokio::test]
    async fn test_round_trip() {
        let store = SqliteKeyValueStore::in_memory().await.unwrap();

        store.set("test_key", "test_value").await.unwrap();
        assert_eq!(
            store.get("test_key").await.unwrap(),
            Some("test_value".to_string())
        );

        store.remove("test_key").await.unwrap();
        assert_eq!(store.get("test_key").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_set_overwrites_existing_value() {
        let store = SqliteKeyValueStore::in_memory().await.unwrap();

        store.set("key", "first").await.unwrap();
        store.set("key", "second").await.unwrap();

        assert_eq!(store.get("key").await.unwrap(), Some("second".to_string()));
    }

    #[tokio::test]
    async fn test_remove_missing_key_is_ok() {
        let store = SqliteKeyValueStore::in_memory().await.unwrap();
        store.remove("missing").await.unwrap();
    }

    #[tokio::test]
    async fn test_contains_and_clear() {
        let store = SqliteKeyValueStore::in_memory().await.unwrap();

        store.set("key1", "value1").await.unwrap();
        store.set("key2", "value2").await.unwrap();
        assert!(store.contains("key1").await.unwrap());

        store.clear().await.unwrap();
        assert!(!store.contains("key1").await.unwrap());
        assert_eq!(store.get("key2").await.unwrap(), None);
    }
}
