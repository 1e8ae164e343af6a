//! Key-Value Storage Abstraction
//!
//! Provides the persistence contract the credential store is built on. The
//! model is deliberately the one web storage offers: string keys, string
//! values, scoped to one application.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::Mutex;

use crate::error::Result;

/// Key-value storage trait
///
/// Hosts back this with whatever survives the right lifetime for the scope
/// they hand out: a browser origin's local storage or a sqlite file for the
/// persistent scope, plain process memory for the session scope.
///
/// Reads must reflect the latest write; implementations keep no caches of
/// their own. No cross-process locking is provided, writes are
/// last-write-wins.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::storage::KeyValueStore;
///
/// async fn remember(store: &dyn KeyValueStore) -> Result<()> {
///     store.set("last_sync", "2024-11-02T10:00:00Z").await?;
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Retrieve a value, `Ok(None)` if the key is absent
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store a value, replacing any previous one
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Delete a key; deleting an absent key is not an error
    async fn remove(&self, key: &str) -> Result<()>;

    /// Delete every key in this scope
    async fn clear(&self) -> Result<()>;

    /// Check for a key without retrieving its value
    async fn contains(&self, key: &str) -> Result<bool> {
        Ok(self.get(key).await?.is_some())
    }
}

/// In-memory store
///
/// Serves two roles: the session scope (values must not survive the
/// process) and the storage double in tests.
#[derive(Debug, Default)]
pub struct MemoryKeyValueStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries
            .lock()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.entries.lock().await.remove(key);
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        self.entries.lock().await.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_round_trip() {
        let store = MemoryKeyValueStore::new();

        store.set("alpha", "1").await.unwrap();
        assert_eq!(store.get("alpha").await.unwrap(), Some("1".to_string()));

        store.set("alpha", "2").await.unwrap();
        assert_eq!(store.get("alpha").await.unwrap(), Some("2".to_string()));
    }

    #[tokio::test]
    async fn test_memory_store_remove_is_idempotent() {
        let store = MemoryKeyValueStore::new();

        store.set("alpha", "1").await.unwrap();
        store.remove("alpha").await.unwrap();
        store.remove("alpha").await.unwrap();

        assert_eq!(store.get("alpha").await.unwrap(), None);
        assert!(!store.contains("alpha").await.unwrap());
    }

    #[tokio::test]
    async fn test_memory_store_clear() {
        let store = MemoryKeyValueStore::new();

        store.set("alpha", "1").await.unwrap();
        store.set("beta", "2").await.unwrap();
        store.clear().await.unwrap();

        assert_eq!(store.get("alpha").await.unwrap(), None);
        assert_eq!(store.get("beta").await.unwrap(), None);
    }
}
