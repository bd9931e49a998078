//! In-memory key-value store backed by a `HashMap` behind a `Mutex`.

use async_trait::async_trait;
use jobtrackr_types::{KeyValueStore, error::Result};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// An in-memory [`KeyValueStore`] implementation for testing and ephemeral use.
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    /// Creates a new empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data().is_empty()
    }

    fn data(&self) -> MutexGuard<'_, HashMap<String, String>> {
        self.data.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.data().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.data().insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.data().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_and_get() {
        let store = MemoryStore::new();
        store.set("a", "1").await.unwrap();
        assert_eq!(store.get("a").await.unwrap().as_deref(), Some("1"));
    }

    #[tokio::test]
    async fn test_get_missing() {
        let store = MemoryStore::new();
        assert!(store.get("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_overwrite() {
        let store = MemoryStore::new();
        store.set("a", "first").await.unwrap();
        store.set("a", "second").await.unwrap();
        assert_eq!(store.get("a").await.unwrap().as_deref(), Some("second"));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_remove_is_idempotent() {
        let store = MemoryStore::new();
        store.set("a", "1").await.unwrap();
        store.remove("a").await.unwrap();
        store.remove("a").await.unwrap();
        assert!(store.is_empty());
    }
}
