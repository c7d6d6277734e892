//! Synchronous in-process store, wrapped to look async.
//!
//! The web analog of the native preference store: reads and writes complete
//! without suspending, so the async trait methods are thin wrappers and the
//! overlay can pass straight through via [`SyncKv`].

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use nourish_core::NourishResult;

use super::{BackendKind, StorageBackend, SyncKv};

/// In-process key/value store.
#[derive(Debug, Default)]
pub struct LocalStoreBackend {
    map: RwLock<HashMap<String, String>>,
}

impl LocalStoreBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.map
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SyncKv for LocalStoreBackend {
    fn get_sync(&self, key: &str) -> Option<String> {
        self.map
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set_sync(&self, key: &str, value: &str) {
        self.map
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.to_string());
    }

    fn remove_sync(&self, key: &str) {
        self.map
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
    }
}

#[async_trait]
impl StorageBackend for LocalStoreBackend {
    async fn get(&self, key: &str) -> NourishResult<Option<String>> {
        Ok(self.get_sync(key))
    }

    async fn set(&self, key: &str, value: &str) -> NourishResult<()> {
        self.set_sync(key, value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> NourishResult<()> {
        self.remove_sync(key);
        Ok(())
    }

    async fn clear(&self) -> NourishResult<()> {
        self.map
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        Ok(())
    }

    async fn list_keys(&self) -> NourishResult<Vec<String>> {
        Ok(self
            .map
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect())
    }

    fn as_sync(&self) -> Option<&dyn SyncKv> {
        Some(self)
    }

    fn kind(&self) -> BackendKind {
        BackendKind::LocalStore
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_async_and_sync_surfaces_agree() {
        let backend = LocalStoreBackend::new();
        backend.set("user_42", "v1").await.expect("set should succeed");
        assert_eq!(backend.get_sync("user_42"), Some("v1".to_string()));

        backend.set_sync("user_42", "v2");
        assert_eq!(
            backend.get("user_42").await.expect("get should succeed"),
            Some("v2".to_string())
        );
    }

    #[tokio::test]
    async fn test_remove_and_clear() {
        let backend = LocalStoreBackend::new();
        backend.set("a", "1").await.expect("set should succeed");
        backend.set("b", "2").await.expect("set should succeed");

        backend.remove("a").await.expect("remove should succeed");
        assert_eq!(backend.get("a").await.expect("get should succeed"), None);
        // Removing an absent key succeeds.
        backend.remove("a").await.expect("remove should succeed");

        backend.clear().await.expect("clear should succeed");
        assert!(backend.is_empty());
        assert!(backend
            .list_keys()
            .await
            .expect("list_keys should succeed")
            .is_empty());
    }
}
