//! Native preference-store backend.
//!
//! The native plugin is reached through the [`PreferencesBridge`] trait so
//! the backend itself never touches platform bindings. The shipped
//! [`FilePreferencesBridge`] persists the preference map as a single JSON
//! document, which is how the native store behaves from the app's point of
//! view: an asynchronous, durable string map.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use nourish_core::{NourishResult, StorageError};
use tokio::sync::Mutex;

use super::{BackendKind, StorageBackend};

/// The native preference plugin surface.
#[async_trait]
pub trait PreferencesBridge: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    async fn remove(&self, key: &str) -> Result<(), StorageError>;
    async fn clear(&self) -> Result<(), StorageError>;
    async fn keys(&self) -> Result<Vec<String>, StorageError>;
}

/// Storage backend over the native preference store.
pub struct PreferencesBackend {
    bridge: Arc<dyn PreferencesBridge>,
}

impl PreferencesBackend {
    pub fn new(bridge: Arc<dyn PreferencesBridge>) -> Self {
        Self { bridge }
    }
}

#[async_trait]
impl StorageBackend for PreferencesBackend {
    async fn get(&self, key: &str) -> NourishResult<Option<String>> {
        Ok(self.bridge.get(key).await?)
    }

    async fn set(&self, key: &str, value: &str) -> NourishResult<()> {
        Ok(self.bridge.set(key, value).await?)
    }

    async fn remove(&self, key: &str) -> NourishResult<()> {
        Ok(self.bridge.remove(key).await?)
    }

    async fn clear(&self) -> NourishResult<()> {
        Ok(self.bridge.clear().await?)
    }

    async fn list_keys(&self) -> NourishResult<Vec<String>> {
        Ok(self.bridge.keys().await?)
    }

    fn kind(&self) -> BackendKind {
        BackendKind::NativePreferences
    }
}

/// Bridge persisting the preference map as one JSON file.
#[derive(Debug)]
pub struct FilePreferencesBridge {
    path: PathBuf,
    map: Mutex<HashMap<String, String>>,
}

impl FilePreferencesBridge {
    /// Open the bridge, loading any existing preference file.
    ///
    /// A missing file is an empty map; an unreadable or corrupt file is an
    /// error, since silently starting empty would shadow the user's data.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();
        let map = if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .map_err(|e| StorageError::op("open", path.display().to_string(), e))?;
            serde_json::from_str(&contents)
                .map_err(|e| StorageError::op("open", path.display().to_string(), e))?
        } else {
            HashMap::new()
        };
        Ok(Self {
            path,
            map: Mutex::new(map),
        })
    }

    async fn flush(&self, map: &HashMap<String, String>, op: &'static str) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StorageError::op(op, self.path.display().to_string(), e))?;
        }
        let contents = serde_json::to_string(map)
            .map_err(|e| StorageError::op(op, self.path.display().to_string(), e))?;
        tokio::fs::write(&self.path, contents)
            .await
            .map_err(|e| StorageError::op(op, self.path.display().to_string(), e))
    }
}

#[async_trait]
impl PreferencesBridge for FilePreferencesBridge {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.map.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut map = self.map.lock().await;
        map.insert(key.to_string(), value.to_string());
        self.flush(&map, "set").await
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut map = self.map.lock().await;
        map.remove(key);
        self.flush(&map, "remove").await
    }

    async fn clear(&self) -> Result<(), StorageError> {
        let mut map = self.map.lock().await;
        map.clear();
        self.flush(&map, "clear").await
    }

    async fn keys(&self) -> Result<Vec<String>, StorageError> {
        Ok(self.map.lock().await.keys().cloned().collect())
    }
}

#[cfg(test)]
pub(crate) mod tests_support {
    use super::*;

    /// A bridge that stores nothing and never fails. For selection tests
    /// where the bridge is irrelevant.
    pub struct NullBridge;

    #[async_trait]
    impl PreferencesBridge for NullBridge {
        async fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Ok(None)
        }

        async fn set(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
            Ok(())
        }

        async fn remove(&self, _key: &str) -> Result<(), StorageError> {
            Ok(())
        }

        async fn clear(&self) -> Result<(), StorageError> {
            Ok(())
        }

        async fn keys(&self) -> Result<Vec<String>, StorageError> {
            Ok(vec![])
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_file_bridge_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("preferences.json");

        let bridge = FilePreferencesBridge::open(&path).expect("open should succeed");
        bridge.set("goals-storage", "{}").await.expect("set should succeed");
        assert_eq!(
            bridge.get("goals-storage").await.expect("get should succeed"),
            Some("{}".to_string())
        );

        // A new bridge over the same file sees the persisted data.
        let reopened = FilePreferencesBridge::open(&path).expect("reopen should succeed");
        assert_eq!(
            reopened.get("goals-storage").await.expect("get should succeed"),
            Some("{}".to_string())
        );
        assert_eq!(
            reopened.keys().await.expect("keys should succeed"),
            vec!["goals-storage".to_string()]
        );
    }

    #[tokio::test]
    async fn test_file_bridge_remove_and_clear_persist() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("preferences.json");

        let bridge = FilePreferencesBridge::open(&path).expect("open should succeed");
        bridge.set("a", "1").await.expect("set should succeed");
        bridge.set("b", "2").await.expect("set should succeed");
        bridge.remove("a").await.expect("remove should succeed");

        let reopened = FilePreferencesBridge::open(&path).expect("reopen should succeed");
        assert_eq!(reopened.get("a").await.expect("get should succeed"), None);
        assert_eq!(
            reopened.get("b").await.expect("get should succeed"),
            Some("2".to_string())
        );

        reopened.clear().await.expect("clear should succeed");
        let reopened = FilePreferencesBridge::open(&path).expect("reopen should succeed");
        assert!(reopened.keys().await.expect("keys should succeed").is_empty());
    }

    #[tokio::test]
    async fn test_backend_delegates_to_bridge() {
        let dir = tempfile::tempdir().expect("tempdir");
        let bridge = FilePreferencesBridge::open(dir.path().join("prefs.json"))
            .expect("open should succeed");
        let backend = PreferencesBackend::new(Arc::new(bridge));

        backend.set("k", "v").await.expect("set should succeed");
        assert_eq!(
            backend.get("k").await.expect("get should succeed"),
            Some("v".to_string())
        );
        assert_eq!(backend.kind(), BackendKind::NativePreferences);
        assert!(backend.as_sync().is_none());
    }

    #[test]
    fn test_open_rejects_corrupt_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("preferences.json");
        std::fs::write(&path, "not json").expect("write");

        let err = FilePreferencesBridge::open(&path).expect_err("open should fail");
        assert!(matches!(err, StorageError::OperationFailed { op: "open", .. }));
    }
}
