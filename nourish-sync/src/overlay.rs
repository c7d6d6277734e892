//! Synchronous overlay over the selected storage backend.
//!
//! The overlay gives the rest of the app a synchronous read/write API
//! regardless of backend. Over the asynchronous preference store it keeps
//! an in-memory map, filled once at startup by hydration; over the
//! synchronous local store it is a pass-through with no map at all.
//!
//! # The startup race
//!
//! Until hydration completes, `get_sync` returns whatever the map currently
//! holds. Callers that need post-hydration consistency await [`SyncOverlay::ready`];
//! callers tolerant of the brief startup window may read immediately. This
//! race is documented behavior, not something to paper over with delays.
//!
//! # Write-through
//!
//! `set_sync` updates the map first, so the very next `get_sync` on the
//! same key observes the write before the background persist resolves. If
//! that persist fails, the key is evicted from the map so the overlay and
//! the backing store cannot silently diverge.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use tokio::sync::watch;
use tracing::{debug, warn};

use crate::backend::{BackendKind, StorageBackend};
use nourish_core::NourishResult;

type Map = Arc<RwLock<HashMap<String, String>>>;

/// Synchronous illusion over an asynchronous backend.
#[derive(Clone)]
pub struct SyncOverlay {
    backend: Arc<dyn StorageBackend>,
    map: Map,
    ready_tx: Arc<watch::Sender<bool>>,
    ready_rx: watch::Receiver<bool>,
}

impl SyncOverlay {
    /// Build an overlay for the given backend. Hydration is not started
    /// here; see [`SyncOverlay::spawn_hydration`] and [`SyncStorage::connect`].
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        let passthrough = backend.as_sync().is_some();
        let (ready_tx, ready_rx) = watch::channel(passthrough);
        Self {
            backend,
            map: Arc::new(RwLock::new(HashMap::new())),
            ready_tx: Arc::new(ready_tx),
            ready_rx,
        }
    }

    /// Whether reads and writes go straight to the backend's synchronous
    /// surface.
    pub fn is_passthrough(&self) -> bool {
        self.backend.as_sync().is_some()
    }

    /// Kick off the one-shot hydration task. Must run inside a Tokio
    /// runtime. A no-op for pass-through backends.
    pub fn spawn_hydration(&self) {
        if self.is_passthrough() {
            return;
        }
        let overlay = self.clone();
        tokio::spawn(async move {
            overlay.hydrate().await;
        });
    }

    /// Enumerate all backend keys and fill the in-memory map.
    ///
    /// Idempotent: a second run rebuilds the same map. Keys already written
    /// through `set_sync` keep their overlay value, since the disk copy may
    /// still be in flight behind them.
    pub async fn hydrate(&self) {
        if self.is_passthrough() {
            let _ = self.ready_tx.send(true);
            return;
        }
        match self.backend.list_keys().await {
            Ok(keys) => {
                for key in keys {
                    match self.backend.get(&key).await {
                        Ok(Some(value)) => {
                            self.map
                                .write()
                                .unwrap_or_else(PoisonError::into_inner)
                                .entry(key)
                                .or_insert(value);
                        }
                        Ok(None) => {}
                        Err(err) => {
                            warn!(%key, %err, "hydration read failed; key skipped");
                        }
                    }
                }
                let count = self
                    .map
                    .read()
                    .unwrap_or_else(PoisonError::into_inner)
                    .len();
                debug!(count, "sync overlay hydrated");
            }
            Err(err) => {
                warn!(%err, "hydration key enumeration failed");
            }
        }
        let _ = self.ready_tx.send(true);
    }

    /// Resolves once hydration has completed (immediately for pass-through
    /// backends).
    pub async fn ready(&self) {
        let mut rx = self.ready_rx.clone();
        let _ = rx.wait_for(|hydrated| *hydrated).await;
    }

    /// Synchronous read. Before hydration completes this may miss data
    /// that exists on disk.
    pub fn get_sync(&self, key: &str) -> Option<String> {
        if let Some(kv) = self.backend.as_sync() {
            return kv.get_sync(key);
        }
        self.map
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    /// Synchronous write: map first, persist in the background.
    ///
    /// Must run inside a Tokio runtime (the persist is spawned).
    pub fn set_sync(&self, key: &str, value: &str) {
        if let Some(kv) = self.backend.as_sync() {
            kv.set_sync(key, value);
            return;
        }
        self.map
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.to_string());

        let backend = Arc::clone(&self.backend);
        let map = Arc::clone(&self.map);
        let key = key.to_string();
        let value = value.to_string();
        tokio::spawn(async move {
            if let Err(err) = backend.set(&key, &value).await {
                warn!(%key, %err, "background persist failed; evicting overlay entry");
                let mut map = map.write().unwrap_or_else(PoisonError::into_inner);
                // Only evict if a later write has not already replaced the
                // value this persist was carrying.
                if map.get(&key).map(|v| v == &value).unwrap_or(false) {
                    map.remove(&key);
                }
            }
        });
    }

    /// Synchronous removal: map first, backend removal in the background.
    pub fn remove_sync(&self, key: &str) {
        if let Some(kv) = self.backend.as_sync() {
            kv.remove_sync(key);
            return;
        }
        self.map
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);

        let backend = Arc::clone(&self.backend);
        let key = key.to_string();
        tokio::spawn(async move {
            if let Err(err) = backend.remove(&key).await {
                warn!(%key, %err, "background removal failed");
            }
        });
    }

    /// Clear the map and the backing store.
    pub async fn clear(&self) -> NourishResult<()> {
        self.map
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        self.backend.clear().await
    }

    /// Keys currently held by the overlay map. Empty for pass-through
    /// backends, which have no map.
    pub fn keys_sync(&self) -> Vec<String> {
        self.map
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }

    /// Mirror a successful direct backend write into the map, keeping the
    /// synchronous view coherent.
    pub(crate) fn apply_set(&self, key: &str, value: &str) {
        if self.is_passthrough() {
            return;
        }
        self.map
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.to_string());
    }

    pub(crate) fn apply_remove(&self, key: &str) {
        if self.is_passthrough() {
            return;
        }
        self.map
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
    }
}

/// The storage surface handed to the rest of the app.
///
/// Async methods talk to the backend (reads degrade faults to misses);
/// sync methods go through the overlay. The sync surface is the
/// integration point for persistence middleware that expects a synchronous
/// storage contract.
#[derive(Clone)]
pub struct SyncStorage {
    backend: Arc<dyn StorageBackend>,
    overlay: SyncOverlay,
}

impl SyncStorage {
    /// Wire up storage over the selected backend and start hydration.
    /// Must run inside a Tokio runtime.
    pub fn connect(backend: Arc<dyn StorageBackend>) -> Self {
        let overlay = SyncOverlay::new(Arc::clone(&backend));
        overlay.spawn_hydration();
        Self { backend, overlay }
    }

    /// Resolves once the synchronous surface is consistent with disk.
    pub async fn ready(&self) {
        self.overlay.ready().await;
    }

    pub fn overlay(&self) -> &SyncOverlay {
        &self.overlay
    }

    pub fn backend_kind(&self) -> BackendKind {
        self.backend.kind()
    }

    /// Async read; storage faults are indistinguishable from a miss.
    pub async fn get_item(&self, key: &str) -> Option<String> {
        match self.backend.get(key).await {
            Ok(value) => value,
            Err(err) => {
                warn!(%key, %err, "storage read failed; treated as miss");
                None
            }
        }
    }

    /// Async write. Errors are reported: callers on mutation paths need to
    /// know a write did not land.
    pub async fn set_item(&self, key: &str, value: &str) -> NourishResult<()> {
        self.backend.set(key, value).await?;
        self.overlay.apply_set(key, value);
        Ok(())
    }

    /// Async removal.
    pub async fn remove_item(&self, key: &str) -> NourishResult<()> {
        self.backend.remove(key).await?;
        self.overlay.apply_remove(key);
        Ok(())
    }

    /// Clear the overlay and the backing store.
    pub async fn clear(&self) -> NourishResult<()> {
        self.overlay.clear().await
    }

    /// All backend keys; a storage fault reads as an empty store.
    pub async fn get_all_keys(&self) -> Vec<String> {
        match self.backend.list_keys().await {
            Ok(keys) => keys,
            Err(err) => {
                warn!(%err, "storage key enumeration failed; treated as empty");
                Vec::new()
            }
        }
    }

    pub fn get_item_sync(&self, key: &str) -> Option<String> {
        self.overlay.get_sync(key)
    }

    pub fn set_item_sync(&self, key: &str, value: &str) {
        self.overlay.set_sync(key, value);
    }

    pub fn remove_item_sync(&self, key: &str) {
        self.overlay.remove_sync(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::LocalStoreBackend;

    fn local_storage() -> SyncStorage {
        SyncStorage::connect(Arc::new(LocalStoreBackend::new()))
    }

    #[tokio::test]
    async fn test_passthrough_read_your_writes() {
        let storage = local_storage();
        storage.ready().await;

        storage.set_item_sync("user_42", "v1");
        assert_eq!(storage.get_item_sync("user_42"), Some("v1".to_string()));

        storage.set_item_sync("user_42", "v2");
        assert_eq!(storage.get_item_sync("user_42"), Some("v2".to_string()));

        // Async surface sees the same store.
        assert_eq!(storage.get_item("user_42").await, Some("v2".to_string()));
    }

    #[tokio::test]
    async fn test_passthrough_is_ready_immediately() {
        let storage = local_storage();
        assert!(storage.overlay().is_passthrough());
        // No hydration task exists; ready resolves at once.
        storage.ready().await;
    }

    #[tokio::test]
    async fn test_clear_empties_overlay_and_backend() {
        let storage = local_storage();
        storage.set_item_sync("a", "1");
        storage.set_item_sync("b", "2");

        storage.clear().await.expect("clear should succeed");
        assert_eq!(storage.get_item_sync("a"), None);
        assert!(storage.get_all_keys().await.is_empty());
        assert!(storage.overlay().keys_sync().is_empty());
    }

    #[tokio::test]
    async fn test_remove_sync() {
        let storage = local_storage();
        storage.set_item_sync("k", "v");
        storage.remove_item_sync("k");
        assert_eq!(storage.get_item_sync("k"), None);
    }
}
