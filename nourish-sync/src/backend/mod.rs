//! Storage backend trait and selection.
//!
//! Two implementations of one interface: the asynchronous native preference
//! store ([`PreferencesBackend`]) and the synchronous in-process store
//! wrapped to look async ([`LocalStoreBackend`]). Selection happens once,
//! based on the platform probe; no method branches on the platform at call
//! time.
//!
//! Backend methods return honest `Result`s. The degrade policy (faults on
//! read paths become cache misses) belongs to the layers above, which can
//! then choose per call site whether to swallow or surface a failure.

pub mod local;
pub mod preferences;

use std::sync::Arc;

use async_trait::async_trait;
use nourish_core::NourishResult;

use crate::platform::{PlatformProbe, PREFERENCES_PLUGIN};
pub use local::LocalStoreBackend;
pub use preferences::{FilePreferencesBridge, PreferencesBackend, PreferencesBridge};

/// Which backend implementation was selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// Native asynchronous preference store.
    NativePreferences,
    /// Synchronous in-process store.
    LocalStore,
}

/// Synchronous key/value access, offered by backends that can serve reads
/// and writes without suspending.
///
/// The overlay passes through to this surface when present instead of
/// maintaining its own hydrated map.
pub trait SyncKv: Send + Sync {
    fn get_sync(&self, key: &str) -> Option<String>;
    fn set_sync(&self, key: &str, value: &str);
    fn remove_sync(&self, key: &str);
}

/// Uniform async key/value interface over the platform's persistent store.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Get a value, `None` when absent.
    async fn get(&self, key: &str) -> NourishResult<Option<String>>;

    /// Set a value.
    async fn set(&self, key: &str, value: &str) -> NourishResult<()>;

    /// Remove a key. Removing an absent key succeeds.
    async fn remove(&self, key: &str) -> NourishResult<()>;

    /// Remove every key.
    async fn clear(&self) -> NourishResult<()>;

    /// Enumerate all stored keys.
    async fn list_keys(&self) -> NourishResult<Vec<String>>;

    /// The synchronous surface, when this backend has one.
    fn as_sync(&self) -> Option<&dyn SyncKv> {
        None
    }

    /// Which implementation this is.
    fn kind(&self) -> BackendKind;
}

/// Select the storage backend for this process.
///
/// The probe is consulted exactly once; `make_bridge` is only invoked when
/// the native preference store is actually chosen.
pub fn select_backend<F>(probe: &dyn PlatformProbe, make_bridge: F) -> Arc<dyn StorageBackend>
where
    F: FnOnce() -> Arc<dyn PreferencesBridge>,
{
    if probe.is_native_runtime() && probe.is_plugin_available(PREFERENCES_PLUGIN) {
        Arc::new(PreferencesBackend::new(make_bridge()))
    } else {
        Arc::new(LocalStoreBackend::new())
    }
}

/// Whether persistent storage is usable at all.
///
/// On native this is plugin presence; on web it is a write probe against
/// the local store.
pub async fn is_storage_available(
    probe: &dyn PlatformProbe,
    backend: &dyn StorageBackend,
) -> bool {
    if probe.is_native_runtime() {
        return probe.is_plugin_available(PREFERENCES_PLUGIN);
    }
    let test_key = "__storage_test__";
    backend.set(test_key, test_key).await.is_ok() && backend.remove(test_key).await.is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::FixedProbe;

    fn bridge() -> Arc<dyn PreferencesBridge> {
        Arc::new(preferences::tests_support::NullBridge)
    }

    #[tokio::test]
    async fn test_web_probe_selects_local_store() {
        let probe = FixedProbe::web();
        let backend = select_backend(&probe, bridge);
        assert_eq!(backend.kind(), BackendKind::LocalStore);
        // No native plugin call is involved in the availability answer.
        assert!(is_storage_available(&probe, backend.as_ref()).await);
    }

    #[tokio::test]
    async fn test_native_probe_with_plugin_selects_preferences() {
        let probe = FixedProbe::native(&[PREFERENCES_PLUGIN]);
        let backend = select_backend(&probe, bridge);
        assert_eq!(backend.kind(), BackendKind::NativePreferences);
        assert!(is_storage_available(&probe, backend.as_ref()).await);
    }

    #[tokio::test]
    async fn test_native_probe_without_plugin_falls_back_to_local_store() {
        let probe = FixedProbe::native(&[]);
        let backend = select_backend(&probe, bridge);
        assert_eq!(backend.kind(), BackendKind::LocalStore);
        assert!(!is_storage_available(&probe, backend.as_ref()).await);
    }
}
