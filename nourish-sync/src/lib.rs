//! Nourish Sync - Client-Side Data Synchronization Core
//!
//! Lets the UI read domain collections instantly and offline-tolerantly
//! while keeping them eventually consistent with the nutrition service.
//!
//! # Layers
//!
//! - [`backend`]: one async key/value interface, two implementations
//!   (native preference store, in-process web store), selected once at
//!   startup from the [`platform`] probe.
//! - [`overlay`]: the synchronous surface over whichever backend was
//!   chosen, hydrated once at startup when the backend is asynchronous.
//! - [`ttl`]: freshness-wrapped JSON payloads with explicit staleness.
//! - [`store`]: cache-first reads with silent background revalidation, one
//!   store per domain collection.
//! - [`mutate`]: optimistic local mutation with exact rollback on a failed
//!   remote commit.
//!
//! Every failure degrades: storage faults read as cache misses, background
//! refresh failures stay invisible, and a failed user action rolls state
//! back and reports. Nothing in this crate is fatal.

pub mod backend;
pub mod key;
pub mod mutate;
pub mod overlay;
pub mod platform;
pub mod remote;
pub mod store;
pub mod ttl;

pub use backend::{
    is_storage_available, select_backend, BackendKind, FilePreferencesBridge, LocalStoreBackend,
    PreferencesBackend, PreferencesBridge, StorageBackend, SyncKv,
};
pub use key::StoreKey;
pub use mutate::OptimisticMutator;
pub use overlay::{SyncOverlay, SyncStorage};
pub use platform::{FixedProbe, PlatformProbe, PREFERENCES_PLUGIN};
pub use remote::RemoteSource;
pub use store::{CachedStore, SharedState, StoreConfig, StoreEnvelope, StorePhase, StoreState};
pub use ttl::{CacheEntry, TtlCache};
