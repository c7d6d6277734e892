//! Freshness-aware cache over the synchronous storage surface.
//!
//! Every cached payload is wrapped in a [`CacheEntry`] carrying the time it
//! was saved and its TTL. An entry past its TTL is logically absent but is
//! left in place: the stale value stays available to the
//! stale-while-revalidate path in the cached stores. A corrupt entry is a
//! miss and is evicted so it cannot poison future reads.
//!
//! Methods with an `_at` suffix take an explicit `now` so freshness math is
//! deterministic under test; the plain variants use the wall clock.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::key::StoreKey;
use crate::overlay::SyncStorage;
use nourish_core::CacheError;

/// A cached payload with freshness metadata.
///
/// Replaced wholesale on every write; never partially updated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry<T> {
    pub value: T,
    pub saved_at: DateTime<Utc>,
    pub ttl_ms: u64,
}

/// Borrowed twin of [`CacheEntry`] for serialization without cloning.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CacheEntryRef<'a, T> {
    value: &'a T,
    saved_at: DateTime<Utc>,
    ttl_ms: u64,
}

impl<T> CacheEntry<T> {
    /// Age of the entry at `now`. A `saved_at` in the future reads as zero.
    pub fn age_at(&self, now: DateTime<Utc>) -> Duration {
        now.signed_duration_since(self.saved_at)
            .to_std()
            .unwrap_or(Duration::ZERO)
    }

    /// Fresh under the entry's own TTL: `now - saved_at < ttl`.
    pub fn is_fresh_at(&self, now: DateTime<Utc>) -> bool {
        self.age_at(now) < Duration::from_millis(self.ttl_ms)
    }
}

/// TTL cache over the synchronous storage surface.
#[derive(Clone)]
pub struct TtlCache {
    storage: SyncStorage,
}

impl TtlCache {
    pub fn new(storage: SyncStorage) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &SyncStorage {
        &self.storage
    }

    /// Load and parse an entry. Corrupt entries are evicted and read as a
    /// miss.
    fn load_entry<T: DeserializeOwned>(&self, key: &StoreKey) -> Option<CacheEntry<T>> {
        let raw = self.storage.get_item_sync(key.encode())?;
        match serde_json::from_str(&raw) {
            Ok(entry) => Some(entry),
            Err(err) => {
                let parse = CacheError::Parse {
                    key: key.encode().to_string(),
                    reason: err.to_string(),
                };
                warn!(%parse, "evicting corrupt cache entry");
                self.evict(key);
                None
            }
        }
    }

    /// Read a value if it is fresh under `ttl` at `now`.
    ///
    /// An expired entry is a miss but is not evicted.
    pub fn read_at<T: DeserializeOwned>(
        &self,
        key: &StoreKey,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> Option<T> {
        let entry = self.load_entry::<T>(key)?;
        if entry.age_at(now) < ttl {
            Some(entry.value)
        } else {
            None
        }
    }

    pub fn read<T: DeserializeOwned>(&self, key: &StoreKey, ttl: Duration) -> Option<T> {
        self.read_at(key, ttl, Utc::now())
    }

    /// Read a value regardless of TTL, along with when it was saved.
    pub fn read_stale<T: DeserializeOwned>(
        &self,
        key: &StoreKey,
    ) -> Option<(T, DateTime<Utc>)> {
        let entry = self.load_entry::<T>(key)?;
        Some((entry.value, entry.saved_at))
    }

    /// Persist a value with `saved_at` and `ttl`.
    pub fn write_at<T: Serialize>(
        &self,
        key: &StoreKey,
        value: &T,
        ttl: Duration,
        saved_at: DateTime<Utc>,
    ) {
        let entry = CacheEntryRef {
            value,
            saved_at,
            ttl_ms: ttl.as_millis() as u64,
        };
        match serde_json::to_string(&entry) {
            Ok(raw) => self.storage.set_item_sync(key.encode(), &raw),
            Err(err) => warn!(key = %key, %err, "cache write skipped: value not serializable"),
        }
    }

    pub fn write<T: Serialize>(&self, key: &StoreKey, value: &T, ttl: Duration) {
        self.write_at(key, value, ttl, Utc::now());
    }

    /// Pure freshness predicate: no eviction, no other side effects.
    pub fn is_fresh_at(&self, key: &StoreKey, ttl: Duration, now: DateTime<Utc>) -> bool {
        let Some(raw) = self.storage.get_item_sync(key.encode()) else {
            return false;
        };
        match serde_json::from_str::<CacheEntry<serde_json::Value>>(&raw) {
            Ok(entry) => entry.age_at(now) < ttl,
            Err(_) => false,
        }
    }

    pub fn is_fresh(&self, key: &StoreKey, ttl: Duration) -> bool {
        self.is_fresh_at(key, ttl, Utc::now())
    }

    /// Age of the stored entry, if one parses.
    pub fn age_at(&self, key: &StoreKey, now: DateTime<Utc>) -> Option<Duration> {
        let raw = self.storage.get_item_sync(key.encode())?;
        serde_json::from_str::<CacheEntry<serde_json::Value>>(&raw)
            .ok()
            .map(|entry| entry.age_at(now))
    }

    pub fn age(&self, key: &StoreKey) -> Option<Duration> {
        self.age_at(key, Utc::now())
    }

    /// Drop the entry for a key.
    pub fn evict(&self, key: &StoreKey) {
        self.storage.remove_item_sync(key.encode());
    }

    /// Sweep the cache namespace, removing entries past their own TTL and
    /// entries that no longer parse. Returns how many were removed.
    pub async fn clear_expired(&self) -> usize {
        let now = Utc::now();
        let mut cleared = 0;
        for key in self.storage.get_all_keys().await {
            if !StoreKey::is_cache_key(&key) {
                continue;
            }
            let Some(raw) = self.storage.get_item(&key).await else {
                continue;
            };
            let expired = match serde_json::from_str::<CacheEntry<serde_json::Value>>(&raw) {
                Ok(entry) => !entry.is_fresh_at(now),
                // Unreadable entry: remove it.
                Err(_) => true,
            };
            if expired {
                if self.storage.remove_item(&key).await.is_ok() {
                    cleared += 1;
                }
            }
        }
        if cleared > 0 {
            debug!(cleared, "removed expired cache entries");
        }
        cleared
    }

    /// Remove every entry in the cache namespace.
    pub async fn clear_all(&self) -> usize {
        let mut cleared = 0;
        for key in self.storage.get_all_keys().await {
            if StoreKey::is_cache_key(&key) && self.storage.remove_item(&key).await.is_ok() {
                cleared += 1;
            }
        }
        cleared
    }
}
