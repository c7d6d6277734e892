//! Cache-first stores with background revalidation.
//!
//! One [`CachedStore`] instance owns one domain collection (progress,
//! goals, favorites). Reads are served from cache whenever the cached
//! envelope is fresh under the store's hard TTL; past the soft threshold a
//! silent background refresh runs behind the served value; only a hard
//! miss blocks on the network. A remote failure prefers stale data over an
//! error banner — `StoreState.error` is only ever set when there is nothing
//! cached to serve.
//!
//! `StoreState` is mutated exclusively by its owning store's methods (and
//! the store's mutator); nothing else reaches into it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::key::StoreKey;
use crate::mutate::OptimisticMutator;
use crate::overlay::SyncStorage;
use crate::remote::RemoteSource;
use crate::ttl::TtlCache;
use nourish_core::{dates, CachePolicy, MutationError};

/// UI-facing state of one cached store.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreState<T> {
    pub data: Option<T>,
    pub last_fetch_time: Option<DateTime<Utc>>,
    pub loading: bool,
    pub error: Option<String>,
}

impl<T> Default for StoreState<T> {
    fn default() -> Self {
        Self {
            data: None,
            last_fetch_time: None,
            loading: false,
            error: None,
        }
    }
}

/// Shared handle to a store's state.
pub type SharedState<T> = Arc<RwLock<StoreState<T>>>;

/// The blob persisted per store under `cache_<name>`.
///
/// `cached_date` is the local day key for day-scoped stores; a read on a
/// later date treats the envelope as a miss regardless of TTL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreEnvelope<T> {
    pub state: T,
    pub last_fetch_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cached_date: Option<String>,
}

/// Where a store currently is in its serve/refresh lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorePhase {
    /// No data, not loading.
    Empty,
    /// Awaiting a blocking fetch.
    Loading,
    /// Serving from state, no network activity.
    Fresh,
    /// Serving from state while a background refresh is in flight.
    StaleRefreshing,
}

/// Configuration for one cached store.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Logical store name; also the cache key suffix.
    pub name: String,
    pub policy: CachePolicy,
    /// Invalidate across a local date rollover even inside TTL.
    pub day_scoped: bool,
    /// Surfaced in `StoreState.error` when a blocking fetch fails with
    /// nothing cached to fall back on.
    pub error_message: String,
}

impl StoreConfig {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let error_message = format!("Failed to fetch {name}. Please try again.");
        Self {
            name,
            policy: CachePolicy::default(),
            day_scoped: false,
            error_message,
        }
    }

    pub fn with_policy(mut self, policy: CachePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn day_scoped(mut self, day_scoped: bool) -> Self {
        self.day_scoped = day_scoped;
        self
    }

    pub fn with_error_message(mut self, message: impl Into<String>) -> Self {
        self.error_message = message.into();
        self
    }
}

/// Cache-first store over one remote collection.
pub struct CachedStore<T> {
    config: StoreConfig,
    key: StoreKey,
    state: SharedState<T>,
    cache: TtlCache,
    remote: Arc<dyn RemoteSource<T>>,
    refreshing: Arc<AtomicBool>,
}

impl<T> Clone for CachedStore<T> {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            key: self.key.clone(),
            state: Arc::clone(&self.state),
            cache: self.cache.clone(),
            remote: Arc::clone(&self.remote),
            refreshing: Arc::clone(&self.refreshing),
        }
    }
}

impl<T> CachedStore<T>
where
    T: Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
{
    /// Build the store and rehydrate its state from the persisted envelope
    /// (ignoring a day-scoped envelope from a previous day).
    ///
    /// Construct after `storage.ready()` when offline-first rehydration
    /// matters; constructing earlier only means the first fetch goes to the
    /// network.
    pub fn new(
        config: StoreConfig,
        storage: SyncStorage,
        remote: Arc<dyn RemoteSource<T>>,
    ) -> Self {
        let key = StoreKey::for_store(&config.name);
        let cache = TtlCache::new(storage);

        let mut state = StoreState::default();
        if let Some((envelope, _)) = cache.read_stale::<StoreEnvelope<T>>(&key) {
            if Self::envelope_day_ok(&config, &envelope) {
                state.data = Some(envelope.state);
                state.last_fetch_time = envelope.last_fetch_time;
            }
        }

        Self {
            config,
            key,
            state: Arc::new(RwLock::new(state)),
            cache,
            remote,
            refreshing: Arc::new(AtomicBool::new(false)),
        }
    }

    fn envelope_day_ok(config: &StoreConfig, envelope: &StoreEnvelope<T>) -> bool {
        if !config.day_scoped {
            return true;
        }
        envelope
            .cached_date
            .as_deref()
            .map(dates::is_today)
            .unwrap_or(false)
    }

    fn read_state(&self) -> std::sync::RwLockReadGuard<'_, StoreState<T>> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> std::sync::RwLockWriteGuard<'_, StoreState<T>> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Snapshot for synchronous UI reads.
    pub fn snapshot(&self) -> StoreState<T> {
        self.read_state().clone()
    }

    /// Whether a background refresh is in flight.
    pub fn is_refreshing(&self) -> bool {
        self.refreshing.load(Ordering::SeqCst)
    }

    pub fn phase(&self) -> StorePhase {
        let state = self.read_state();
        match (&state.data, state.loading) {
            (Some(_), _) => {
                if self.is_refreshing() {
                    StorePhase::StaleRefreshing
                } else {
                    StorePhase::Fresh
                }
            }
            (None, true) => StorePhase::Loading,
            (None, false) => StorePhase::Empty,
        }
    }

    /// A mutator bound to this store's state.
    pub fn mutator(&self) -> OptimisticMutator<T> {
        OptimisticMutator::new(Arc::clone(&self.state))
    }

    /// Cache-first fetch.
    ///
    /// 1. Fresh under the hard TTL (and the right day): serve state as-is;
    ///    past the soft threshold, kick a silent background refresh.
    /// 2. Otherwise block on the remote; on failure prefer a stale cached
    ///    value over an error, and only surface `error_message` when the
    ///    cache is empty too.
    pub async fn fetch(&self, id: &str) {
        let now = Utc::now();
        let has_data = self.read_state().data.is_some();

        if has_data && self.cache_fresh_at(now) {
            {
                let mut state = self.write_state();
                state.loading = false;
                state.error = None;
            }
            let wants_refresh = self
                .cache
                .age_at(&self.key, now)
                .map(|age| age >= self.config.policy.refresh_after())
                .unwrap_or(false);
            if wants_refresh {
                self.spawn_background_refresh(id);
            }
            return;
        }

        {
            let mut state = self.write_state();
            state.loading = true;
            state.error = None;
        }
        match self.remote.fetch_entity(id).await {
            Ok(value) => self.populate(value, Utc::now()),
            Err(err) => self.fall_back_to_stale(&err),
        }
    }

    /// Fresh under the hard TTL, including the day-scope check.
    fn cache_fresh_at(&self, now: DateTime<Utc>) -> bool {
        if !self.cache.is_fresh_at(&self.key, self.config.policy.ttl, now) {
            return false;
        }
        if !self.config.day_scoped {
            return true;
        }
        match self.cache.read_stale::<StoreEnvelope<T>>(&self.key) {
            Some((envelope, _)) => Self::envelope_day_ok(&self.config, &envelope),
            None => false,
        }
    }

    /// Overwrite state with a server value and persist the envelope.
    fn populate(&self, value: T, fetched_at: DateTime<Utc>) {
        {
            let mut state = self.write_state();
            state.data = Some(value);
            state.last_fetch_time = Some(fetched_at);
            state.loading = false;
            state.error = None;
        }
        self.persist_current();
    }

    /// Persist the current state as this store's envelope; an empty store
    /// evicts its envelope instead.
    fn persist_current(&self) {
        let (data, last_fetch_time) = {
            let state = self.read_state();
            (state.data.clone(), state.last_fetch_time)
        };
        match data {
            Some(state) => {
                let envelope = StoreEnvelope {
                    state,
                    last_fetch_time,
                    cached_date: self.config.day_scoped.then(dates::today_local),
                };
                self.cache.write(&self.key, &envelope, self.config.policy.ttl);
            }
            None => self.cache.evict(&self.key),
        }
    }

    /// A blocking fetch failed: serve stale cache if the day scope allows,
    /// else surface the store's error message.
    fn fall_back_to_stale(&self, err: &nourish_core::RemoteError) {
        let stale = match self.cache.read_stale::<StoreEnvelope<T>>(&self.key) {
            Some((envelope, _)) if Self::envelope_day_ok(&self.config, &envelope) => {
                Some(envelope)
            }
            _ => None,
        };
        let mut state = self.write_state();
        match stale {
            Some(envelope) => {
                warn!(store = %self.config.name, %err, "fetch failed; serving stale cache");
                state.data = Some(envelope.state);
                state.last_fetch_time = envelope.last_fetch_time;
                state.loading = false;
                state.error = None;
            }
            None => {
                state.loading = false;
                state.error = Some(self.config.error_message.clone());
            }
        }
    }

    /// Unawaited refresh behind a served read. Not deduplicated: overlapping
    /// refreshes are idempotent reads and the last one to resolve wins.
    fn spawn_background_refresh(&self, id: &str) {
        let store = self.clone();
        let id = id.to_string();
        self.refreshing.store(true, Ordering::SeqCst);
        tokio::spawn(async move {
            match store.remote.fetch_entity(&id).await {
                Ok(value) => {
                    store.populate(value, Utc::now());
                    debug!(store = %store.config.name, "background refresh applied");
                }
                Err(err) => {
                    warn!(store = %store.config.name, %err, "background refresh failed; keeping served state");
                }
            }
            store.refreshing.store(false, Ordering::SeqCst);
        });
    }

    /// Optimistic mutation: apply `mutate` to state synchronously, persist
    /// the guess, run `commit`, then reconcile (server wins) or roll back
    /// to the exact pre-mutation snapshot. The envelope tracks whichever
    /// way it went.
    pub async fn apply<M, C, Fut>(&self, mutate: M, commit: C) -> Result<(), MutationError>
    where
        M: FnOnce(T) -> T,
        C: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<Option<T>, nourish_core::RemoteError>>,
    {
        let mutator = self.mutator();
        let snapshot = mutator.apply_local(mutate);
        self.persist_current();
        match commit().await {
            Ok(server) => {
                mutator.reconcile(server);
                self.persist_current();
                Ok(())
            }
            Err(err) => {
                let err = MutationError::from(err);
                mutator.rollback(snapshot, &err.message);
                self.persist_current();
                Err(err)
            }
        }
    }

    /// Optimistic mutation committed through this store's remote source.
    pub async fn mutate<M>(&self, id: &str, patch: Value, mutate: M) -> Result<(), MutationError>
    where
        M: FnOnce(T) -> T,
    {
        let remote = Arc::clone(&self.remote);
        let id = id.to_string();
        self.apply(mutate, move || async move {
            remote.mutate_entity(&id, patch).await.map(Some)
        })
        .await
    }

    /// Reset state and evict the envelope (logout / account switch). The
    /// only transition that takes `data` back to `None`.
    pub fn clear(&self) {
        {
            let mut state = self.write_state();
            *state = StoreState::default();
        }
        self.cache.evict(&self.key);
    }
}
