//! Remote service interface consumed by the cached stores.
//!
//! The core treats every rejection as a retryable-by-user failure and never
//! retries on its own; timeouts belong to the implementation behind this
//! trait.

use async_trait::async_trait;
use nourish_core::RemoteError;
use serde_json::Value;

/// One remote collection (progress, goals, favorites, ...).
///
/// `fetch_entity` returns the collection's current server state;
/// `mutate_entity` applies a partial update and returns the authoritative
/// post-mutation state, which wins over any locally-applied guess.
#[async_trait]
pub trait RemoteSource<T>: Send + Sync {
    async fn fetch_entity(&self, id: &str) -> Result<T, RemoteError>;

    async fn mutate_entity(&self, id: &str, patch: Value) -> Result<T, RemoteError>;
}
