//! Optimistic mutation with exact rollback.
//!
//! A mutation is applied to the owning store's state synchronously, so the
//! UI reflects it with zero latency, while the remote commit runs behind
//! it. A failed commit restores the exact pre-mutation snapshot; a
//! successful one reconciles with the server's authoritative response.
//!
//! The mutator touches only `StoreState`. Persistence of the optimistic
//! value and of the reconciled result is the cached store's job (see
//! `CachedStore::apply`).

use std::future::Future;
use std::sync::{Arc, PoisonError};

use nourish_core::{MutationError, RemoteError};

use crate::store::{SharedState, StoreState};

/// Applies optimistic mutations to one store's state.
pub struct OptimisticMutator<T> {
    state: SharedState<T>,
}

impl<T: Clone> OptimisticMutator<T> {
    pub fn new(state: SharedState<T>) -> Self {
        Self { state }
    }

    fn lock(&self) -> std::sync::RwLockWriteGuard<'_, StoreState<T>> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Snapshot the current data and replace it with `mutate(data)`.
    ///
    /// Returns the snapshot to restore on rollback. When the store holds no
    /// data the local step is a no-op and the snapshot is `None`.
    pub fn apply_local<M>(&self, mutate: M) -> Option<T>
    where
        M: FnOnce(T) -> T,
    {
        let mut state = self.lock();
        let snapshot = state.data.clone();
        if let Some(data) = state.data.take() {
            state.data = Some(mutate(data));
        }
        snapshot
    }

    /// Commit succeeded: the server's state, when returned, wins over the
    /// locally-applied guess.
    pub fn reconcile(&self, server: Option<T>) {
        let mut state = self.lock();
        if let Some(value) = server {
            state.data = Some(value);
        }
        state.error = None;
    }

    /// Commit failed: restore the exact snapshot and surface the message.
    pub fn rollback(&self, snapshot: Option<T>, message: &str) {
        let mut state = self.lock();
        state.data = snapshot;
        state.error = Some(message.to_string());
    }

    /// The full optimistic sequence: snapshot, local apply, commit, then
    /// reconcile or roll back. The error is returned to the caller — a
    /// user-initiated action must never fail silently.
    ///
    /// No lock is held across the commit await, so a second `apply` started
    /// before this one resolves snapshots the already-mutated state;
    /// mutations compose, and concurrent mutation of one entity is the
    /// caller's responsibility to avoid.
    pub async fn apply<M, C, Fut>(&self, mutate: M, commit: C) -> Result<(), MutationError>
    where
        M: FnOnce(T) -> T,
        C: FnOnce() -> Fut,
        Fut: Future<Output = Result<Option<T>, RemoteError>>,
    {
        let snapshot = self.apply_local(mutate);
        match commit().await {
            Ok(server) => {
                self.reconcile(server);
                Ok(())
            }
            Err(err) => {
                let err = MutationError::from(err);
                self.rollback(snapshot, &err.message);
                Err(err)
            }
        }
    }
}

impl<T> Clone for OptimisticMutator<T> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nourish_core::RemoteError;
    use std::sync::RwLock;

    fn shared(data: Option<u32>) -> SharedState<u32> {
        Arc::new(RwLock::new(StoreState {
            data,
            ..StoreState::default()
        }))
    }

    fn data(state: &SharedState<u32>) -> Option<u32> {
        state.read().expect("lock").data
    }

    fn error(state: &SharedState<u32>) -> Option<String> {
        state.read().expect("lock").error.clone()
    }

    #[tokio::test]
    async fn test_successful_commit_keeps_local_guess_without_server_state() {
        let state = shared(Some(1200));
        let mutator = OptimisticMutator::new(Arc::clone(&state));

        mutator
            .apply(|v| v + 300, || async { Ok(None) })
            .await
            .expect("commit should succeed");

        assert_eq!(data(&state), Some(1500));
        assert_eq!(error(&state), None);
    }

    #[tokio::test]
    async fn test_server_state_wins_on_reconcile() {
        let state = shared(Some(1200));
        let mutator = OptimisticMutator::new(Arc::clone(&state));

        // Local guess says 1500; the server recomputed 1480.
        mutator
            .apply(|v| v + 300, || async { Ok(Some(1480)) })
            .await
            .expect("commit should succeed");

        assert_eq!(data(&state), Some(1480));
    }

    #[tokio::test]
    async fn test_failed_commit_rolls_back_exactly() {
        let state = shared(Some(1200));
        let mutator = OptimisticMutator::new(Arc::clone(&state));

        let err = mutator
            .apply(
                |v| v + 300,
                || async { Err(RemoteError::network("Failed to complete meal")) },
            )
            .await
            .expect_err("commit should fail");

        assert_eq!(data(&state), Some(1200));
        assert_eq!(error(&state), Some("Failed to complete meal".to_string()));
        assert_eq!(err.message, "Failed to complete meal");
    }

    #[tokio::test]
    async fn test_mutation_on_empty_state_is_local_noop() {
        let state = shared(None);
        let mutator = OptimisticMutator::new(Arc::clone(&state));

        let err = mutator
            .apply(
                |v| v + 1,
                || async { Err(RemoteError::network("offline")) },
            )
            .await
            .expect_err("commit should fail");

        assert_eq!(data(&state), None);
        assert_eq!(err.message, "offline");
    }

    #[tokio::test]
    async fn test_concurrent_mutations_compose() {
        let state = shared(Some(10));
        let mutator = OptimisticMutator::new(Arc::clone(&state));

        // The second apply_local snapshots the already-mutated state.
        let snap_a = mutator.apply_local(|v| v + 1);
        let snap_b = mutator.apply_local(|v| v * 2);
        assert_eq!(data(&state), Some(22));
        assert_eq!(snap_a, Some(10));
        assert_eq!(snap_b, Some(11));

        // Rolling back in reverse order of completion restores each stage.
        mutator.rollback(snap_b, "second failed");
        assert_eq!(data(&state), Some(11));
        mutator.rollback(snap_a, "first failed");
        assert_eq!(data(&state), Some(10));
    }
}
