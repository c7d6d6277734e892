//! Error types for Nourish sync operations

use thiserror::Error;

/// Storage backend errors.
///
/// Raised by the platform key/value backends. Read paths downgrade these to
/// cache misses at the overlay boundary; mutation-relevant paths see them.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("Storage backend unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("Storage {op} failed for key {key}: {reason}")]
    OperationFailed {
        op: &'static str,
        key: String,
        reason: String,
    },
}

impl StorageError {
    /// Build an `OperationFailed` for the given operation and key.
    pub fn op(op: &'static str, key: impl Into<String>, reason: impl ToString) -> Self {
        Self::OperationFailed {
            op,
            key: key.into(),
            reason: reason.to_string(),
        }
    }
}

/// Cache layer errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CacheError {
    /// The stored JSON for a key is corrupt or schema-mismatched.
    ///
    /// Always treated as a cache miss; the offending key is evicted so it
    /// cannot poison future reads.
    #[error("Corrupt cache entry for {key}: {reason}")]
    Parse { key: String, reason: String },
}

/// Remote service errors.
///
/// Every variant carries the user-facing message attached at the API layer,
/// so higher layers can surface it verbatim in `StoreState.error`.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RemoteError {
    #[error("{message}")]
    Network { message: String },

    #[error("{message}")]
    Http { status: u16, message: String },

    #[error("Invalid response from server: {reason}")]
    Decode { reason: String },
}

impl RemoteError {
    /// Shorthand for a network failure with a user-facing message.
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// The message suitable for direct display to the user.
    pub fn user_message(&self) -> &str {
        match self {
            Self::Network { message } => message,
            Self::Http { message, .. } => message,
            Self::Decode { .. } => "Something went wrong. Please try again.",
        }
    }
}

/// A remote commit failed after an optimistic local mutation.
///
/// The local state has already been rolled back to the pre-mutation snapshot
/// by the time this error reaches the caller.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct MutationError {
    pub message: String,
    #[source]
    pub source: RemoteError,
}

impl From<RemoteError> for MutationError {
    fn from(source: RemoteError) -> Self {
        Self {
            message: source.user_message().to_string(),
            source,
        }
    }
}

/// Master error type for all Nourish operations.
#[derive(Debug, Clone, Error)]
pub enum NourishError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("Remote error: {0}")]
    Remote(#[from] RemoteError),

    #[error("Mutation error: {0}")]
    Mutation(#[from] MutationError),
}

/// Result type alias for Nourish operations.
pub type NourishResult<T> = Result<T, NourishError>;
