//! Namespaced cache keys.
//!
//! A [`StoreKey`] can only be built from a store name, so every cache blob
//! lands under the `cache_` namespace by construction. Sweeps over the
//! namespace (expiry, logout) go through the same type instead of matching
//! ad hoc string prefixes.

/// Prefix for all cache blobs.
const CACHE_PREFIX: &str = "cache_";

/// A storage key scoped to the cache namespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StoreKey {
    encoded: String,
}

impl StoreKey {
    /// Key for a store's persisted envelope: `cache_<name>`.
    pub fn for_store(name: &str) -> Self {
        Self {
            encoded: format!("{CACHE_PREFIX}{name}"),
        }
    }

    /// The full storage key.
    pub fn encode(&self) -> &str {
        &self.encoded
    }

    /// The store name this key belongs to.
    pub fn store_name(&self) -> &str {
        &self.encoded[CACHE_PREFIX.len()..]
    }

    /// Whether a raw storage key lives in the cache namespace.
    pub fn is_cache_key(key: &str) -> bool {
        key.starts_with(CACHE_PREFIX)
    }

    /// Reconstruct a `StoreKey` from a raw storage key, if it is one.
    pub fn decode(key: &str) -> Option<Self> {
        if Self::is_cache_key(key) {
            Some(Self {
                encoded: key.to_string(),
            })
        } else {
            None
        }
    }
}

impl std::fmt::Display for StoreKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.encoded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode() {
        let key = StoreKey::for_store("goals");
        assert_eq!(key.encode(), "cache_goals");
        assert_eq!(key.store_name(), "goals");
    }

    #[test]
    fn test_namespace_membership() {
        assert!(StoreKey::is_cache_key("cache_progress"));
        assert!(!StoreKey::is_cache_key("goals-storage"));
        assert!(!StoreKey::is_cache_key("auth_token"));
    }

    #[test]
    fn test_decode_round_trip() {
        let key = StoreKey::for_store("favorites");
        let decoded = StoreKey::decode(key.encode()).expect("cache key should decode");
        assert_eq!(decoded, key);
        assert!(StoreKey::decode("not_a_cache_key").is_none());
    }
}
