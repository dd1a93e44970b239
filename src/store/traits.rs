//! Value store abstraction.
//!
//! Stores own the cached payloads and nothing else. Item metadata (size,
//! statistics, lifecycle) lives in the item directory of the owning
//! [`FlatCache`](crate::flat::FlatCache), so a store only needs to answer
//! put/get/remove by key. Any backend satisfying [`ValueStore`] can sit under
//! a cache: in-memory maps, sharded maps, or a persistent backend.

use std::sync::Arc;

use thiserror::Error;

use crate::traits::Keyed;

/// Snapshot of store-level metrics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreMetrics {
    pub hits: u64,
    pub misses: u64,
    pub inserts: u64,
    pub removes: u64,
}

/// Failure reported by a value store.
///
/// The cache never inspects or retries these; they surface to callers as
/// [`CacheError::Store`](crate::error::CacheError::Store).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The store is at its entry capacity and cannot accept a new key.
    #[error("value store is full")]
    Full,

    /// Backend-specific failure.
    #[error("value store backend failure: {0}")]
    Backend(String),
}

/// Key-addressed storage for cached values.
///
/// Values carry their own key (see [`Keyed`]). Each call is expected to be
/// atomic on its own; callers never hold a store across calls. Implementations
/// must be safe for concurrent calls on independent keys.
pub trait ValueStore<K, V>: Send + Sync
where
    V: Keyed<K>,
{
    /// Store a value under its own key, replacing any previous value.
    fn put(&self, value: Arc<V>) -> Result<(), StoreError>;

    /// Fetch the value stored for `key`.
    fn get(&self, key: &K) -> Result<Option<Arc<V>>, StoreError>;

    /// Remove the value stored for `key`, returning it if present.
    fn remove(&self, key: &K) -> Result<Option<Arc<V>>, StoreError>;

    /// Check whether a value is stored for `key` without touching hit/miss
    /// counters.
    fn contains(&self, key: &K) -> Result<bool, StoreError>;

    /// Current number of stored values.
    fn len(&self) -> usize;

    /// Check if the store is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot the store's current metrics.
    fn metrics(&self) -> StoreMetrics {
        StoreMetrics::default()
    }
}

/// Factory for value stores.
///
/// A segmented cache asks the factory for one fresh store per segment, so
/// segments never share a key space.
pub trait StoreFactory<K, V>
where
    V: Keyed<K>,
{
    type Store: ValueStore<K, V>;

    /// Create a new, empty store.
    fn create(&self) -> Self::Store;
}

impl<K, V, S, F> StoreFactory<K, V> for F
where
    V: Keyed<K>,
    S: ValueStore<K, V>,
    F: Fn() -> S,
{
    type Store = S;

    fn create(&self) -> S {
        self()
    }
}
