//! # Cache Trait Hierarchy
//!
//! Small capability traits that the engine is built from and that callers
//! plug into.
//!
//! ```text
//!   ┌──────────────────────────────┐      ┌──────────────────────────────┐
//!   │ Keyed<K>                     │      │ Segmenter<K>                 │
//!   │   key(&) → &K                │      │   segment_count() → usize    │
//!   │ value carries its identity   │      │   segment(&K) → [0, count)   │
//!   └──────────────────────────────┘      └──────────────────────────────┘
//!
//!   ┌──────────────────────────────────────────────────────────────────────┐
//!   │ Cache<K, V>  (FlatCache, SegmentedCache)                             │
//!   │   put(V)                      get(&K) → Option<Arc<V>>               │
//!   │   items_for_eviction() → Vec<CacheStatisticsSnapshot<K>>             │
//!   │   evict(keys) → usize         evict_with(decision) → usize           │
//!   └──────────────────────────────────┬───────────────────────────────────┘
//!                                      │ candidates
//!                                      ▼
//!   ┌──────────────────────────────────────────────────────────────────────┐
//!   │ EvictionDecision<K>  (caller-supplied policy: LRU, LFU, size, ...)   │
//!   │   select(&[CacheStatisticsSnapshot<K>]) → Vec<K>                     │
//!   └──────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The engine never decides *which* items go. It lists eviction candidates
//! with their statistics and evicts the keys a decision hands back.
//!
//! ## Thread Safety
//!
//! Every `Cache` implementation in this crate takes `&self` and is
//! `Send + Sync` when its store, estimator and expiration policy are.

use std::borrow::Borrow;
use std::sync::Arc;

use crate::error::Result;
use crate::stats::CacheStatisticsSnapshot;

/// A cached value that carries its own key.
///
/// The cache never synthesizes keys; every value is stored under
/// `value.key()`.
pub trait Keyed<K> {
    fn key(&self) -> &K;
}

impl<K, T> Keyed<K> for (K, T) {
    fn key(&self) -> &K {
        &self.0
    }
}

/// Deterministic partition function from keys to segment indices.
///
/// Must be total and return a value in `[0, segment_count())` for every key
/// the cache will ever see. A segmented cache rejects out-of-range indices
/// with [`CacheError::InvalidArgument`](crate::error::CacheError::InvalidArgument).
pub trait Segmenter<K>: Send + Sync {
    /// Number of segments this function partitions into.
    fn segment_count(&self) -> usize;

    /// Segment index for `key`.
    fn segment(&self, key: &K) -> usize;
}

/// Caller-supplied eviction policy step.
///
/// Receives the current eviction candidates and returns the keys to evict.
/// Implemented for any `FnMut(&[CacheStatisticsSnapshot<K>]) -> Vec<K>`.
pub trait EvictionDecision<K> {
    fn select(&mut self, candidates: &[CacheStatisticsSnapshot<K>]) -> Vec<K>;
}

impl<K, F> EvictionDecision<K> for F
where
    F: FnMut(&[CacheStatisticsSnapshot<K>]) -> Vec<K>,
{
    fn select(&mut self, candidates: &[CacheStatisticsSnapshot<K>]) -> Vec<K> {
        self(candidates)
    }
}

/// Facade shared by flat and segmented caches.
pub trait Cache<K, V> {
    /// Insert `value` under its own key, or update the existing item.
    fn put(&self, value: V) -> Result<()>;

    /// Fetch the value for `key`. `Ok(None)` is a normal miss.
    fn get(&self, key: &K) -> Result<Option<Arc<V>>>;

    /// Statistics snapshots of every non-expired item whose value is
    /// currently stored.
    fn items_for_eviction(&self) -> Result<Vec<CacheStatisticsSnapshot<K>>>;

    /// Evict the given keys. Missing, expired and already-evicted keys are
    /// skipped; returns how many items were evicted.
    fn evict<I>(&self, keys: I) -> Result<usize>
    where
        I: IntoIterator,
        I::Item: Borrow<K>;

    /// Run `decision` over the current candidates and evict what it selects.
    fn evict_with<D>(&self, mut decision: D) -> Result<usize>
    where
        D: EvictionDecision<K>,
    {
        let candidates = self.items_for_eviction()?;
        if candidates.is_empty() {
            return Ok(0);
        }
        let victims = decision.select(&candidates);
        self.evict(victims)
    }
}
