//! Segmented cache: one flat cache per segment.
//!
//! ## Architecture
//!
//! ```text
//!   put(V) / get(&K)
//!        │
//!        ▼
//!   Segmenter::segment(key) ──► i in [0, N)
//!        │
//!        ▼
//!   ┌─────────────┬─────────────┬─────────────┬─────────────┐
//!   │ FlatCache 0 │ FlatCache 1 │     ...     │ FlatCache N-1│
//!   │ dir + store │ dir + store │             │ dir + store │
//!   └─────────────┴─────────────┴─────────────┴─────────────┘
//! ```
//!
//! Segments are built once, each with its own directory and its own store
//! from the store factory, and never change. Every key routes to exactly one
//! segment, so segments share no state and no lock.
//!
//! There is no cross-segment operation. The [`Cache`] implementation fans
//! `items_for_eviction` out over the segments one at a time and routes each
//! key of `evict` to its own segment; callers wanting per-segment policy use
//! [`SegmentedCache::segment`] / [`SegmentedCache::segments`] directly.

use std::borrow::Borrow;
use std::hash::Hash;
use std::sync::Arc;

use tracing::debug;

use crate::error::{CacheError, Result};
use crate::expiration::ExpirationPolicy;
use crate::flat::FlatCache;
use crate::metrics::CacheMetricsSnapshot;
use crate::size::SizeEstimator;
use crate::stats::CacheStatisticsSnapshot;
use crate::store::traits::{StoreFactory, ValueStore};
use crate::traits::{Cache, Keyed, Segmenter};

/// Segmentation function backed by a closure.
pub struct FnSegmenter<F> {
    count: usize,
    f: F,
}

impl<F> FnSegmenter<F> {
    /// `f` must return a value in `[0, count)` for every key.
    pub fn new(count: usize, f: F) -> Self {
        Self { count, f }
    }
}

impl<K, F> Segmenter<K> for FnSegmenter<F>
where
    F: Fn(&K) -> usize + Send + Sync,
{
    fn segment_count(&self) -> usize {
        self.count
    }

    fn segment(&self, key: &K) -> usize {
        (self.f)(key)
    }
}

impl<F> std::fmt::Debug for FnSegmenter<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnSegmenter")
            .field("count", &self.count)
            .finish_non_exhaustive()
    }
}

/// Cache sharded over a fixed set of flat caches.
pub struct SegmentedCache<K, V, S, E, X, G> {
    segments: Vec<FlatCache<K, V, S, E, X>>,
    segmenter: G,
}

impl<K, V, S, E, X, G> SegmentedCache<K, V, S, E, X, G>
where
    K: Eq + Hash + Clone,
    V: Keyed<K>,
    G: Segmenter<K>,
{
    /// Build `segmenter.segment_count()` segments, each with a fresh store.
    ///
    /// A segmenter with zero segments yields a cache that rejects every key
    /// with `InvalidArgument`; the builder refuses that configuration.
    pub fn new<F>(
        segmenter: G,
        factory: &F,
        estimator: Arc<E>,
        expiration: Arc<X>,
        directory_shards: usize,
    ) -> Self
    where
        F: StoreFactory<K, V, Store = S>,
    {
        let count = segmenter.segment_count();
        let segments = (0..count)
            .map(|_| {
                FlatCache::with_parts(
                    factory.create(),
                    Arc::clone(&estimator),
                    Arc::clone(&expiration),
                    directory_shards,
                )
            })
            .collect();
        debug!(segments = count, directory_shards, "built segmented cache");
        Self {
            segments,
            segmenter,
        }
    }

    /// Number of segments.
    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    /// Segment index for `key`, validated against the segment count.
    pub fn segment_index(&self, key: &K) -> Result<usize> {
        let index = self.segmenter.segment(key);
        if index >= self.segments.len() {
            return Err(CacheError::invalid_argument(format!(
                "segmenter returned index {index} for {} segments",
                self.segments.len()
            )));
        }
        Ok(index)
    }

    /// The segment that owns `key`.
    pub fn segment_for(&self, key: &K) -> Result<&FlatCache<K, V, S, E, X>> {
        let index = self.segment_index(key)?;
        Ok(&self.segments[index])
    }

    /// Segment by index.
    pub fn segment(&self, index: usize) -> Option<&FlatCache<K, V, S, E, X>> {
        self.segments.get(index)
    }

    /// All segments in index order.
    pub fn segments(&self) -> &[FlatCache<K, V, S, E, X>] {
        &self.segments
    }

    pub fn segmenter(&self) -> &G {
        &self.segmenter
    }

    /// Items across all segments, evicted ones included.
    pub fn len(&self) -> usize {
        self.segments.iter().map(FlatCache::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.iter().all(FlatCache::is_empty)
    }
}

impl<K, V, S, E, X, G> SegmentedCache<K, V, S, E, X, G>
where
    K: Eq + Hash + Clone,
    V: Keyed<K>,
    S: ValueStore<K, V>,
    E: SizeEstimator<V>,
    X: ExpirationPolicy,
    G: Segmenter<K>,
{
    /// Store `value` in the segment owning its key.
    pub fn put(&self, value: V) -> Result<()> {
        let segment = self.segment_for(value.key())?;
        segment.put(value)
    }

    /// Fetch `key` from its segment.
    pub fn get(&self, key: &K) -> Result<Option<Arc<V>>> {
        self.segment_for(key)?.get(key)
    }

    /// Force the item for `key` into the expired state.
    pub fn expire(&self, key: &K) -> Result<bool> {
        Ok(self.segment_for(key)?.expire(key))
    }

    /// Statistics snapshot for `key` from its segment.
    pub fn statistics(&self, key: &K) -> Result<Option<CacheStatisticsSnapshot<K>>> {
        Ok(self.segment_for(key)?.statistics(key))
    }

    /// Purge expired items segment by segment.
    pub fn purge_expired(&self) -> Result<usize> {
        let mut purged = 0;
        for segment in &self.segments {
            purged += segment.purge_expired()?;
        }
        Ok(purged)
    }

    /// Sum of the segments' metrics.
    pub fn metrics(&self) -> CacheMetricsSnapshot {
        self.segments.iter().map(FlatCache::metrics).sum()
    }
}

impl<K, V, S, E, X, G> Cache<K, V> for SegmentedCache<K, V, S, E, X, G>
where
    K: Eq + Hash + Clone,
    V: Keyed<K>,
    S: ValueStore<K, V>,
    E: SizeEstimator<V>,
    X: ExpirationPolicy,
    G: Segmenter<K>,
{
    fn put(&self, value: V) -> Result<()> {
        SegmentedCache::put(self, value)
    }

    fn get(&self, key: &K) -> Result<Option<Arc<V>>> {
        SegmentedCache::get(self, key)
    }

    fn items_for_eviction(&self) -> Result<Vec<CacheStatisticsSnapshot<K>>> {
        let mut candidates = Vec::new();
        for segment in &self.segments {
            candidates.extend(segment.items_for_eviction()?);
        }
        Ok(candidates)
    }

    fn evict<I>(&self, keys: I) -> Result<usize>
    where
        I: IntoIterator,
        I::Item: Borrow<K>,
    {
        // A misrouted key fails the call before any segment is touched.
        let keys: Vec<I::Item> = keys.into_iter().collect();
        let mut routed: Vec<Vec<&K>> = vec![Vec::new(); self.segments.len()];
        for key in &keys {
            let key: &K = key.borrow();
            routed[self.segment_index(key)?].push(key);
        }

        let mut evicted = 0;
        for (segment, keys) in self.segments.iter().zip(routed) {
            if !keys.is_empty() {
                evicted += segment.evict(keys)?;
            }
        }
        Ok(evicted)
    }
}

impl<K, V, S, E, X, G> std::fmt::Debug for SegmentedCache<K, V, S, E, X, G>
where
    K: Eq + Hash + Clone,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SegmentedCache")
            .field("segments", &self.segments)
            .finish_non_exhaustive()
    }
}
