//! In-memory value stores.
//!
//! ## Architecture
//! - Values live in an `FxHashMap<K, Arc<V>>`, keyed by the value's own key.
//! - `MemoryStore` guards one map with a single `RwLock`.
//! - `ShardedMemoryStore` spreads keys over per-shard locks chosen by a
//!   [`ShardSelector`].
//!
//! ## Core Operations
//! - `put`: insert or replace by the value's key.
//! - `get`: fetch by key (updates hit/miss metrics).
//! - `contains`: presence check without touching metrics.
//! - `remove`: delete by key.
//!
//! ## Example Usage
//! ```rust
//! use std::sync::Arc;
//!
//! use statcache::store::memory::MemoryStore;
//! use statcache::store::traits::ValueStore;
//! use statcache::traits::Keyed;
//!
//! #[derive(Debug)]
//! struct Page { id: u64, body: String }
//!
//! impl Keyed<u64> for Page {
//!     fn key(&self) -> &u64 { &self.id }
//! }
//!
//! let store: MemoryStore<u64, Page> = MemoryStore::new();
//! store.put(Arc::new(Page { id: 1, body: "a".into() })).unwrap();
//! assert!(store.contains(&1).unwrap());
//! ```
//!
//! ## Thread Safety
//! - Both stores are `Send + Sync`; each call takes its lock once and
//!   releases it before returning.
//! - The optional entry capacity of `ShardedMemoryStore` is reserved with a
//!   CAS loop so concurrent inserts never overshoot it.
use std::collections::hash_map::Entry;
use std::hash::Hash;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::ds::ShardSelector;
use crate::store::traits::{StoreError, StoreFactory, StoreMetrics, ValueStore};
use crate::traits::Keyed;

/// Store metrics counters shared by the in-memory stores.
#[derive(Debug, Default)]
struct StoreCounters {
    hits: AtomicU64,
    misses: AtomicU64,
    inserts: AtomicU64,
    removes: AtomicU64,
}

impl StoreCounters {
    fn snapshot(&self) -> StoreMetrics {
        StoreMetrics {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            inserts: self.inserts.load(Ordering::Relaxed),
            removes: self.removes.load(Ordering::Relaxed),
        }
    }

    fn record_lookup(&self, hit: bool) {
        if hit {
            self.hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn inc_insert(&self) {
        self.inserts.fetch_add(1, Ordering::Relaxed);
    }

    fn inc_remove(&self) {
        self.removes.fetch_add(1, Ordering::Relaxed);
    }
}

/// Value store backed by one `RwLock`-guarded hash map.
///
/// Unbounded by default; [`MemoryStore::with_capacity_limit`] makes `put`
/// of a new key fail with [`StoreError::Full`] once the limit is reached.
#[derive(Debug)]
pub struct MemoryStore<K, V> {
    map: RwLock<FxHashMap<K, Arc<V>>>,
    capacity: Option<usize>,
    metrics: StoreCounters,
}

impl<K, V> MemoryStore<K, V>
where
    K: Eq + Hash,
{
    /// Create an unbounded store.
    pub fn new() -> Self {
        Self {
            map: RwLock::new(FxHashMap::default()),
            capacity: None,
            metrics: StoreCounters::default(),
        }
    }

    /// Create a store that holds at most `capacity` values.
    pub fn with_capacity_limit(capacity: usize) -> Self {
        let mut map = FxHashMap::default();
        map.reserve(capacity);
        Self {
            map: RwLock::new(map),
            capacity: Some(capacity),
            metrics: StoreCounters::default(),
        }
    }

    /// Return the configured entry limit, if any.
    pub fn capacity_limit(&self) -> Option<usize> {
        self.capacity
    }
}

impl<K, V> Default for MemoryStore<K, V>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> ValueStore<K, V> for MemoryStore<K, V>
where
    K: Eq + Hash + Clone + Send + Sync,
    V: Keyed<K> + Send + Sync,
{
    fn put(&self, value: Arc<V>) -> Result<(), StoreError> {
        let mut map = self.map.write();
        let key = value.key();
        if let Some(capacity) = self.capacity {
            if !map.contains_key(key) && map.len() >= capacity {
                return Err(StoreError::Full);
            }
        }
        map.insert(key.clone(), value);
        self.metrics.inc_insert();
        Ok(())
    }

    fn get(&self, key: &K) -> Result<Option<Arc<V>>, StoreError> {
        let value = self.map.read().get(key).cloned();
        self.metrics.record_lookup(value.is_some());
        Ok(value)
    }

    fn remove(&self, key: &K) -> Result<Option<Arc<V>>, StoreError> {
        let removed = self.map.write().remove(key);
        if removed.is_some() {
            self.metrics.inc_remove();
        }
        Ok(removed)
    }

    fn contains(&self, key: &K) -> Result<bool, StoreError> {
        Ok(self.map.read().contains_key(key))
    }

    fn len(&self) -> usize {
        self.map.read().len()
    }

    fn metrics(&self) -> StoreMetrics {
        self.metrics.snapshot()
    }
}

/// Value store with per-shard locks.
#[derive(Debug)]
pub struct ShardedMemoryStore<K, V> {
    shards: Vec<RwLock<FxHashMap<K, Arc<V>>>>,
    selector: ShardSelector,
    capacity: Option<usize>,
    size: AtomicUsize,
    metrics: StoreCounters,
}

impl<K, V> ShardedMemoryStore<K, V>
where
    K: Eq + Hash,
{
    /// Create an unbounded store with `shards` locks (clamped to at least 1).
    pub fn new(shards: usize) -> Self {
        Self::build(shards, None)
    }

    /// Create a store with `shards` locks holding at most `capacity` values.
    pub fn with_capacity_limit(shards: usize, capacity: usize) -> Self {
        Self::build(shards, Some(capacity))
    }

    fn build(shards: usize, capacity: Option<usize>) -> Self {
        let selector = ShardSelector::new(shards, 0);
        let shards = (0..selector.shard_count())
            .map(|_| RwLock::new(FxHashMap::default()))
            .collect();
        Self {
            shards,
            selector,
            capacity,
            size: AtomicUsize::new(0),
            metrics: StoreCounters::default(),
        }
    }

    /// Return the number of shards.
    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    fn shard(&self, key: &K) -> &RwLock<FxHashMap<K, Arc<V>>> {
        &self.shards[self.selector.shard_for_key(key)]
    }

    fn reserve_slot(&self) -> Result<(), StoreError> {
        let Some(capacity) = self.capacity else {
            self.size.fetch_add(1, Ordering::Relaxed);
            return Ok(());
        };
        loop {
            let current = self.size.load(Ordering::Relaxed);
            if current >= capacity {
                return Err(StoreError::Full);
            }
            if self
                .size
                .compare_exchange(current, current + 1, Ordering::AcqRel, Ordering::Relaxed)
                .is_ok()
            {
                return Ok(());
            }
        }
    }
}

impl<K, V> ValueStore<K, V> for ShardedMemoryStore<K, V>
where
    K: Eq + Hash + Clone + Send + Sync,
    V: Keyed<K> + Send + Sync,
{
    fn put(&self, value: Arc<V>) -> Result<(), StoreError> {
        let key = value.key().clone();
        let mut map = self.shard(&key).write();
        match map.entry(key) {
            Entry::Occupied(mut entry) => {
                entry.insert(value);
            },
            Entry::Vacant(entry) => {
                self.reserve_slot()?;
                entry.insert(value);
            },
        }
        self.metrics.inc_insert();
        Ok(())
    }

    fn get(&self, key: &K) -> Result<Option<Arc<V>>, StoreError> {
        let value = self.shard(key).read().get(key).cloned();
        self.metrics.record_lookup(value.is_some());
        Ok(value)
    }

    fn remove(&self, key: &K) -> Result<Option<Arc<V>>, StoreError> {
        let removed = self.shard(key).write().remove(key);
        if removed.is_some() {
            self.size.fetch_sub(1, Ordering::Relaxed);
            self.metrics.inc_remove();
        }
        Ok(removed)
    }

    fn contains(&self, key: &K) -> Result<bool, StoreError> {
        Ok(self.shard(key).read().contains_key(key))
    }

    fn len(&self) -> usize {
        self.size.load(Ordering::Relaxed)
    }

    fn metrics(&self) -> StoreMetrics {
        self.metrics.snapshot()
    }
}

/// Factory producing [`MemoryStore`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct MemoryStoreFactory {
    capacity: Option<usize>,
}

impl MemoryStoreFactory {
    /// Factory for unbounded stores.
    pub fn new() -> Self {
        Self::default()
    }

    /// Factory for stores limited to `capacity` values each.
    pub fn with_capacity_limit(capacity: usize) -> Self {
        Self {
            capacity: Some(capacity),
        }
    }
}

impl<K, V> StoreFactory<K, V> for MemoryStoreFactory
where
    K: Eq + Hash + Clone + Send + Sync,
    V: Keyed<K> + Send + Sync,
{
    type Store = MemoryStore<K, V>;

    fn create(&self) -> Self::Store {
        match self.capacity {
            Some(capacity) => MemoryStore::with_capacity_limit(capacity),
            None => MemoryStore::new(),
        }
    }
}

/// Factory producing [`ShardedMemoryStore`]s.
#[derive(Debug, Clone, Copy)]
pub struct ShardedMemoryStoreFactory {
    shards: usize,
}

impl ShardedMemoryStoreFactory {
    /// Factory for stores with `shards` locks each.
    pub fn new(shards: usize) -> Self {
        Self { shards }
    }
}

impl Default for ShardedMemoryStoreFactory {
    /// One shard per available CPU.
    fn default() -> Self {
        let shards = std::thread::available_parallelism()
            .map(|count| count.get())
            .unwrap_or(1);
        Self::new(shards)
    }
}

impl<K, V> StoreFactory<K, V> for ShardedMemoryStoreFactory
where
    K: Eq + Hash + Clone + Send + Sync,
    V: Keyed<K> + Send + Sync,
{
    type Store = ShardedMemoryStore<K, V>;

    fn create(&self) -> Self::Store {
        ShardedMemoryStore::new(self.shards)
    }
}
