//! Single-segment cache.
//!
//! ## Architecture
//!
//! ```text
//!   put(V) / get(&K) / evict(keys)
//!        │
//!        ▼
//!   ┌─────────────────────────────┐        ┌─────────────────────────────┐
//!   │ ItemDirectory<K>            │        │ ValueStore<K, V>            │
//!   │  K → Arc<CacheItem<K>>      │        │  K → Arc<V>                 │
//!   │  size, statistics, state    │ ─────► │  the cached payloads        │
//!   └─────────────────────────────┘  item  └─────────────────────────────┘
//!                                     ops
//! ```
//!
//! The directory holds metadata, the store holds values. Every store access
//! goes through the key's item, under the item's lock. A key may have a
//! directory entry without a stored value (evicted, statistics retained), but
//! a stored value always has a directory entry.
//!
//! ## Eviction
//!
//! The cache has no eviction policy. [`FlatCache::items_for_eviction`] lists
//! statistics snapshots of every item whose value is stored; policy code picks
//! victims and hands their keys to [`FlatCache::evict`]. The list may be stale
//! by then: each key is re-checked under its item lock, and keys that are
//! missing, expired or already evicted are skipped.
//!
//! ## Expiration
//!
//! Expired items are cleaned up lazily. `get` on an expired item purges it
//! from the directory and the store and reports a miss;
//! [`FlatCache::purge_expired`] sweeps all of them. `put` on an expired item
//! fails with [`CacheError::AlreadyExpired`] until the item has been purged.
//!
//! ## Example Usage
//!
//! ```
//! use statcache::flat::FlatCache;
//! use statcache::store::memory::MemoryStore;
//!
//! let cache = FlatCache::new(MemoryStore::new());
//! cache.put(("user:1", "alice")).unwrap();
//! cache.put(("user:2", "bob")).unwrap();
//!
//! assert_eq!(cache.get(&"user:1").unwrap().unwrap().1, "alice");
//! assert!(cache.get(&"user:3").unwrap().is_none());
//!
//! // Policy lives with the caller: evict everything never read.
//! let cold: Vec<_> = cache
//!     .items_for_eviction()
//!     .unwrap()
//!     .into_iter()
//!     .filter(|candidate| candidate.hits() == 0)
//!     .map(|candidate| candidate.into_key())
//!     .collect();
//! assert_eq!(cache.evict(&cold).unwrap(), 1);
//! assert!(cache.get(&"user:2").unwrap().is_none());
//! ```

use std::borrow::Borrow;
use std::hash::Hash;
use std::marker::PhantomData;
use std::sync::Arc;

use tracing::{debug, trace};

use crate::directory::{DEFAULT_DIRECTORY_SHARDS, ItemDirectory};
use crate::error::{CacheError, InvariantError, Result};
use crate::expiration::{ExpirationPolicy, NeverExpire};
use crate::item::CacheItem;
use crate::metrics::{CacheCounters, CacheMetricsSnapshot};
use crate::size::{SizeEstimator, UnitSize};
use crate::stats::CacheStatisticsSnapshot;
use crate::store::traits::ValueStore;
use crate::traits::{Cache, Keyed};

/// Cache over one item directory and one value store.
pub struct FlatCache<K, V, S, E = UnitSize, X = NeverExpire> {
    directory: ItemDirectory<K>,
    store: S,
    estimator: Arc<E>,
    expiration: Arc<X>,
    counters: CacheCounters,
    _values: PhantomData<fn() -> V>,
}

impl<K, V, S> FlatCache<K, V, S, UnitSize, NeverExpire>
where
    K: Eq + Hash + Clone,
{
    /// Cache over `store` with unit sizes and no automatic expiration.
    pub fn new(store: S) -> Self {
        Self::with_parts(
            store,
            Arc::new(UnitSize),
            Arc::new(NeverExpire),
            DEFAULT_DIRECTORY_SHARDS,
        )
    }
}

impl<K, V, S, E, X> FlatCache<K, V, S, E, X>
where
    K: Eq + Hash + Clone,
{
    /// Assemble a cache from its collaborators.
    ///
    /// `estimator` and `expiration` are shared so segments of one segmented
    /// cache can use the same instances.
    pub fn with_parts(
        store: S,
        estimator: Arc<E>,
        expiration: Arc<X>,
        directory_shards: usize,
    ) -> Self {
        Self {
            directory: ItemDirectory::new(directory_shards),
            store,
            estimator,
            expiration,
            counters: CacheCounters::default(),
            _values: PhantomData,
        }
    }

    /// The value store backing this cache.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Number of items in the directory, evicted ones included.
    pub fn len(&self) -> usize {
        self.directory.len()
    }

    pub fn is_empty(&self) -> bool {
        self.directory.is_empty()
    }

    /// Whether the directory has an entry for `key`, regardless of whether
    /// its value is stored.
    pub fn contains_key(&self, key: &K) -> bool {
        self.directory.contains(key)
    }

    /// Statistics snapshot for `key`, including expired items not yet purged.
    pub fn statistics(&self, key: &K) -> Option<CacheStatisticsSnapshot<K>> {
        self.directory
            .get(key)
            .map(|item| item.statistics_snapshot())
    }

    /// Force the item for `key` into the expired state.
    ///
    /// Returns `true` if an item was found and was not yet expired. The item
    /// stays in the directory until the next `get` or
    /// [`FlatCache::purge_expired`].
    pub fn expire(&self, key: &K) -> bool {
        self.directory
            .get(key)
            .map(|item| item.expire())
            .unwrap_or(false)
    }
}

impl<K, V, S, E, X> FlatCache<K, V, S, E, X>
where
    K: Eq + Hash + Clone,
    V: Keyed<K>,
    S: ValueStore<K, V>,
    E: SizeEstimator<V>,
    X: ExpirationPolicy,
{
    /// Store `value` under its own key.
    ///
    /// The size is estimated fresh on every call. An existing item is
    /// updated in place (statistics kept); otherwise a new item is created.
    pub fn put(&self, value: V) -> Result<()> {
        self.put_arc(Arc::new(value))
    }

    /// [`FlatCache::put`] for a value that is already shared.
    pub fn put_arc(&self, value: Arc<V>) -> Result<()> {
        let size = self.estimator.estimate(&value);
        let key = value.key();

        if let Some(item) = self.directory.get(key) {
            item.update(value, size, &self.store, &*self.expiration)?;
            self.counters.record_put(false);
            return Ok(());
        }

        let key = key.clone();
        let (item, created) = self.directory.get_or_try_insert_with(&key, || {
            CacheItem::create(Arc::clone(&value), size, &self.store)
        })?;
        if !created {
            // Lost a race with another first put of this key.
            item.update(value, size, &self.store, &*self.expiration)?;
        } else {
            trace!("created cache item");
        }
        self.counters.record_put(created);
        Ok(())
    }

    /// Fetch the value for `key`.
    ///
    /// `Ok(None)` when the key is unknown, its value was evicted, or its item
    /// has expired (the expired item is purged on the way).
    pub fn get(&self, key: &K) -> Result<Option<Arc<V>>> {
        let Some(item) = self.directory.get(key) else {
            self.counters.record_get(false);
            return Ok(None);
        };

        if item.is_expired(&*self.expiration) {
            self.purge(key, &item)?;
            self.counters.record_get(false);
            return Ok(None);
        }

        match item.read(&self.store) {
            Ok(value) => {
                self.counters.record_get(value.is_some());
                Ok(value)
            },
            Err(CacheError::AlreadyExpired) => {
                // Expired between the check and the read.
                self.purge(key, &item)?;
                self.counters.record_get(false);
                Ok(None)
            },
            Err(err) => Err(err),
        }
    }

    /// Snapshots of every non-expired item whose value is stored.
    ///
    /// Expired items are skipped and left for lazy cleanup. The only failure
    /// is a store error passed through.
    pub fn items_for_eviction(&self) -> Result<Vec<CacheStatisticsSnapshot<K>>> {
        let mut candidates = Vec::new();
        for item in self.directory.items() {
            if item.is_expired(&*self.expiration) {
                continue;
            }
            match item.eviction_candidate(&self.store) {
                Ok(Some(snapshot)) => candidates.push(snapshot),
                Ok(None) | Err(CacheError::AlreadyExpired) => {},
                Err(err) => return Err(err),
            }
        }
        Ok(candidates)
    }

    /// Evict the values of `keys`, keeping their metadata.
    ///
    /// Returns the number of items evicted. Keys without an item, expired
    /// items and items whose value is already gone count zero, so duplicate
    /// keys are evicted once.
    pub fn evict<I>(&self, keys: I) -> Result<usize>
    where
        I: IntoIterator,
        I::Item: Borrow<K>,
    {
        let mut evicted = 0;
        for key in keys {
            let key = key.borrow();
            let Some(item) = self.directory.get(key) else {
                continue;
            };
            if item.is_expired(&*self.expiration) {
                continue;
            }
            match item.try_evict(&self.store) {
                Ok(true) => evicted += 1,
                Ok(false) | Err(CacheError::AlreadyExpired) => {},
                Err(err) => {
                    self.counters.record_evict(evicted);
                    return Err(err);
                },
            }
        }
        self.counters.record_evict(evicted);
        debug!(evicted, "evicted cache items");
        Ok(evicted)
    }

    /// Run `decision` over the current candidates and evict its selection.
    pub fn evict_with<D>(&self, decision: D) -> Result<usize>
    where
        D: crate::traits::EvictionDecision<K>,
    {
        Cache::evict_with(self, decision)
    }

    /// Remove every expired item from the directory and the store.
    ///
    /// Returns how many items were purged.
    pub fn purge_expired(&self) -> Result<usize> {
        let mut purged = 0;
        for (key, item) in self.directory.entries() {
            if item.is_expired(&*self.expiration) && self.purge(&key, &item)? {
                purged += 1;
            }
        }
        if purged > 0 {
            debug!(purged, "purged expired cache items");
        }
        Ok(purged)
    }

    /// Snapshot of this cache's operation counters.
    pub fn metrics(&self) -> CacheMetricsSnapshot {
        self.counters
            .snapshot(self.directory.len(), self.store.len())
    }

    /// Check bookkeeping invariants.
    ///
    /// Meant for quiescent caches (tests, debugging); concurrent puts can make
    /// the store briefly hold a value the directory does not list yet.
    pub fn check_invariants(&self) -> std::result::Result<(), InvariantError> {
        let entries = self.directory.entries();
        for (key, item) in &entries {
            if item.key() != key {
                return Err(InvariantError::new(
                    "directory entry is filed under a key different from its item",
                ));
            }
        }
        let stored = self.store.len();
        if stored > entries.len() {
            return Err(InvariantError::new(format!(
                "store holds {stored} values but the directory lists only {} items",
                entries.len()
            )));
        }
        Ok(())
    }

    /// Drop an expired item's residual value, then its directory entry.
    ///
    /// Value first: once the entry is gone a new item for the key may be
    /// created, and its value must not be removed by this purge.
    fn purge(&self, key: &K, item: &Arc<CacheItem<K>>) -> Result<bool> {
        item.discard_value(&self.store)?;
        let removed = self.directory.remove_if_same(key, item);
        if removed {
            self.counters.record_purge();
            trace!("purged expired cache item");
        }
        Ok(removed)
    }
}

impl<K, V, S, E, X> Cache<K, V> for FlatCache<K, V, S, E, X>
where
    K: Eq + Hash + Clone,
    V: Keyed<K>,
    S: ValueStore<K, V>,
    E: SizeEstimator<V>,
    X: ExpirationPolicy,
{
    fn put(&self, value: V) -> Result<()> {
        FlatCache::put(self, value)
    }

    fn get(&self, key: &K) -> Result<Option<Arc<V>>> {
        FlatCache::get(self, key)
    }

    fn items_for_eviction(&self) -> Result<Vec<CacheStatisticsSnapshot<K>>> {
        FlatCache::items_for_eviction(self)
    }

    fn evict<I>(&self, keys: I) -> Result<usize>
    where
        I: IntoIterator,
        I::Item: Borrow<K>,
    {
        FlatCache::evict(self, keys)
    }
}

impl<K, V, S, E, X> std::fmt::Debug for FlatCache<K, V, S, E, X>
where
    K: Eq + Hash + Clone,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlatCache")
            .field("items", &self.directory.len())
            .field("directory_shards", &self.directory.shard_count())
            .finish_non_exhaustive()
    }
}
