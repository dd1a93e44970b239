//! Item directory: the per-segment table from keys to cache items.
//!
//! ## Architecture
//!
//! ```text
//!   key ──► ShardSelector ──► shard i
//!
//!   ┌───────────────────────┬───────────────────────┬─────┐
//!   │ RwLock<FxHashMap>     │ RwLock<FxHashMap>     │ ... │
//!   │  K → Arc<CacheItem>   │  K → Arc<CacheItem>   │     │
//!   └───────────────────────┴───────────────────────┴─────┘
//! ```
//!
//! The directory owns item lifetime. Callers get a cloned `Arc` for the
//! duration of one operation and never keep it; an item leaves the directory
//! only through [`ItemDirectory::remove_if_same`], which compares by pointer
//! so a stale handle can never remove a newer item for the same key.
//!
//! Shard locks are held only for map operations, except while a new item is
//! created: creation stores the value under the shard write lock so two
//! concurrent first puts of one key cannot both create an item.

use std::hash::Hash;
use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::ds::ShardSelector;
use crate::error::Result;
use crate::item::CacheItem;

/// Default number of lock shards per directory.
pub const DEFAULT_DIRECTORY_SHARDS: usize = 16;

type Shard<K> = RwLock<FxHashMap<K, Arc<CacheItem<K>>>>;

/// Concurrent map from keys to their cache items.
#[derive(Debug)]
pub struct ItemDirectory<K> {
    shards: Vec<Shard<K>>,
    selector: ShardSelector,
}

impl<K> ItemDirectory<K>
where
    K: Eq + Hash + Clone,
{
    /// Create a directory with `shards` lock shards (clamped to at least 1).
    pub fn new(shards: usize) -> Self {
        let selector = ShardSelector::new(shards, 0x5eed);
        let shards = (0..selector.shard_count())
            .map(|_| RwLock::new(FxHashMap::default()))
            .collect();
        Self { shards, selector }
    }

    fn shard(&self, key: &K) -> &Shard<K> {
        &self.shards[self.selector.shard_for_key(key)]
    }

    /// Number of lock shards.
    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    /// Look up the item for `key`.
    pub fn get(&self, key: &K) -> Option<Arc<CacheItem<K>>> {
        self.shard(key).read().get(key).cloned()
    }

    pub fn contains(&self, key: &K) -> bool {
        self.shard(key).read().contains_key(key)
    }

    /// Return the item for `key`, creating it with `create` if absent.
    ///
    /// The boolean is `true` when this call created the item. If `create`
    /// fails nothing is inserted and the error is returned.
    pub fn get_or_try_insert_with<F>(&self, key: &K, create: F) -> Result<(Arc<CacheItem<K>>, bool)>
    where
        F: FnOnce() -> Result<CacheItem<K>>,
    {
        let mut shard = self.shard(key).write();
        if let Some(existing) = shard.get(key) {
            return Ok((Arc::clone(existing), false));
        }
        let item = Arc::new(create()?);
        shard.insert(key.clone(), Arc::clone(&item));
        Ok((item, true))
    }

    /// Remove `key` if it still maps to exactly `item`.
    pub fn remove_if_same(&self, key: &K, item: &Arc<CacheItem<K>>) -> bool {
        let mut shard = self.shard(key).write();
        match shard.get(key) {
            Some(current) if Arc::ptr_eq(current, item) => {
                shard.remove(key);
                true
            },
            _ => false,
        }
    }

    /// Handles to every item, collected shard by shard.
    ///
    /// Not a consistent cut across shards: items inserted or removed
    /// concurrently may or may not appear.
    pub fn items(&self) -> Vec<Arc<CacheItem<K>>> {
        let mut items = Vec::with_capacity(self.len());
        for shard in &self.shards {
            items.extend(shard.read().values().cloned());
        }
        items
    }

    /// Every `(key, item)` pair; used by invariant checks.
    pub(crate) fn entries(&self) -> Vec<(K, Arc<CacheItem<K>>)> {
        let mut entries = Vec::new();
        for shard in &self.shards {
            entries.extend(
                shard
                    .read()
                    .iter()
                    .map(|(key, item)| (key.clone(), Arc::clone(item))),
            );
        }
        entries
    }

    /// Number of items across all shards.
    pub fn len(&self) -> usize {
        self.shards.iter().map(|shard| shard.read().len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.shards.iter().all(|shard| shard.read().is_empty())
    }
}

impl<K> Default for ItemDirectory<K>
where
    K: Eq + Hash + Clone,
{
    fn default() -> Self {
        Self::new(DEFAULT_DIRECTORY_SHARDS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CacheError;
    use crate::store::memory::MemoryStore;

    type Value = (u64, u64);

    fn create(store: &MemoryStore<u64, Value>, key: u64) -> Result<CacheItem<u64>> {
        CacheItem::create(Arc::new((key, key)), 1, store)
    }

    #[test]
    fn insert_then_lookup() {
        let store = MemoryStore::new();
        let directory = ItemDirectory::new(4);
        assert!(directory.get(&1).is_none());

        let (item, created) = directory
            .get_or_try_insert_with(&1, || create(&store, 1))
            .unwrap();
        assert!(created);
        assert_eq!(*item.key(), 1);
        assert!(directory.contains(&1));
        assert_eq!(directory.len(), 1);

        let (again, created) = directory
            .get_or_try_insert_with(&1, || panic!("must not create twice"))
            .unwrap();
        assert!(!created);
        assert!(Arc::ptr_eq(&item, &again));
    }

    #[test]
    fn failed_creation_inserts_nothing() {
        let directory: ItemDirectory<u64> = ItemDirectory::default();
        let err = directory
            .get_or_try_insert_with(&1, || Err(CacheError::invalid_argument("nope")))
            .unwrap_err();
        assert!(matches!(err, CacheError::InvalidArgument(_)));
        assert!(directory.is_empty());
    }

    #[test]
    fn remove_if_same_ignores_stale_handles() {
        let store = MemoryStore::new();
        let directory = ItemDirectory::new(2);
        let (first, _) = directory
            .get_or_try_insert_with(&7, || create(&store, 7))
            .unwrap();
        assert!(directory.remove_if_same(&7, &first));

        let (second, _) = directory
            .get_or_try_insert_with(&7, || create(&store, 7))
            .unwrap();
        assert!(!directory.remove_if_same(&7, &first));
        assert!(Arc::ptr_eq(&directory.get(&7).unwrap(), &second));
    }

    #[test]
    fn items_spans_all_shards() {
        let store = MemoryStore::new();
        let directory = ItemDirectory::new(8);
        for key in 0..100 {
            directory
                .get_or_try_insert_with(&key, || create(&store, key))
                .unwrap();
        }
        assert_eq!(directory.shard_count(), 8);
        assert_eq!(directory.items().len(), 100);
        assert_eq!(directory.entries().len(), 100);
        assert_eq!(directory.len(), 100);
    }
}
