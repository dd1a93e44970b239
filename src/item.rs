//! Per-key cache item state machine.
//!
//! A [`CacheItem`] holds the metadata for one key: its identity, statistics,
//! and lifecycle state. The value itself lives in the value store; every
//! operation that needs it takes the store as an argument.
//!
//! ## State Machine
//!
//! ```text
//!              create
//!                │
//!                ▼
//!           ┌─────────┐   evict    ┌─────────┐
//!           │  Live   │ ─────────► │ Evicted │
//!           │         │ ◄───────── │         │
//!           └────┬────┘   update   └────┬────┘
//!                │                      │
//!                │  expire / policy     │
//!                ▼                      ▼
//!           ┌──────────────────────────────┐
//!           │           Expired            │  terminal: every operation
//!           └──────────────────────────────┘  except snapshot fails
//! ```
//!
//! ## Locking
//!
//! Each item owns a `parking_lot::Mutex`. Every operation, including the
//! store calls it makes, runs under that lock, so operations on one key are
//! totally ordered while unrelated keys never contend.
//!
//! Evictability is recomputed from the store on every check rather than
//! trusted from [`ItemState`]; the state records the last transition, the
//! store is the source of truth for whether a value is present.
//!
//! `update` removes the previous value before storing the new one, so it does
//! not depend on the store's overwrite semantics. Between the two store calls a
//! reader going straight to the store may observe no value for the key.

use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;
use tracing::warn;

use crate::error::{CacheError, Result};
use crate::expiration::ExpirationPolicy;
use crate::size::checked_size;
use crate::stats::{CacheStatisticsSnapshot, ItemStatistics};
use crate::store::traits::ValueStore;
use crate::traits::Keyed;

/// Lifecycle state of a cache item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemState {
    /// The last transition stored a value.
    Live,
    /// The value was evicted; metadata and statistics are retained.
    Evicted,
    /// Terminal. The item must be purged from its directory.
    Expired,
}

#[derive(Debug)]
struct ItemInner {
    state: ItemState,
    statistics: ItemStatistics,
}

impl ItemInner {
    /// Move to `Expired` if `policy` says so; never leaves `Expired`.
    fn latch_expiry<P>(&mut self, policy: &P) -> bool
    where
        P: ExpirationPolicy + ?Sized,
    {
        if self.state != ItemState::Expired
            && policy.is_expired(&self.statistics, Instant::now())
        {
            self.state = ItemState::Expired;
        }
        self.state == ItemState::Expired
    }

    fn ensure_not_expired(&self) -> Result<()> {
        match self.state {
            ItemState::Expired => Err(CacheError::AlreadyExpired),
            _ => Ok(()),
        }
    }
}

/// Metadata record for one cached key.
#[derive(Debug)]
pub struct CacheItem<K> {
    key: K,
    inner: Mutex<ItemInner>,
}

impl<K> CacheItem<K>
where
    K: Eq + Clone,
{
    /// Create an item for `value`, storing it under its key.
    ///
    /// Fails with `InvalidArgument` on a negative `size`; nothing is stored in
    /// that case.
    pub fn create<V, S>(value: Arc<V>, size: i64, store: &S) -> Result<Self>
    where
        V: Keyed<K>,
        S: ValueStore<K, V> + ?Sized,
    {
        let size = checked_size(size)?;
        let key = value.key().clone();
        let now = Instant::now();
        store.put(value)?;

        let mut statistics = ItemStatistics::new(now);
        statistics.record_size(size, now);
        Ok(Self {
            key,
            inner: Mutex::new(ItemInner {
                state: ItemState::Live,
                statistics,
            }),
        })
    }

    pub fn key(&self) -> &K {
        &self.key
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ItemState {
        self.inner.lock().state
    }

    /// Replace the stored value with `value` of `size`.
    ///
    /// `KeyMismatch` if `value` belongs to another key. Then, under the item
    /// lock and before any store call, `AlreadyExpired` if the item is expired
    /// or `policy` says it is (the flag latches), and `InvalidArgument` on a
    /// negative size. If storing the new value fails, the previous value is
    /// put back before the store error is returned.
    pub fn update<V, S, P>(&self, value: Arc<V>, size: i64, store: &S, policy: &P) -> Result<()>
    where
        V: Keyed<K>,
        S: ValueStore<K, V> + ?Sized,
        P: ExpirationPolicy + ?Sized,
    {
        if value.key() != &self.key {
            return Err(CacheError::KeyMismatch);
        }

        let mut inner = self.inner.lock();
        inner.latch_expiry(policy);
        inner.ensure_not_expired()?;
        let size = checked_size(size)?;

        let previous = store.remove(&self.key)?;
        if let Err(err) = store.put(value) {
            if let Some(previous) = previous {
                if let Err(restore) = store.put(previous) {
                    warn!(error = %restore, "failed to restore previous value after failed update");
                    inner.state = ItemState::Evicted;
                }
            }
            return Err(err.into());
        }

        inner.statistics.record_size(size, Instant::now());
        inner.state = ItemState::Live;
        Ok(())
    }

    /// Remove the value from the store and count one eviction.
    ///
    /// Callers must know the item is evictable; evicting an item without a
    /// stored value is a contract violation. Use [`CacheItem::try_evict`] to
    /// check and evict atomically.
    pub fn evict<V, S>(&self, store: &S) -> Result<()>
    where
        V: Keyed<K>,
        S: ValueStore<K, V> + ?Sized,
    {
        let mut inner = self.inner.lock();
        inner.ensure_not_expired()?;
        debug_assert!(
            store.contains(&self.key)?,
            "evict called on an item without a stored value"
        );
        store.remove(&self.key)?;
        inner.statistics.record_eviction();
        inner.state = ItemState::Evicted;
        Ok(())
    }

    /// Evict if the store still holds a value; returns whether it did.
    ///
    /// Evictability is re-checked under the item lock, so stale candidate
    /// lists never cause a double eviction.
    pub fn try_evict<V, S>(&self, store: &S) -> Result<bool>
    where
        V: Keyed<K>,
        S: ValueStore<K, V> + ?Sized,
    {
        let mut inner = self.inner.lock();
        inner.ensure_not_expired()?;
        if store.remove(&self.key)?.is_none() {
            return Ok(false);
        }
        inner.statistics.record_eviction();
        inner.state = ItemState::Evicted;
        Ok(true)
    }

    /// Fetch the stored value and record a hit or a miss.
    pub fn read<V, S>(&self, store: &S) -> Result<Option<Arc<V>>>
    where
        V: Keyed<K>,
        S: ValueStore<K, V> + ?Sized,
    {
        let mut inner = self.inner.lock();
        inner.ensure_not_expired()?;
        let value = store.get(&self.key)?;
        inner
            .statistics
            .record_access(value.is_some(), Instant::now());
        Ok(value)
    }

    /// True iff the store currently holds a value for this key.
    pub fn is_evictable<V, S>(&self, store: &S) -> Result<bool>
    where
        V: Keyed<K>,
        S: ValueStore<K, V> + ?Sized,
    {
        let inner = self.inner.lock();
        inner.ensure_not_expired()?;
        Ok(store.contains(&self.key)?)
    }

    /// Snapshot the statistics if the item is an eviction candidate.
    ///
    /// Returns `Ok(None)` for items without a stored value and
    /// `AlreadyExpired` for expired ones; the check and the snapshot happen
    /// under one lock acquisition.
    pub fn eviction_candidate<V, S>(&self, store: &S) -> Result<Option<CacheStatisticsSnapshot<K>>>
    where
        V: Keyed<K>,
        S: ValueStore<K, V> + ?Sized,
    {
        let inner = self.inner.lock();
        inner.ensure_not_expired()?;
        if !store.contains(&self.key)? {
            return Ok(None);
        }
        Ok(Some(CacheStatisticsSnapshot::new(
            self.key.clone(),
            inner.statistics,
        )))
    }

    /// Whether the item is expired, consulting `policy` while it is not.
    ///
    /// Once this returns `true` it returns `true` forever.
    pub fn is_expired<P>(&self, policy: &P) -> bool
    where
        P: ExpirationPolicy + ?Sized,
    {
        self.inner.lock().latch_expiry(policy)
    }

    /// Force the item into the terminal expired state.
    ///
    /// Returns `false` if it was already expired.
    pub fn expire(&self) -> bool {
        let mut inner = self.inner.lock();
        if inner.state == ItemState::Expired {
            return false;
        }
        inner.state = ItemState::Expired;
        true
    }

    /// Remove any residual value of an expired item from the store.
    ///
    /// Done under the item lock so the removal cannot race with the item's
    /// own operations. Fails with `InvalidArgument` on a non-expired item.
    pub(crate) fn discard_value<V, S>(&self, store: &S) -> Result<()>
    where
        V: Keyed<K>,
        S: ValueStore<K, V> + ?Sized,
    {
        let inner = self.inner.lock();
        if inner.state != ItemState::Expired {
            return Err(CacheError::invalid_argument(
                "only expired items can be discarded",
            ));
        }
        store.remove(&self.key)?;
        Ok(())
    }

    /// Immutable copy of the statistics; allowed after expiration.
    pub fn statistics_snapshot(&self) -> CacheStatisticsSnapshot<K> {
        let inner = self.inner.lock();
        CacheStatisticsSnapshot::new(self.key.clone(), inner.statistics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expiration::{NeverExpire, TimeToLive};
    use crate::store::memory::MemoryStore;
    use crate::store::traits::StoreError;

    type Value = (u32, &'static str);

    fn store() -> MemoryStore<u32, Value> {
        MemoryStore::new()
    }

    fn item(store: &MemoryStore<u32, Value>, key: u32, body: &'static str) -> CacheItem<u32> {
        CacheItem::create(Arc::new((key, body)), body.len() as i64, store).unwrap()
    }

    #[test]
    fn create_stores_value_and_records_size() {
        let store = store();
        let item = item(&store, 1, "abc");

        assert_eq!(*item.key(), 1);
        assert_eq!(item.state(), ItemState::Live);
        assert_eq!(store.get(&1).unwrap().unwrap().1, "abc");

        let snapshot = item.statistics_snapshot();
        assert_eq!(snapshot.size(), 3);
        assert_eq!(snapshot.hits(), 0);
        assert_eq!(snapshot.statistics().updates(), 1);
    }

    #[test]
    fn create_rejects_negative_size_without_storing() {
        let store = store();
        let err = CacheItem::create(Arc::new((1, "x")), -5, &store).unwrap_err();
        assert!(matches!(err, CacheError::InvalidArgument(_)));
        assert!(store.is_empty());
    }

    #[test]
    fn update_replaces_value() {
        let store = store();
        let item = item(&store, 1, "old");
        item.update(Arc::new((1, "newer")), 5, &store, &NeverExpire).unwrap();

        assert_eq!(store.get(&1).unwrap().unwrap().1, "newer");
        assert_eq!(store.len(), 1);
        let snapshot = item.statistics_snapshot();
        assert_eq!(snapshot.size(), 5);
        assert_eq!(snapshot.statistics().updates(), 2);
    }

    #[test]
    fn update_with_other_key_fails_and_keeps_value() {
        let store = store();
        let item = item(&store, 1, "old");

        let err = item.update(Arc::new((2, "other")), 5, &store, &NeverExpire).unwrap_err();
        assert_eq!(err, CacheError::KeyMismatch);
        assert_eq!(store.get(&1).unwrap().unwrap().1, "old");
        assert_eq!(store.contains(&2), Ok(false));
        assert_eq!(item.statistics_snapshot().size(), 3);
    }

    #[test]
    fn update_rejects_negative_size() {
        let store = store();
        let item = item(&store, 1, "old");
        let err = item.update(Arc::new((1, "new")), -1, &store, &NeverExpire).unwrap_err();
        assert!(matches!(err, CacheError::InvalidArgument(_)));
        assert_eq!(store.get(&1).unwrap().unwrap().1, "old");
    }

    #[test]
    fn evict_then_update_resurrects_with_statistics() {
        let store = store();
        let item = item(&store, 1, "v1");
        item.read(&store).unwrap();

        item.evict(&store).unwrap();
        assert_eq!(item.state(), ItemState::Evicted);
        assert_eq!(item.is_evictable(&store), Ok(false));
        assert_eq!(item.read(&store), Ok(None));

        item.update(Arc::new((1, "v2")), 2, &store, &NeverExpire).unwrap();
        assert_eq!(item.state(), ItemState::Live);
        assert_eq!(item.is_evictable(&store), Ok(true));

        let snapshot = item.statistics_snapshot();
        assert_eq!(snapshot.hits(), 1);
        assert_eq!(snapshot.misses(), 1);
        assert_eq!(snapshot.evictions(), 1);
    }

    #[test]
    fn try_evict_only_counts_real_evictions() {
        let store = store();
        let item = item(&store, 1, "v1");
        assert_eq!(item.try_evict(&store), Ok(true));
        assert_eq!(item.try_evict(&store), Ok(false));
        assert_eq!(item.statistics_snapshot().evictions(), 1);
    }

    #[test]
    fn read_records_hits_and_misses() {
        let store = store();
        let item = item(&store, 1, "v1");
        assert_eq!(item.read(&store).unwrap().unwrap().1, "v1");
        store.remove(&1).unwrap();
        assert_eq!(item.read(&store), Ok(None));

        let snapshot = item.statistics_snapshot();
        assert_eq!(snapshot.hits(), 1);
        assert_eq!(snapshot.misses(), 1);
        assert!(snapshot.last_access().is_some());
    }

    #[test]
    fn expired_item_rejects_every_operation() {
        let store = store();
        let item = item(&store, 1, "v1");
        assert!(item.expire());
        assert!(!item.expire());

        assert!(item.is_expired(&NeverExpire));
        assert_eq!(item.state(), ItemState::Expired);
        assert_eq!(
            item.update(Arc::new((1, "v2")), 2, &store, &NeverExpire),
            Err(CacheError::AlreadyExpired)
        );
        assert_eq!(item.evict(&store), Err(CacheError::AlreadyExpired));
        assert_eq!(item.try_evict(&store), Err(CacheError::AlreadyExpired));
        assert_eq!(item.read(&store), Err(CacheError::AlreadyExpired));
        assert_eq!(item.is_evictable(&store), Err(CacheError::AlreadyExpired));
        assert_eq!(
            item.eviction_candidate(&store),
            Err(CacheError::AlreadyExpired)
        );

        // The snapshot stays available after expiry.
        assert_eq!(item.statistics_snapshot().size(), 2);
    }

    #[test]
    fn policy_expiry_latches() {
        let store = store();
        let item = item(&store, 1, "v1");
        assert!(!item.is_expired(&NeverExpire));
        assert!(item.is_expired(&TimeToLive(std::time::Duration::ZERO)));
        // Policy no longer matters once expired.
        assert!(item.is_expired(&NeverExpire));
    }

    #[test]
    fn update_consults_policy_before_storing() {
        let store = store();
        let item = item(&store, 1, "v1");
        let lapsed = TimeToLive(std::time::Duration::ZERO);

        assert_eq!(
            item.update(Arc::new((1, "v2")), 2, &store, &lapsed),
            Err(CacheError::AlreadyExpired)
        );
        assert_eq!(item.state(), ItemState::Expired);
        assert_eq!(store.get(&1).unwrap().unwrap().1, "v1");
        assert_eq!(item.statistics_snapshot().statistics().updates(), 1);
        // Latched: a lenient policy cannot revive it.
        assert_eq!(
            item.update(Arc::new((1, "v3")), 2, &store, &NeverExpire),
            Err(CacheError::AlreadyExpired)
        );
    }

    #[test]
    fn expiry_is_reported_before_size_errors() {
        let store = store();
        let item = item(&store, 1, "v1");
        item.expire();
        assert_eq!(
            item.update(Arc::new((1, "v2")), -1, &store, &NeverExpire),
            Err(CacheError::AlreadyExpired)
        );
    }

    #[test]
    fn discard_value_requires_expired_item() {
        let store = store();
        let item = item(&store, 1, "v1");
        assert!(matches!(
            item.discard_value(&store),
            Err(CacheError::InvalidArgument(_))
        ));
        item.expire();
        item.discard_value(&store).unwrap();
        assert_eq!(store.contains(&1), Ok(false));
    }

    /// Memory store that refuses to store values whose body is "poison".
    struct PoisonStore(MemoryStore<u32, Value>);

    impl ValueStore<u32, Value> for PoisonStore {
        fn put(&self, value: Arc<Value>) -> std::result::Result<(), StoreError> {
            if value.1 == "poison" {
                return Err(StoreError::Backend("poisoned value".into()));
            }
            self.0.put(value)
        }

        fn get(&self, key: &u32) -> std::result::Result<Option<Arc<Value>>, StoreError> {
            self.0.get(key)
        }

        fn remove(&self, key: &u32) -> std::result::Result<Option<Arc<Value>>, StoreError> {
            self.0.remove(key)
        }

        fn contains(&self, key: &u32) -> std::result::Result<bool, StoreError> {
            self.0.contains(key)
        }

        fn len(&self) -> usize {
            self.0.len()
        }
    }

    #[test]
    fn failed_update_restores_previous_value() {
        let store = PoisonStore(MemoryStore::new());
        let item = CacheItem::create(Arc::new((1, "v1")), 2, &store).unwrap();

        let err = item.update(Arc::new((1, "poison")), 6, &store, &NeverExpire).unwrap_err();
        assert_eq!(
            err,
            CacheError::Store(StoreError::Backend("poisoned value".into()))
        );
        assert_eq!(store.get(&1).unwrap().unwrap().1, "v1");
        assert_eq!(item.state(), ItemState::Live);
        assert_eq!(item.statistics_snapshot().size(), 2);
    }

    #[test]
    fn store_failure_on_create_passes_through() {
        let full: MemoryStore<u32, Value> = MemoryStore::with_capacity_limit(0);
        let err = CacheItem::create(Arc::new((3, "y")), 1, &full).unwrap_err();
        assert_eq!(err, CacheError::Store(StoreError::Full));
    }
}
