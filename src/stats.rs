//! Per-item access statistics.
//!
//! [`ItemStatistics`] is the live counter block owned by a
//! [`CacheItem`](crate::item::CacheItem); it is only mutated through the
//! item's operations, under the item's lock. [`CacheStatisticsSnapshot`] is an
//! immutable copy paired with the item's key, handed to eviction-policy code
//! without holding any lock.
//!
//! ## Example Usage
//!
//! ```
//! use statcache::{Cache, CacheBuilder};
//!
//! let cache = CacheBuilder::new().build_flat::<u32, (u32, &str)>();
//! cache.put((1, "one")).unwrap();
//! cache.get(&1).unwrap();
//! cache.get(&1).unwrap();
//!
//! let candidates = cache.items_for_eviction().unwrap();
//! assert_eq!(candidates.len(), 1);
//! assert_eq!(*candidates[0].key(), 1);
//! assert_eq!(candidates[0].hits(), 2);
//! ```

use std::time::{Duration, Instant};

/// Counters for one cache item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemStatistics {
    size: u64,
    hits: u64,
    misses: u64,
    updates: u64,
    evictions: u64,
    created_at: Instant,
    last_update: Instant,
    last_access: Option<Instant>,
}

impl ItemStatistics {
    pub(crate) fn new(now: Instant) -> Self {
        Self {
            size: 0,
            hits: 0,
            misses: 0,
            updates: 0,
            evictions: 0,
            created_at: now,
            last_update: now,
            last_access: None,
        }
    }

    /// Record a freshly stored value of `size`.
    pub(crate) fn record_size(&mut self, size: u64, now: Instant) {
        self.size = size;
        self.updates += 1;
        self.last_update = now;
    }

    /// Record a read; `hit` tells whether the store held a value.
    pub(crate) fn record_access(&mut self, hit: bool, now: Instant) {
        if hit {
            self.hits += 1;
        } else {
            self.misses += 1;
        }
        self.last_access = Some(now);
    }

    pub(crate) fn record_eviction(&mut self) {
        self.evictions += 1;
    }

    /// Estimated size of the most recently stored value.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Reads that found the value in the store.
    pub fn hits(&self) -> u64 {
        self.hits
    }

    /// Reads that found the item but not its value (evicted).
    pub fn misses(&self) -> u64 {
        self.misses
    }

    /// Total reads through this item.
    pub fn accesses(&self) -> u64 {
        self.hits + self.misses
    }

    /// Hit ratio in `[0.0, 1.0]`; `0.0` before the first read.
    pub fn hit_ratio(&self) -> f64 {
        match self.accesses() {
            0 => 0.0,
            total => self.hits as f64 / total as f64,
        }
    }

    /// Number of times a value was stored (the initial put included).
    pub fn updates(&self) -> u64 {
        self.updates
    }

    /// Number of times the value was evicted.
    pub fn evictions(&self) -> u64 {
        self.evictions
    }

    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    pub fn last_update(&self) -> Instant {
        self.last_update
    }

    pub fn last_access(&self) -> Option<Instant> {
        self.last_access
    }

    /// Most recent of the last read and the last update.
    pub fn last_touched(&self) -> Instant {
        match self.last_access {
            Some(access) if access > self.last_update => access,
            _ => self.last_update,
        }
    }

    /// Time since the last read or update, measured at `now`.
    pub fn idle_for(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.last_touched())
    }

    /// Time since the last update, measured at `now`.
    pub fn age(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.last_update)
    }
}

/// Immutable copy of one item's statistics at a point in time.
///
/// May be stale by the time it is acted on; eviction re-checks every key
/// under its item lock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStatisticsSnapshot<K> {
    key: K,
    statistics: ItemStatistics,
}

impl<K> CacheStatisticsSnapshot<K> {
    pub(crate) fn new(key: K, statistics: ItemStatistics) -> Self {
        Self { key, statistics }
    }

    pub fn key(&self) -> &K {
        &self.key
    }

    pub fn into_key(self) -> K {
        self.key
    }

    /// The copied counters.
    pub fn statistics(&self) -> &ItemStatistics {
        &self.statistics
    }

    pub fn size(&self) -> u64 {
        self.statistics.size()
    }

    pub fn hits(&self) -> u64 {
        self.statistics.hits()
    }

    pub fn misses(&self) -> u64 {
        self.statistics.misses()
    }

    pub fn evictions(&self) -> u64 {
        self.statistics.evictions()
    }

    pub fn last_access(&self) -> Option<Instant> {
        self.statistics.last_access()
    }

    pub fn last_update(&self) -> Instant {
        self.statistics.last_update()
    }
}
