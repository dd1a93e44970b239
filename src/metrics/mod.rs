//! Cache-level operation counters.
//!
//! Every flat cache keeps a [`CacheCounters`] block of relaxed atomics and
//! exposes it as a [`CacheMetricsSnapshot`]. A segmented cache sums the
//! snapshots of its segments. Counters are observational only; no cache
//! decision reads them.

pub mod snapshot;

use std::sync::atomic::{AtomicU64, Ordering};

pub use snapshot::CacheMetricsSnapshot;

#[derive(Debug, Default)]
pub(crate) struct CacheCounters {
    put_calls: AtomicU64,
    items_created: AtomicU64,
    items_updated: AtomicU64,
    get_calls: AtomicU64,
    get_hits: AtomicU64,
    get_misses: AtomicU64,
    evict_calls: AtomicU64,
    evicted_items: AtomicU64,
    purged_items: AtomicU64,
}

impl CacheCounters {
    #[inline]
    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_put(&self, created: bool) {
        Self::bump(&self.put_calls);
        if created {
            Self::bump(&self.items_created);
        } else {
            Self::bump(&self.items_updated);
        }
    }

    pub(crate) fn record_get(&self, hit: bool) {
        Self::bump(&self.get_calls);
        if hit {
            Self::bump(&self.get_hits);
        } else {
            Self::bump(&self.get_misses);
        }
    }

    pub(crate) fn record_evict(&self, evicted: usize) {
        Self::bump(&self.evict_calls);
        self.evicted_items
            .fetch_add(evicted as u64, Ordering::Relaxed);
    }

    pub(crate) fn record_purge(&self) {
        Self::bump(&self.purged_items);
    }

    pub(crate) fn snapshot(&self, items: usize, stored_values: usize) -> CacheMetricsSnapshot {
        CacheMetricsSnapshot {
            put_calls: self.put_calls.load(Ordering::Relaxed),
            items_created: self.items_created.load(Ordering::Relaxed),
            items_updated: self.items_updated.load(Ordering::Relaxed),
            get_calls: self.get_calls.load(Ordering::Relaxed),
            get_hits: self.get_hits.load(Ordering::Relaxed),
            get_misses: self.get_misses.load(Ordering::Relaxed),
            evict_calls: self.evict_calls.load(Ordering::Relaxed),
            evicted_items: self.evicted_items.load(Ordering::Relaxed),
            purged_items: self.purged_items.load(Ordering::Relaxed),
            items,
            stored_values,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_snapshot() {
        let counters = CacheCounters::default();
        counters.record_put(true);
        counters.record_put(false);
        counters.record_get(true);
        counters.record_get(false);
        counters.record_get(false);
        counters.record_evict(3);
        counters.record_evict(0);
        counters.record_purge();

        let snapshot = counters.snapshot(5, 4);
        assert_eq!(snapshot.put_calls, 2);
        assert_eq!(snapshot.items_created, 1);
        assert_eq!(snapshot.items_updated, 1);
        assert_eq!(snapshot.get_calls, 3);
        assert_eq!(snapshot.get_hits, 1);
        assert_eq!(snapshot.get_misses, 2);
        assert_eq!(snapshot.evict_calls, 2);
        assert_eq!(snapshot.evicted_items, 3);
        assert_eq!(snapshot.purged_items, 1);
        assert_eq!(snapshot.items, 5);
        assert_eq!(snapshot.stored_values, 4);
    }
}
