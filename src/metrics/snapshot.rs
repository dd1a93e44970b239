use std::ops::Add;

/// Point-in-time copy of a cache's operation counters.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheMetricsSnapshot {
    pub put_calls: u64,
    pub items_created: u64,
    pub items_updated: u64,

    pub get_calls: u64,
    pub get_hits: u64,
    pub get_misses: u64, // directory misses, evicted values and purged items

    pub evict_calls: u64,
    pub evicted_items: u64,
    pub purged_items: u64,

    // gauges captured at snapshot time
    pub items: usize,
    pub stored_values: usize,
}

impl CacheMetricsSnapshot {
    /// Hit ratio of `get` calls; `0.0` before the first call.
    pub fn hit_ratio(&self) -> f64 {
        match self.get_calls {
            0 => 0.0,
            calls => self.get_hits as f64 / calls as f64,
        }
    }
}

impl Add for CacheMetricsSnapshot {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self {
            put_calls: self.put_calls + other.put_calls,
            items_created: self.items_created + other.items_created,
            items_updated: self.items_updated + other.items_updated,
            get_calls: self.get_calls + other.get_calls,
            get_hits: self.get_hits + other.get_hits,
            get_misses: self.get_misses + other.get_misses,
            evict_calls: self.evict_calls + other.evict_calls,
            evicted_items: self.evicted_items + other.evicted_items,
            purged_items: self.purged_items + other.purged_items,
            items: self.items + other.items,
            stored_values: self.stored_values + other.stored_values,
        }
    }
}

impl std::iter::Sum for CacheMetricsSnapshot {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshots_sum_fieldwise() {
        let a = CacheMetricsSnapshot {
            get_calls: 4,
            get_hits: 3,
            items: 2,
            ..Default::default()
        };
        let b = CacheMetricsSnapshot {
            get_calls: 4,
            get_hits: 1,
            items: 5,
            ..Default::default()
        };
        let total: CacheMetricsSnapshot = [a, b].into_iter().sum();
        assert_eq!(total.get_calls, 8);
        assert_eq!(total.get_hits, 4);
        assert_eq!(total.items, 7);
        assert_eq!(total.hit_ratio(), 0.5);
    }

    #[test]
    fn hit_ratio_without_calls_is_zero() {
        assert_eq!(CacheMetricsSnapshot::default().hit_ratio(), 0.0);
    }
}
