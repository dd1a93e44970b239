//! Deterministic key-to-shard mapping.
//!
//! [`ShardSelector`] is the default segmentation function of a
//! [`SegmentedCache`](crate::segmented::SegmentedCache) and also spreads keys
//! over the lock shards of the item directory and the sharded memory store.
//!
//! ```text
//!   key ──► DefaultHasher(seed, key) ──► hash % shards ──► index in [0, shards)
//!
//!   ┌─────────┬─────────┬─────────┬─────────┐
//!   │ Shard 0 │ Shard 1 │ Shard 2 │ Shard 3 │
//!   │  A, E   │  B, F   │  C, G   │  D, H   │
//!   └─────────┴─────────┴─────────┴─────────┘
//! ```
//!
//! Same `(key, seed, shards)` always yields the same index, within and across
//! processes (`DefaultHasher::new` uses fixed keys).
//!
//! ## Example Usage
//!
//! ```
//! use statcache::ds::ShardSelector;
//! use statcache::traits::Segmenter;
//!
//! let selector = ShardSelector::new(4, 0);
//! let shard = selector.shard_for_key(&"user:123");
//! assert!(shard < 4);
//! assert_eq!(Segmenter::<&str>::segment(&selector, &"user:123"), shard);
//! ```

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::traits::Segmenter;

/// Deterministic shard selector using a seeded hash.
///
/// Maps any `Hash`able key to a shard index in `[0, shards)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShardSelector {
    shards: usize,
    seed: u64,
}

impl ShardSelector {
    /// Creates a selector for `shards` shards with the given `seed`.
    ///
    /// The shard count is clamped to at least 1.
    pub fn new(shards: usize, seed: u64) -> Self {
        Self {
            shards: shards.max(1),
            seed,
        }
    }

    /// Returns the number of shards.
    pub fn shard_count(&self) -> usize {
        self.shards
    }

    /// Returns the seed mixed into every hash.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Maps a key to a shard index in `[0, shards)`.
    pub fn shard_for_key<K: Hash + ?Sized>(&self, key: &K) -> usize {
        if self.shards == 1 {
            return 0;
        }
        let mut hasher = DefaultHasher::new();
        self.seed.hash(&mut hasher);
        key.hash(&mut hasher);
        (hasher.finish() % self.shards as u64) as usize
    }
}

impl Default for ShardSelector {
    /// Creates a single-shard selector with seed 0.
    fn default() -> Self {
        Self::new(1, 0)
    }
}

impl<K: Hash> Segmenter<K> for ShardSelector {
    fn segment_count(&self) -> usize {
        self.shards
    }

    fn segment(&self, key: &K) -> usize {
        self.shard_for_key(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shard_selector_is_deterministic() {
        let selector = ShardSelector::new(8, 123);

        let a = selector.shard_for_key(&"key");
        let b = selector.shard_for_key(&"key");
        assert_eq!(a, b);
        assert!(a < selector.shard_count());
    }

    #[test]
    fn zero_shards_clamped_to_one() {
        let selector = ShardSelector::new(0, 7);
        assert_eq!(selector.shard_count(), 1);
        assert_eq!(selector.shard_for_key(&42_u64), 0);
    }

    #[test]
    fn every_key_lands_in_range() {
        let selector = ShardSelector::new(5, 9);
        for key in 0..1_000_u64 {
            assert!(selector.shard_for_key(&key) < 5);
        }
    }

    #[test]
    fn keys_spread_over_all_shards() {
        let selector = ShardSelector::new(4, 0);
        let mut seen = [false; 4];
        for key in 0..256_u64 {
            seen[selector.shard_for_key(&key)] = true;
        }
        assert!(seen.iter().all(|hit| *hit));
    }

    #[test]
    fn segmenter_matches_shard_for_key() {
        let selector = ShardSelector::new(16, 3);
        assert_eq!(Segmenter::<u64>::segment_count(&selector), 16);
        for key in 0..64_u64 {
            assert_eq!(selector.segment(&key), selector.shard_for_key(&key));
        }
    }
}
