//! Expiration triggers.
//!
//! An item's expired flag is monotonic: once set it never clears, and every
//! further operation on the item fails with
//! [`CacheError::AlreadyExpired`](crate::error::CacheError::AlreadyExpired).
//! What sets the flag is pluggable. While an item is not yet expired, each
//! expiry check asks the cache's [`ExpirationPolicy`] whether it should be,
//! and latches the answer if so. Callers can also force expiry with
//! [`FlatCache::expire`](crate::flat::FlatCache::expire).

use std::time::{Duration, Instant};

use crate::stats::ItemStatistics;

/// Decides whether an item has expired.
///
/// Called under the item's lock; implementations must not touch the cache.
/// Implemented for any `Fn(&ItemStatistics, Instant) -> bool + Send + Sync`.
pub trait ExpirationPolicy: Send + Sync {
    fn is_expired(&self, statistics: &ItemStatistics, now: Instant) -> bool;
}

impl<F> ExpirationPolicy for F
where
    F: Fn(&ItemStatistics, Instant) -> bool + Send + Sync,
{
    fn is_expired(&self, statistics: &ItemStatistics, now: Instant) -> bool {
        self(statistics, now)
    }
}

/// Items only expire when explicitly told to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NeverExpire;

impl ExpirationPolicy for NeverExpire {
    fn is_expired(&self, _statistics: &ItemStatistics, _now: Instant) -> bool {
        false
    }
}

/// Items expire once `ttl` has passed since their value was last stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeToLive(pub Duration);

impl ExpirationPolicy for TimeToLive {
    fn is_expired(&self, statistics: &ItemStatistics, now: Instant) -> bool {
        statistics.age(now) >= self.0
    }
}

/// Items expire once `tti` has passed without a read or an update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeToIdle(pub Duration);

impl ExpirationPolicy for TimeToIdle {
    fn is_expired(&self, statistics: &ItemStatistics, now: Instant) -> bool {
        statistics.idle_for(now) >= self.0
    }
}
