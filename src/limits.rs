//! Numeric limits consulted by eviction-policy code.
//!
//! The cache itself never reads limits. A policy that decides what to evict
//! looks up bounds such as [`LimitKind::MaxTotalSize`] here and compares them
//! with the sizes in the eviction candidates.
//!
//! ## Example Usage
//!
//! ```
//! use statcache::limits::{LimitKind, Limits, StaticLimits};
//!
//! let mut limits = StaticLimits::new();
//! limits.set_limit(LimitKind::MaxItemCount, 1_000);
//!
//! assert_eq!(limits.limit(&LimitKind::MaxItemCount), 1_000);
//! assert_eq!(limits.limit(&LimitKind::MaxTotalSize), 0);
//! ```

use std::hash::Hash;

use rustc_hash::FxHashMap;

/// Source of numeric bounds keyed by a limit kind.
pub trait Limits<L>: Send + Sync {
    /// Bound for `kind`; `0` when no bound was configured.
    fn limit(&self, kind: &L) -> u64;
}

/// Limit kinds understood by the built-in policies and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LimitKind {
    /// Upper bound on the sum of item sizes.
    MaxTotalSize,
    /// Upper bound on the number of stored values.
    MaxItemCount,
}

/// Fixed table of limits set up before use.
#[derive(Debug, Clone)]
pub struct StaticLimits<L = LimitKind> {
    limits: FxHashMap<L, u64>,
}

impl<L> StaticLimits<L>
where
    L: Eq + Hash,
{
    pub fn new() -> Self {
        Self {
            limits: FxHashMap::default(),
        }
    }

    /// Set the bound for `kind`, replacing any previous value.
    pub fn set_limit(&mut self, kind: L, value: u64) {
        self.limits.insert(kind, value);
    }

    /// Builder-style [`set_limit`](Self::set_limit).
    pub fn with_limit(mut self, kind: L, value: u64) -> Self {
        self.set_limit(kind, value);
        self
    }
}

impl<L> Default for StaticLimits<L>
where
    L: Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<L> Limits<L> for StaticLimits<L>
where
    L: Eq + Hash + Send + Sync,
{
    fn limit(&self, kind: &L) -> u64 {
        self.limits.get(kind).copied().unwrap_or(0)
    }
}
