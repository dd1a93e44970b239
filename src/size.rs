//! Value size estimation.
//!
//! The engine does not interpret the unit of a size; it records whatever the
//! estimator returns in the item statistics so eviction-policy code can sum
//! and compare it. Estimates must be non-negative: a negative estimate makes
//! `put` fail with [`CacheError::InvalidArgument`](crate::error::CacheError::InvalidArgument)
//! before anything is stored.

use crate::error::{CacheError, Result};

/// Estimates the size of a value.
///
/// Implemented for any `Fn(&V) -> i64 + Send + Sync`.
pub trait SizeEstimator<V>: Send + Sync {
    fn estimate(&self, value: &V) -> i64;
}

impl<V, F> SizeEstimator<V> for F
where
    F: Fn(&V) -> i64 + Send + Sync,
{
    fn estimate(&self, value: &V) -> i64 {
        self(value)
    }
}

/// Every value has size 1, so summed sizes count items.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UnitSize;

impl<V> SizeEstimator<V> for UnitSize {
    fn estimate(&self, _value: &V) -> i64 {
        1
    }
}

/// Size is the byte length of the value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ByteLen;

impl<V: AsRef<[u8]>> SizeEstimator<V> for ByteLen {
    fn estimate(&self, value: &V) -> i64 {
        i64::try_from(value.as_ref().len()).unwrap_or(i64::MAX)
    }
}

/// Convert a raw estimate into a stored size.
pub(crate) fn checked_size(size: i64) -> Result<u64> {
    u64::try_from(size).map_err(|_| {
        CacheError::invalid_argument(format!("size must be non-negative, got {size}"))
    })
}
