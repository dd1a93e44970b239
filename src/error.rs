//! Error types for the statcache library.
//!
//! ## Key Components
//!
//! - [`CacheError`]: Returned by cache, segment and item operations. Every
//!   variant is a synchronous failure of the offending call; the cache stays
//!   usable for other keys afterwards.
//! - [`StoreError`](crate::store::traits::StoreError): Value-store failures,
//!   wrapped unmodified in [`CacheError::Store`].
//! - [`ConfigError`]: Returned when cache configuration parameters are invalid
//!   (e.g. zero segments).
//! - [`InvariantError`]: Returned when internal bookkeeping invariants are
//!   violated (debug `check_invariants` methods).
//!
//! ## Example Usage
//!
//! ```
//! use statcache::error::{CacheError, ConfigError};
//! use statcache::config::CacheConfig;
//!
//! let bad = CacheConfig {
//!     segments: 0,
//!     ..CacheConfig::default()
//! };
//! let err: ConfigError = bad.validate().unwrap_err();
//! assert!(err.to_string().contains("segments"));
//!
//! let err = CacheError::invalid_argument("size must be non-negative, got -1");
//! assert!(matches!(err, CacheError::InvalidArgument(_)));
//! ```

use thiserror::Error;

use crate::store::traits::StoreError;

/// Convenience result alias for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;

// ---------------------------------------------------------------------------
// CacheError
// ---------------------------------------------------------------------------

/// Failure of a cache, segment or item operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CacheError {
    /// A required input was out of range: a negative size estimate or a
    /// segment index outside `[0, segment_count)`.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// An update addressed an item with a value carrying a different key.
    #[error("value key does not match the cache item key")]
    KeyMismatch,

    /// The item has reached the terminal expired state. Treat the key as
    /// absent.
    #[error("cache item has already expired")]
    AlreadyExpired,

    /// The value store failed; passed through as reported by the store.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl CacheError {
    /// Builds an [`CacheError::InvalidArgument`] from a description.
    #[inline]
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }
}

// ---------------------------------------------------------------------------
// InvariantError
// ---------------------------------------------------------------------------

/// Error returned when internal cache invariants are violated.
///
/// Produced by [`FlatCache::check_invariants`](crate::flat::FlatCache::check_invariants).
/// Carries a human-readable description of which invariant failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct InvariantError(String);

impl InvariantError {
    /// Creates a new `InvariantError` with the given description.
    #[inline]
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    /// Returns the error description.
    #[inline]
    pub fn message(&self) -> &str {
        &self.0
    }
}

// ---------------------------------------------------------------------------
// ConfigError
// ---------------------------------------------------------------------------

/// Error returned when cache configuration parameters are invalid.
///
/// Produced by [`CacheConfig::validate`](crate::config::CacheConfig::validate)
/// and the builder `try_build_*` methods.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ConfigError(String);

impl ConfigError {
    /// Creates a new `ConfigError` with the given description.
    #[inline]
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    /// Returns the error description.
    #[inline]
    pub fn message(&self) -> &str {
        &self.0
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
