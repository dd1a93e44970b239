//! statcache: a pluggable in-memory cache engine with per-item statistics.
//!
//! The engine stores values through a [`ValueStore`](store::traits::ValueStore),
//! keeps per-key metadata in an item directory, and exposes every item's
//! access statistics so that caller-supplied policy code can decide what to
//! evict. It does not implement an eviction policy itself.
//!
//! - [`flat::FlatCache`]: one directory over one store.
//! - [`segmented::SegmentedCache`]: keys sharded over independent flat caches.
//! - [`builder::CacheBuilder`]: assembles either from a store factory, a size
//!   estimator, an expiration policy and a [`config::CacheConfig`].

pub mod builder;
pub mod config;
pub mod directory;
pub mod ds;
pub mod error;
pub mod expiration;
pub mod flat;
pub mod item;
pub mod limits;
pub mod metrics;
pub mod prelude;
pub mod segmented;
pub mod size;
pub mod stats;
pub mod store;
pub mod traits;

pub use builder::CacheBuilder;
pub use error::{CacheError, Result};
pub use traits::Cache;
