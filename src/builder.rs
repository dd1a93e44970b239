//! Cache builder.
//!
//! Assembles the collaborators of a cache (store factory, size estimator,
//! expiration policy) with a [`CacheConfig`] into a [`FlatCache`] or a
//! [`SegmentedCache`].
//!
//! `build_*` methods are infallible and clamp zero segment or shard counts to
//! one; `try_build_*` validate the configuration and return a
//! [`ConfigError`] instead.
//!
//! ## Example
//!
//! ```rust
//! use std::time::Duration;
//!
//! use statcache::builder::CacheBuilder;
//! use statcache::expiration::TimeToLive;
//!
//! let cache = CacheBuilder::new()
//!     .segments(4)
//!     .size_estimator(|value: &(u64, String)| value.1.len() as i64)
//!     .expiration(TimeToLive(Duration::from_secs(60)))
//!     .try_build_segmented::<u64, (u64, String)>()
//!     .unwrap();
//!
//! cache.put((1, "hello".to_string())).unwrap();
//! assert_eq!(cache.get(&1).unwrap().unwrap().1, "hello");
//! assert_eq!(cache.segment_count(), 4);
//! ```

use std::hash::Hash;
use std::sync::Arc;

use crate::config::CacheConfig;
use crate::ds::ShardSelector;
use crate::error::ConfigError;
use crate::expiration::NeverExpire;
use crate::flat::FlatCache;
use crate::segmented::SegmentedCache;
use crate::size::UnitSize;
use crate::store::memory::MemoryStoreFactory;
use crate::store::traits::StoreFactory;
use crate::traits::{Keyed, Segmenter};

/// Flat cache produced by a builder with store factory `F`.
pub type BuiltFlatCache<K, V, F, E, X> = FlatCache<K, V, <F as StoreFactory<K, V>>::Store, E, X>;

/// Segmented cache produced by a builder with store factory `F`.
pub type BuiltSegmentedCache<K, V, F, E, X, G = ShardSelector> =
    SegmentedCache<K, V, <F as StoreFactory<K, V>>::Store, E, X, G>;

/// Builder for flat and segmented caches.
#[derive(Debug, Clone)]
pub struct CacheBuilder<F = MemoryStoreFactory, E = UnitSize, X = NeverExpire> {
    factory: F,
    estimator: Arc<E>,
    expiration: Arc<X>,
    config: CacheConfig,
}

impl CacheBuilder {
    /// Builder over unbounded in-memory stores, unit sizes, no expiration and
    /// the default configuration.
    pub fn new() -> Self {
        Self {
            factory: MemoryStoreFactory::new(),
            estimator: Arc::new(UnitSize),
            expiration: Arc::new(NeverExpire),
            config: CacheConfig::default(),
        }
    }
}

impl Default for CacheBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl<F, E, X> CacheBuilder<F, E, X> {
    /// Use `factory` to create one store per cache (or per segment).
    pub fn with_store_factory<F2>(self, factory: F2) -> CacheBuilder<F2, E, X> {
        CacheBuilder {
            factory,
            estimator: self.estimator,
            expiration: self.expiration,
            config: self.config,
        }
    }

    pub fn size_estimator<E2>(self, estimator: E2) -> CacheBuilder<F, E2, X> {
        CacheBuilder {
            factory: self.factory,
            estimator: Arc::new(estimator),
            expiration: self.expiration,
            config: self.config,
        }
    }

    pub fn expiration<X2>(self, expiration: X2) -> CacheBuilder<F, E, X2> {
        CacheBuilder {
            factory: self.factory,
            estimator: self.estimator,
            expiration: Arc::new(expiration),
            config: self.config,
        }
    }

    /// Replace the whole configuration.
    pub fn config(mut self, config: CacheConfig) -> Self {
        self.config = config;
        self
    }

    pub fn segments(mut self, segments: usize) -> Self {
        self.config.segments = segments;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = seed;
        self
    }

    pub fn directory_shards(mut self, shards: usize) -> Self {
        self.config.directory_shards = shards;
        self
    }

    /// The configuration the next build will use.
    pub fn current_config(&self) -> &CacheConfig {
        &self.config
    }

    /// Build a single-segment cache.
    pub fn build_flat<K, V>(&self) -> BuiltFlatCache<K, V, F, E, X>
    where
        K: Eq + Hash + Clone,
        V: Keyed<K>,
        F: StoreFactory<K, V>,
    {
        FlatCache::with_parts(
            self.factory.create(),
            Arc::clone(&self.estimator),
            Arc::clone(&self.expiration),
            self.config.directory_shards.max(1),
        )
    }

    /// Validate the configuration, then build a single-segment cache.
    ///
    /// The segment count is checked too, so one configuration is valid for
    /// both cache shapes.
    pub fn try_build_flat<K, V>(&self) -> Result<BuiltFlatCache<K, V, F, E, X>, ConfigError>
    where
        K: Eq + Hash + Clone,
        V: Keyed<K>,
        F: StoreFactory<K, V>,
    {
        self.config.validate()?;
        Ok(self.build_flat())
    }

    /// Build a segmented cache routed by a seeded hash of the key.
    pub fn build_segmented<K, V>(&self) -> BuiltSegmentedCache<K, V, F, E, X>
    where
        K: Eq + Hash + Clone,
        V: Keyed<K>,
        F: StoreFactory<K, V>,
    {
        let selector = ShardSelector::new(self.config.segments, self.config.seed);
        self.assemble(selector, self.config.directory_shards.max(1))
    }

    /// Validate the configuration, then build a hash-routed segmented cache.
    pub fn try_build_segmented<K, V>(
        &self,
    ) -> Result<BuiltSegmentedCache<K, V, F, E, X>, ConfigError>
    where
        K: Eq + Hash + Clone,
        V: Keyed<K>,
        F: StoreFactory<K, V>,
    {
        self.config.validate()?;
        Ok(self.build_segmented())
    }

    /// Build a segmented cache routed by `segmenter`.
    ///
    /// The segment count comes from the segmenter; `config.segments` and
    /// `config.seed` are ignored.
    pub fn build_segmented_with<K, V, G>(
        &self,
        segmenter: G,
    ) -> Result<BuiltSegmentedCache<K, V, F, E, X, G>, ConfigError>
    where
        K: Eq + Hash + Clone,
        V: Keyed<K>,
        F: StoreFactory<K, V>,
        G: Segmenter<K>,
    {
        if segmenter.segment_count() == 0 {
            return Err(ConfigError::new(
                "segmenter must define at least one segment",
            ));
        }
        if self.config.directory_shards == 0 {
            return Err(ConfigError::new(
                "directory_shards must be greater than zero",
            ));
        }
        Ok(self.assemble(segmenter, self.config.directory_shards))
    }

    fn assemble<K, V, G>(
        &self,
        segmenter: G,
        directory_shards: usize,
    ) -> BuiltSegmentedCache<K, V, F, E, X, G>
    where
        K: Eq + Hash + Clone,
        V: Keyed<K>,
        F: StoreFactory<K, V>,
        G: Segmenter<K>,
    {
        SegmentedCache::new(
            segmenter,
            &self.factory,
            Arc::clone(&self.estimator),
            Arc::clone(&self.expiration),
            directory_shards,
        )
    }
}
