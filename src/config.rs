//! Cache configuration.
//!
//! [`CacheConfig`] carries the structural parameters of a cache: how many
//! segments a segmented cache has, the seed of the default segmentation hash
//! and how many lock shards each item directory uses. Values come from
//! [`Default`], from environment variables, or are set field by field.

use std::env;
use std::str::FromStr;

use tracing::warn;

use crate::directory::DEFAULT_DIRECTORY_SHARDS;
use crate::error::ConfigError;

/// Environment variable for [`CacheConfig::segments`].
pub const SEGMENTS_ENV: &str = "STATCACHE_SEGMENTS";
/// Environment variable for [`CacheConfig::seed`].
pub const SEED_ENV: &str = "STATCACHE_SEED";
/// Environment variable for [`CacheConfig::directory_shards`].
pub const DIRECTORY_SHARDS_ENV: &str = "STATCACHE_DIRECTORY_SHARDS";

const DEFAULT_SEED: u64 = 0;

/// Structural cache parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Number of segments of a segmented cache. Ignored by flat caches.
    pub segments: usize,
    /// Seed for the default hash-based segmentation.
    pub seed: u64,
    /// Lock shards per item directory.
    pub directory_shards: usize,
}

impl CacheConfig {
    /// Load the configuration from environment variables.
    ///
    /// # Environment Variables
    /// - `STATCACHE_SEGMENTS` - segment count (default: available parallelism)
    /// - `STATCACHE_SEED` - segmentation seed (default: 0)
    /// - `STATCACHE_DIRECTORY_SHARDS` - directory lock shards (default: 16)
    ///
    /// Unset or unparsable variables fall back to the default. The result is
    /// not validated; call [`validate`](Self::validate) before use.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            segments: parse_or(&lookup, SEGMENTS_ENV, defaults.segments),
            seed: parse_or(&lookup, SEED_ENV, defaults.seed),
            directory_shards: parse_or(&lookup, DIRECTORY_SHARDS_ENV, defaults.directory_shards),
        }
    }

    /// Check that every parameter is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.segments == 0 {
            return Err(ConfigError::new("segments must be greater than zero"));
        }
        if self.directory_shards == 0 {
            return Err(ConfigError::new(
                "directory_shards must be greater than zero",
            ));
        }
        Ok(())
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        let segments = std::thread::available_parallelism()
            .map(|count| count.get())
            .unwrap_or(1);
        Self {
            segments,
            seed: DEFAULT_SEED,
            directory_shards: DEFAULT_DIRECTORY_SHARDS,
        }
    }
}

fn parse_or<F, T>(lookup: &F, name: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(name) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!(variable = name, value = %raw, "ignoring unparsable cache setting");
            default
        }),
        None => default,
    }
}
