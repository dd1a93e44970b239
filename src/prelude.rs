pub use crate::builder::CacheBuilder;
pub use crate::config::CacheConfig;
pub use crate::ds::ShardSelector;
pub use crate::error::{CacheError, ConfigError, InvariantError};
pub use crate::expiration::{ExpirationPolicy, NeverExpire, TimeToIdle, TimeToLive};
pub use crate::flat::FlatCache;
pub use crate::item::{CacheItem, ItemState};
pub use crate::limits::{LimitKind, Limits, StaticLimits};
pub use crate::metrics::CacheMetricsSnapshot;
pub use crate::segmented::{FnSegmenter, SegmentedCache};
pub use crate::size::{ByteLen, SizeEstimator, UnitSize};
pub use crate::stats::{CacheStatisticsSnapshot, ItemStatistics};
pub use crate::store::memory::{
    MemoryStore, MemoryStoreFactory, ShardedMemoryStore, ShardedMemoryStoreFactory,
};
pub use crate::store::traits::{StoreError, StoreFactory, StoreMetrics, ValueStore};
pub use crate::traits::{Cache, EvictionDecision, Keyed, Segmenter};
