pub use crate::cache::{CacheMetrics, ClockCache, PersistentRing, Tier, VolatileRing};
pub use crate::ds::{ClockRing, NodeId, TierIndex};
pub use crate::error::CacheError;
pub use crate::heat::{HeatState, PersistentHeat, VolatileHeat};
pub use crate::store::{
    AllocationFailed, HeapRegionAllocator, PersistentAllocator, Region, Segment, SegmentSource,
};

#[cfg(feature = "concurrency")]
pub use crate::cache::ConcurrentClockCache;
