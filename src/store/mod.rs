//! Storage backends for the two cache tiers.
//!
//! The ring and engine stay independent of where payload bytes live; these
//! modules own that concern. The volatile tier allocates from the heap, the
//! persistent tier from an external allocator consumed through the
//! [`PersistentAllocator`](alloc::PersistentAllocator) contract.

pub mod alloc;
pub mod segment;

pub use alloc::{AllocationFailed, HeapRegion, HeapRegionAllocator, PersistentAllocator, Region};
pub use segment::{
    PersistentSegment, PersistentSource, REGION_HEADER_BYTES, Segment, SegmentSource,
    VolatileSegment, VolatileSource,
};
