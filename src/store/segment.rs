//! Payload storage strategies for ring nodes.
//!
//! Both tiers share one ring implementation; the only difference between
//! them is where a node's key/value bytes live. That seam is the
//! [`SegmentSource`] trait:
//!
//! - [`VolatileSource`] keeps key and value as two independent heap
//!   allocations.
//! - [`PersistentSource`] packs a fixed header plus key and value bytes into
//!   a single region obtained from a [`PersistentAllocator`], serialized as
//!   plain bytes:
//!
//! ```text
//!   ┌──────────────┬────────────────┬───────────┬─────────────┐
//!   │ key_len: u64 │ value_len: u64 │ key bytes │ value bytes │
//!   └──────────────┴────────────────┴───────────┴─────────────┘
//!   0              8                16          16+key_len
//! ```

use std::fmt;

use crate::store::alloc::{AllocationFailed, PersistentAllocator, Region};

/// Byte views over a stored key/value pair.
pub trait Segment: fmt::Debug {
    /// The stored key bytes.
    fn key(&self) -> &[u8];

    /// The stored value bytes.
    fn value(&self) -> &[u8];
}

/// Allocation source for ring node payloads.
pub trait SegmentSource {
    type Segment: Segment;

    /// Allocates storage holding copies of `key` and `value`.
    fn allocate(&mut self, key: &[u8], value: &[u8]) -> Result<Self::Segment, AllocationFailed>;

    /// Releases storage previously returned by [`allocate`](Self::allocate).
    fn release(&mut self, segment: Self::Segment);
}

// ---------------------------------------------------------------------------
// Volatile tier: independent heap allocations
// ---------------------------------------------------------------------------

/// Volatile-tier payload: key and value boxed separately.
#[derive(Debug)]
pub struct VolatileSegment {
    key: Box<[u8]>,
    value: Box<[u8]>,
}

impl Segment for VolatileSegment {
    fn key(&self) -> &[u8] {
        &self.key
    }

    fn value(&self) -> &[u8] {
        &self.value
    }
}

/// Volatile-tier allocation source. Allocation never fails.
#[derive(Debug, Default)]
pub struct VolatileSource;

impl SegmentSource for VolatileSource {
    type Segment = VolatileSegment;

    fn allocate(&mut self, key: &[u8], value: &[u8]) -> Result<VolatileSegment, AllocationFailed> {
        Ok(VolatileSegment {
            key: key.into(),
            value: value.into(),
        })
    }

    fn release(&mut self, segment: VolatileSegment) {
        drop(segment);
    }
}

// ---------------------------------------------------------------------------
// Persistent tier: one packed allocator region
// ---------------------------------------------------------------------------

/// Bytes of the serialized region header: two little-endian `u64` lengths.
pub const REGION_HEADER_BYTES: usize = 16;

/// Persistent-tier payload: one packed region plus decoded offsets.
#[derive(Debug)]
pub struct PersistentSegment<R: Region> {
    region: R,
    key_len: usize,
    value_len: usize,
}

impl<R: Region> PersistentSegment<R> {
    /// Total bytes of the backing region.
    pub fn region_len(&self) -> usize {
        self.region.len()
    }
}

impl<R: Region> Segment for PersistentSegment<R> {
    fn key(&self) -> &[u8] {
        let start = REGION_HEADER_BYTES;
        &self.region.as_slice()[start..start + self.key_len]
    }

    fn value(&self) -> &[u8] {
        let start = REGION_HEADER_BYTES + self.key_len;
        &self.region.as_slice()[start..start + self.value_len]
    }
}

/// Persistent-tier allocation source backed by an external allocator.
#[derive(Debug)]
pub struct PersistentSource<A: PersistentAllocator> {
    allocator: A,
}

impl<A: PersistentAllocator> PersistentSource<A> {
    /// Wraps `allocator` as a segment source.
    pub fn new(allocator: A) -> Self {
        Self { allocator }
    }

    /// Bytes a packed region for `key`/`value` occupies.
    pub fn region_size(key: &[u8], value: &[u8]) -> usize {
        REGION_HEADER_BYTES + key.len() + value.len()
    }
}

impl<A: PersistentAllocator> SegmentSource for PersistentSource<A> {
    type Segment = PersistentSegment<A::Region>;

    fn allocate(
        &mut self,
        key: &[u8],
        value: &[u8],
    ) -> Result<Self::Segment, AllocationFailed> {
        let size = Self::region_size(key, value);
        let mut region = self.allocator.allocate(size)?;

        let bytes = region.as_mut_slice();
        bytes[0..8].copy_from_slice(&(key.len() as u64).to_le_bytes());
        bytes[8..16].copy_from_slice(&(value.len() as u64).to_le_bytes());
        bytes[16..16 + key.len()].copy_from_slice(key);
        bytes[16 + key.len()..16 + key.len() + value.len()].copy_from_slice(value);

        Ok(PersistentSegment {
            region,
            key_len: key.len(),
            value_len: value.len(),
        })
    }

    fn release(&mut self, segment: Self::Segment) {
        self.allocator.free(segment.region);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::alloc::HeapRegionAllocator;

    #[test]
    fn volatile_segment_round_trips_bytes() {
        let mut source = VolatileSource;
        let segment = source.allocate(b"key", b"value").unwrap();
        assert_eq!(segment.key(), b"key");
        assert_eq!(segment.value(), b"value");
        source.release(segment);
    }

    #[test]
    fn persistent_segment_packs_header_key_value() {
        let mut source = PersistentSource::new(HeapRegionAllocator::new(1024));
        let segment = source.allocate(b"abc", b"defgh").unwrap();

        assert_eq!(segment.key(), b"abc");
        assert_eq!(segment.value(), b"defgh");
        assert_eq!(segment.region_len(), REGION_HEADER_BYTES + 3 + 5);

        let bytes = segment.region.as_slice();
        assert_eq!(u64::from_le_bytes(bytes[0..8].try_into().unwrap()), 3);
        assert_eq!(u64::from_le_bytes(bytes[8..16].try_into().unwrap()), 5);
    }

    #[test]
    fn persistent_release_returns_budget() {
        let mut source = PersistentSource::new(HeapRegionAllocator::new(64));
        let segment = source.allocate(b"k", b"v").unwrap();
        assert_eq!(source.allocator.used(), REGION_HEADER_BYTES + 2);
        source.release(segment);
        assert_eq!(source.allocator.used(), 0);
    }

    #[test]
    fn persistent_allocate_propagates_failure() {
        let mut source = PersistentSource::new(HeapRegionAllocator::new(8));
        let err = source.allocate(b"key", b"value").unwrap_err();
        assert_eq!(err.requested, REGION_HEADER_BYTES + 8);
    }

    #[test]
    fn empty_key_and_value_are_representable() {
        let mut source = PersistentSource::new(HeapRegionAllocator::new(64));
        let segment = source.allocate(b"", b"").unwrap();
        assert_eq!(segment.key(), b"");
        assert_eq!(segment.value(), b"");
        assert_eq!(segment.region_len(), REGION_HEADER_BYTES);
    }
}
