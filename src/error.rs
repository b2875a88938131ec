//! Error types for the tierclock library.
//!
//! ## Key Components
//!
//! - [`CacheError`]: Returned by [`ClockCache::put`](crate::cache::ClockCache::put)
//!   when an entry cannot be admitted or the persistent allocator is out of
//!   room.
//!
//! An oversized entry is a reported error, never a silent no-op: `put` checks
//! the volatile footprint before touching either tier, so a failed call leaves
//! the cache exactly as it was.

use std::fmt;

use crate::store::alloc::AllocationFailed;

// ---------------------------------------------------------------------------
// CacheError
// ---------------------------------------------------------------------------

/// Error returned by cache mutations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheError {
    /// The entry's volatile footprint exceeds the volatile tier's total
    /// capacity; it can never be admitted.
    EntryTooLarge {
        /// Footprint the entry would occupy in the volatile ring.
        footprint: usize,
        /// Configured volatile capacity in bytes.
        capacity: usize,
    },
    /// The persistent allocator could not provide a region.
    AllocationFailed {
        /// Size of the region that was requested.
        requested: usize,
    },
}

impl fmt::Display for CacheError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheError::EntryTooLarge {
                footprint,
                capacity,
            } => write!(
                f,
                "entry footprint {footprint} exceeds volatile capacity {capacity}"
            ),
            CacheError::AllocationFailed { requested } => {
                write!(f, "persistent allocation of {requested} bytes failed")
            },
        }
    }
}

impl std::error::Error for CacheError {}

impl From<AllocationFailed> for CacheError {
    fn from(err: AllocationFailed) -> Self {
        CacheError::AllocationFailed {
            requested: err.requested,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_too_large_display_shows_sizes() {
        let err = CacheError::EntryTooLarge {
            footprint: 512,
            capacity: 256,
        };
        assert_eq!(
            err.to_string(),
            "entry footprint 512 exceeds volatile capacity 256"
        );
    }

    #[test]
    fn allocation_failed_display_shows_request() {
        let err = CacheError::AllocationFailed { requested: 128 };
        assert_eq!(err.to_string(), "persistent allocation of 128 bytes failed");
    }

    #[test]
    fn from_allocation_failed_carries_request() {
        let err: CacheError = AllocationFailed { requested: 64 }.into();
        assert_eq!(err, CacheError::AllocationFailed { requested: 64 });
    }

    #[test]
    fn cache_error_clone_and_eq() {
        let a = CacheError::AllocationFailed { requested: 1 };
        let b = a;
        assert_eq!(a, b);
    }

    #[test]
    fn cache_error_implements_std_error() {
        fn assert_error<T: std::error::Error>() {}
        assert_error::<CacheError>();
    }
}
