//! Two-tier clock cache with heat-driven cross-tier migration.
//!
//! Keeps hot data in a fast volatile tier and colder data in a larger
//! persistent tier, promoting and demoting entries between them based on
//! observed read/write heat. Each tier runs the clock (second-chance)
//! replacement algorithm over its own [`ClockRing`]; a per-entry heat state
//! machine decides when the migration protocol exchanges entries across
//! tiers.
//!
//! ## Architecture
//!
//! ```text
//!   ┌──────────────────────────────────────────────────────────────────────┐
//!   │                          ClockCache<A>                               │
//!   │                                                                      │
//!   │   volatile_index ─────► ClockRing<VolatileSource, VolatileHeat>      │
//!   │   (key -> NodeId)       capacity-bounded, clock-swept                │
//!   │                              ▲            │                          │
//!   │                        swap / promote     │ evict                    │
//!   │                              │            ▼                          │
//!   │   persistent_index ───► ClockRing<PersistentSource<A>,               │
//!   │   (key -> NodeId)                     PersistentHeat>                │
//!   │                         nodes packed into allocator regions          │
//!   └──────────────────────────────────────────────────────────────────────┘
//!
//!   put(key, value)
//!     ├─ footprint > volatile capacity  → EntryTooLarge, no side effects
//!     ├─ key in volatile    → replace node, cool heat one step
//!     ├─ key in persistent  → replace node, heat one step;
//!     │                       PreMigration/Migration arms the protocol
//!     └─ absent             → evict volatile until it fits, insert cold
//!
//!   migration protocol (persistent node at PreMigration/Migration)
//!     ├─ volatile sweep finds an unreferenced MigrationCandidate → swap
//!     ├─ none found, heat == Migration  → forced one-way promote
//!     └─ none found, heat == PreMigration → advisory, stays put
//! ```
//!
//! ## Concurrency
//!
//! Every operation, `get` included, mutates reference/heat state through
//! multi-step ring and index updates, so the whole cache is a single
//! exclusive critical section. [`ConcurrentClockCache`] wraps the engine in
//! one `parking_lot::Mutex` for shared use.

use crate::ds::ring::{ClockRing, NodeId};
use crate::ds::tier_index::TierIndex;
use crate::error::CacheError;
use crate::heat::{HeatState, PersistentHeat, VolatileHeat};
use crate::store::alloc::PersistentAllocator;
use crate::store::segment::{PersistentSource, VolatileSource};

/// The volatile tier's ring type.
pub type VolatileRing = ClockRing<VolatileSource, VolatileHeat>;

/// The persistent tier's ring type.
pub type PersistentRing<A> = ClockRing<PersistentSource<A>, PersistentHeat>;

/// Which tier a key currently resides in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tier {
    /// The fast, capacity-bounded tier.
    Volatile,
    /// The larger, externally allocated tier.
    Persistent,
}

/// Snapshot of engine operation counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheMetrics {
    pub hits: u64,
    pub misses: u64,
    pub inserts: u64,
    pub updates: u64,
    pub evictions: u64,
    pub migrations: u64,
    pub swaps: u64,
}

/// Two-tier clock (second-chance) replacement engine.
///
/// Constructed with a persistent allocator and per-tier byte capacities.
/// Keys and values are arbitrary byte strings; a key resides in at most one
/// tier at a time.
///
/// # Example
///
/// ```
/// use tierclock::cache::ClockCache;
/// use tierclock::store::HeapRegionAllocator;
///
/// let mut cache = ClockCache::new(HeapRegionAllocator::new(4096), 1024, 4096);
/// cache.put(b"key", b"value").unwrap();
/// assert_eq!(cache.get(b"key"), Some(b"value".to_vec()));
/// ```
#[derive(Debug)]
pub struct ClockCache<A: PersistentAllocator> {
    volatile: VolatileRing,
    persistent: PersistentRing<A>,
    volatile_index: TierIndex,
    persistent_index: TierIndex,
    volatile_capacity: usize,
    persistent_capacity: usize,
    metrics: CacheMetrics,
}

impl<A: PersistentAllocator> ClockCache<A> {
    /// Creates an engine with the given allocator and per-tier capacities.
    pub fn new(allocator: A, volatile_capacity: usize, persistent_capacity: usize) -> Self {
        Self {
            volatile: ClockRing::new(VolatileSource),
            persistent: ClockRing::new(PersistentSource::new(allocator)),
            volatile_index: TierIndex::new(),
            persistent_index: TierIndex::new(),
            volatile_capacity,
            persistent_capacity,
            metrics: CacheMetrics::default(),
        }
    }

    /// Footprint an entry occupies in the volatile ring.
    ///
    /// This is the size `put` checks against the volatile capacity.
    pub fn volatile_footprint_of(key: &[u8], value: &[u8]) -> usize {
        VolatileRing::footprint_of(key, value)
    }

    /// Configured volatile capacity in bytes.
    pub fn volatile_capacity(&self) -> usize {
        self.volatile_capacity
    }

    /// Configured persistent capacity in bytes.
    pub fn persistent_capacity(&self) -> usize {
        self.persistent_capacity
    }

    /// Number of entries resident in the volatile tier.
    pub fn volatile_len(&self) -> usize {
        self.volatile.len()
    }

    /// Number of entries resident in the persistent tier.
    pub fn persistent_len(&self) -> usize {
        self.persistent.len()
    }

    /// Bytes currently accounted to the volatile ring.
    pub fn volatile_tracked_bytes(&self) -> usize {
        self.volatile.tracked_bytes()
    }

    /// Bytes currently accounted to the persistent ring.
    pub fn persistent_tracked_bytes(&self) -> usize {
        self.persistent.tracked_bytes()
    }

    /// Returns `true` if either tier holds `key`. Does not touch reference
    /// bits or heat.
    pub fn contains(&self, key: &[u8]) -> bool {
        self.volatile_index.contains(key) || self.persistent_index.contains(key)
    }

    /// The tier `key` currently resides in, if any. Does not touch
    /// reference bits or heat.
    pub fn tier_of(&self, key: &[u8]) -> Option<Tier> {
        if self.volatile_index.contains(key) {
            Some(Tier::Volatile)
        } else if self.persistent_index.contains(key) {
            Some(Tier::Persistent)
        } else {
            None
        }
    }

    /// Snapshot of the engine's operation counters.
    pub fn metrics(&self) -> CacheMetrics {
        self.metrics
    }

    /// Inserts or overwrites `key`.
    ///
    /// - A footprint larger than the volatile capacity fails with
    ///   [`CacheError::EntryTooLarge`] before any mutation.
    /// - Overwriting a volatile-tier entry cools its heat one step.
    /// - Overwriting a persistent-tier entry heats it one step; reaching
    ///   `PreMigration`/`Migration` arms the migration protocol.
    /// - A new key lands cold in the volatile tier, evicting until it fits.
    ///
    /// [`CacheError::AllocationFailed`] from the persistent allocator is
    /// propagated; the entry it concerns never vanishes from both tiers.
    pub fn put(&mut self, key: &[u8], value: &[u8]) -> Result<(), CacheError> {
        let footprint = VolatileRing::footprint_of(key, value);
        if footprint > self.volatile_capacity {
            return Err(CacheError::EntryTooLarge {
                footprint,
                capacity: self.volatile_capacity,
            });
        }

        if let Some(id) = self.volatile_index.find(key) {
            let old_heat = self.volatile.heat(id);
            self.volatile.remove(id);
            self.volatile_index.remove(key);
            self.make_volatile_room(footprint);

            let new_id = self.volatile.insert(key, value)?;
            self.volatile.set_referenced(new_id, true);
            self.volatile.set_heat(new_id, old_heat.cooler());
            self.volatile_index.put(key, new_id);
            self.metrics.updates += 1;
            return Ok(());
        }

        if let Some(id) = self.persistent_index.find(key) {
            // Allocate the replacement before unlinking the old node so an
            // allocation failure leaves the entry exactly where it was.
            let segment = self.persistent.allocate_segment(key, value)?;
            let old_heat = self.persistent.heat(id);
            self.persistent.remove(id);
            self.persistent_index.remove(key);
            self.make_persistent_room(PersistentRing::<A>::footprint_of(key, value));

            let new_id = self.persistent.insert_segment(segment);
            self.persistent.set_referenced(new_id, true);
            let heat = old_heat.hotter();
            self.persistent.set_heat(new_id, heat);
            self.persistent_index.put(key, new_id);
            self.metrics.updates += 1;

            if heat.arms_migration() {
                self.trigger_migration(new_id)?;
            }
            return Ok(());
        }

        self.make_volatile_room(footprint);
        let new_id = self.volatile.insert(key, value)?;
        self.volatile.set_referenced(new_id, true);
        self.volatile_index.put(key, new_id);
        self.metrics.inserts += 1;
        Ok(())
    }

    /// Looks up `key`, returning a copy of its value.
    ///
    /// A volatile-tier hit sets the reference bit and leaves heat alone
    /// (heat reflects write cooling only). A persistent-tier hit sets the
    /// reference bit, heats the entry one step, and may arm the migration
    /// protocol; a migration that cannot allocate is deferred to a later
    /// access rather than surfaced, since `get` has no error channel.
    pub fn get(&mut self, key: &[u8]) -> Option<Vec<u8>> {
        if let Some(id) = self.volatile_index.find(key) {
            self.volatile.set_referenced(id, true);
            self.metrics.hits += 1;
            return Some(self.volatile.value(id).to_vec());
        }

        if let Some(id) = self.persistent_index.find(key) {
            self.persistent.set_referenced(id, true);
            let heat = self.persistent.heat(id).hotter();
            self.persistent.set_heat(id, heat);
            let value = self.persistent.value(id).to_vec();
            self.metrics.hits += 1;

            if heat.arms_migration() {
                let _ = self.trigger_migration(id);
            }
            return Some(value);
        }

        self.metrics.misses += 1;
        None
    }

    /// One clock sweep over the volatile ring, evicting exactly one entry.
    ///
    /// Walks forward from the head; the first unreferenced entry is
    /// discarded, referenced entries lose their bit (second chance). A full
    /// revolution without a victim discards the head unconditionally, so
    /// the call completes within 2N steps. An empty ring is a no-op.
    fn evict_volatile(&mut self) {
        let Some(start) = self.volatile.head() else {
            return;
        };
        let mut candidate = start;
        loop {
            if !self.volatile.referenced(candidate) {
                self.discard_volatile(candidate);
                return;
            }
            self.volatile.set_referenced(candidate, false);
            candidate = self.volatile.next(candidate);
            if candidate == start {
                break;
            }
        }
        self.discard_volatile(start);
    }

    /// The persistent-tier counterpart of [`evict_volatile`](Self::evict_volatile).
    fn evict_persistent(&mut self) {
        let Some(start) = self.persistent.head() else {
            return;
        };
        let mut candidate = start;
        loop {
            if !self.persistent.referenced(candidate) {
                self.discard_persistent(candidate);
                return;
            }
            self.persistent.set_referenced(candidate, false);
            candidate = self.persistent.next(candidate);
            if candidate == start {
                break;
            }
        }
        self.discard_persistent(start);
    }

    /// Runs the migration protocol for a persistent node.
    ///
    /// No-op unless the node's heat is `PreMigration` or `Migration`.
    /// Sweeps the volatile ring for an unreferenced `MigrationCandidate`,
    /// clearing reference bits along the way; a found candidate is swapped.
    /// With no candidate, `Migration` forces a one-way promote and
    /// `PreMigration` leaves the entry in place for a later access.
    fn trigger_migration(&mut self, id: NodeId) -> Result<(), CacheError> {
        let heat = self.persistent.heat(id);
        if !heat.arms_migration() {
            return Ok(());
        }

        match self.find_swap_candidate() {
            Some(dram_id) => self.swap(id, dram_id),
            None if heat == PersistentHeat::Migration => self.force_promote(id),
            None => Ok(()),
        }
    }

    /// Volatile sweep for a swap partner: an unreferenced entry whose heat
    /// is `MigrationCandidate`. Second-chance bookkeeping continues whether
    /// or not a candidate turns up.
    fn find_swap_candidate(&mut self) -> Option<NodeId> {
        let start = self.volatile.head()?;
        let mut candidate = start;
        loop {
            if self.volatile.heat(candidate) == VolatileHeat::MigrationCandidate
                && !self.volatile.referenced(candidate)
            {
                return Some(candidate);
            }
            if self.volatile.referenced(candidate) {
                self.volatile.set_referenced(candidate, false);
            }
            candidate = self.volatile.next(candidate);
            if candidate == start {
                return None;
            }
        }
    }

    /// Exchanges tier residency of a persistent and a volatile entry.
    ///
    /// The persistent replacement is allocated before any structural
    /// change, so an allocation failure leaves both entries untouched. Both
    /// replacements start referenced at their tier's initial heat. No
    /// capacity check: this is a like-for-like exchange of entries whose
    /// footprints are already accounted.
    fn swap(&mut self, nvm_id: NodeId, dram_id: NodeId) -> Result<(), CacheError> {
        let dram_key = self.volatile.key(dram_id).to_vec();
        let dram_value = self.volatile.value(dram_id).to_vec();
        let nvm_key = self.persistent.key(nvm_id).to_vec();
        let nvm_value = self.persistent.value(nvm_id).to_vec();

        let segment = self.persistent.allocate_segment(&dram_key, &dram_value)?;

        self.volatile.remove(dram_id);
        self.volatile_index.remove(&dram_key);
        self.persistent.remove(nvm_id);
        self.persistent_index.remove(&nvm_key);

        let new_nvm = self.persistent.insert_segment(segment);
        self.persistent.set_referenced(new_nvm, true);
        self.persistent_index.put(&dram_key, new_nvm);

        let new_dram = self.volatile.insert(&nvm_key, &nvm_value)?;
        self.volatile.set_referenced(new_dram, true);
        self.volatile_index.put(&nvm_key, new_dram);

        self.metrics.swaps += 1;
        Ok(())
    }

    /// One-way move of a persistent entry into the volatile tier.
    ///
    /// Evicts volatile entries until the promoted footprint fits; the
    /// evicted entries are discarded, not demoted. The volatile copy is
    /// linked before the persistent original is deleted, so the entry can
    /// never be lost mid-move.
    fn force_promote(&mut self, id: NodeId) -> Result<(), CacheError> {
        let key = self.persistent.key(id).to_vec();
        let value = self.persistent.value(id).to_vec();
        self.make_volatile_room(VolatileRing::footprint_of(&key, &value));

        let new_id = self.volatile.insert(&key, &value)?;
        self.volatile.set_referenced(new_id, true);
        self.persistent.remove(id);
        self.persistent_index.remove(&key);
        self.volatile_index.put(&key, new_id);
        self.metrics.migrations += 1;
        Ok(())
    }

    fn make_volatile_room(&mut self, footprint: usize) {
        while self.volatile.tracked_bytes() + footprint > self.volatile_capacity
            && !self.volatile.is_empty()
        {
            self.evict_volatile();
        }
    }

    fn make_persistent_room(&mut self, footprint: usize) {
        while self.persistent.tracked_bytes() + footprint > self.persistent_capacity
            && !self.persistent.is_empty()
        {
            self.evict_persistent();
        }
    }

    fn discard_volatile(&mut self, id: NodeId) {
        let key = self.volatile.key(id).to_vec();
        self.volatile_index.remove(&key);
        self.volatile.remove(id);
        self.metrics.evictions += 1;
    }

    fn discard_persistent(&mut self, id: NodeId) {
        let key = self.persistent.key(id).to_vec();
        self.persistent_index.remove(&key);
        self.persistent.remove(id);
        self.metrics.evictions += 1;
    }

    #[cfg(any(test, debug_assertions))]
    pub fn debug_validate_invariants(&self) {
        self.volatile.debug_validate_invariants();
        self.persistent.debug_validate_invariants();
        assert_eq!(self.volatile.len(), self.volatile_index.len());
        assert_eq!(self.persistent.len(), self.persistent_index.len());

        // A key lives in at most one tier.
        for key in self.volatile_index.keys() {
            assert!(
                !self.persistent_index.contains(key),
                "key resident in both tiers"
            );
        }
    }
}

// ---------------------------------------------------------------------------
// Concurrent wrapper
// ---------------------------------------------------------------------------

#[cfg(feature = "concurrency")]
pub use concurrent::ConcurrentClockCache;

#[cfg(feature = "concurrency")]
mod concurrent {
    use parking_lot::Mutex;

    use super::{CacheMetrics, ClockCache, Tier};
    use crate::error::CacheError;
    use crate::store::alloc::PersistentAllocator;

    /// Thread-safe wrapper serializing all operations through one `Mutex`.
    ///
    /// Every engine operation, `get` included, mutates reference and heat
    /// state, so a single exclusive lock is the whole concurrency story.
    #[derive(Debug)]
    pub struct ConcurrentClockCache<A: PersistentAllocator> {
        inner: Mutex<ClockCache<A>>,
    }

    impl<A: PersistentAllocator> ConcurrentClockCache<A> {
        /// Creates a wrapped engine with the given allocator and capacities.
        pub fn new(allocator: A, volatile_capacity: usize, persistent_capacity: usize) -> Self {
            Self {
                inner: Mutex::new(ClockCache::new(
                    allocator,
                    volatile_capacity,
                    persistent_capacity,
                )),
            }
        }

        /// Inserts or overwrites `key`.
        pub fn put(&self, key: &[u8], value: &[u8]) -> Result<(), CacheError> {
            let mut cache = self.inner.lock();
            cache.put(key, value)
        }

        /// Tries to insert without blocking; `None` if the lock is held.
        pub fn try_put(&self, key: &[u8], value: &[u8]) -> Option<Result<(), CacheError>> {
            let mut cache = self.inner.try_lock()?;
            Some(cache.put(key, value))
        }

        /// Looks up `key`, returning a copy of its value.
        pub fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
            let mut cache = self.inner.lock();
            cache.get(key)
        }

        /// Tries to look up without blocking; `None` if the lock is held.
        pub fn try_get(&self, key: &[u8]) -> Option<Option<Vec<u8>>> {
            let mut cache = self.inner.try_lock()?;
            Some(cache.get(key))
        }

        /// Returns `true` if either tier holds `key`.
        pub fn contains(&self, key: &[u8]) -> bool {
            let cache = self.inner.lock();
            cache.contains(key)
        }

        /// The tier `key` currently resides in, if any.
        pub fn tier_of(&self, key: &[u8]) -> Option<Tier> {
            let cache = self.inner.lock();
            cache.tier_of(key)
        }

        /// Number of entries resident in the volatile tier.
        pub fn volatile_len(&self) -> usize {
            let cache = self.inner.lock();
            cache.volatile_len()
        }

        /// Number of entries resident in the persistent tier.
        pub fn persistent_len(&self) -> usize {
            let cache = self.inner.lock();
            cache.persistent_len()
        }

        /// Snapshot of the engine's operation counters.
        pub fn metrics(&self) -> CacheMetrics {
            let cache = self.inner.lock();
            cache.metrics()
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
