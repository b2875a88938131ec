//! Benchmarks for the two-tier clock cache.
//!
//! Run with: `cargo bench --bench cache`

use criterion::{BatchSize, Criterion, Throughput, criterion_group, criterion_main};
use tierclock::cache::ClockCache;
use tierclock::store::HeapRegionAllocator;

fn populated_cache(entries: u64) -> ClockCache<HeapRegionAllocator> {
    let mut cache = ClockCache::new(HeapRegionAllocator::new(1 << 20), 256 * 1024, 1 << 20);
    for i in 0..entries {
        cache.put(&i.to_le_bytes(), &[0u8; 64]).unwrap();
    }
    cache
}

// ============================================================================
// Mixed put + get
// ============================================================================

fn bench_put_get(c: &mut Criterion) {
    let mut group = c.benchmark_group("tiered_clock");
    let ops_per_iter = 1024u64 * 2;
    group.throughput(Throughput::Elements(ops_per_iter));

    group.bench_function("put_get", |b| {
        b.iter_batched(
            || populated_cache(1024),
            |mut cache| {
                for i in 0..1024u64 {
                    cache
                        .put(&std::hint::black_box(i + 10_000).to_le_bytes(), &[1u8; 64])
                        .unwrap();
                    let _ = std::hint::black_box(cache.get(&i.to_le_bytes()));
                }
            },
            BatchSize::SmallInput,
        )
    });

    group.finish();
}

// ============================================================================
// Eviction churn (continuous capacity pressure)
// ============================================================================

fn bench_eviction_churn(c: &mut Criterion) {
    let mut group = c.benchmark_group("tiered_clock");
    group.throughput(Throughput::Elements(4096));

    group.bench_function("eviction_churn", |b| {
        b.iter_batched(
            || populated_cache(2048),
            |mut cache| {
                for i in 0..4096u64 {
                    cache
                        .put(&std::hint::black_box(20_000 + i).to_le_bytes(), &[2u8; 64])
                        .unwrap();
                }
            },
            BatchSize::SmallInput,
        )
    });

    group.finish();
}

criterion_group!(benches, bench_put_get, bench_eviction_churn);
criterion_main!(benches);
