//! Micro-operation benchmarks for the flat cache.
//!
//! Run with: `cargo bench --bench flat_cache`
//!
//! Measures put/get latency and the cost of a full candidate scan plus
//! eviction round on a single-segment cache.

use std::hint::black_box;
use std::time::{Duration, Instant};

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use statcache::builder::CacheBuilder;
use statcache::stats::CacheStatisticsSnapshot;

const ITEMS: u64 = 16_384;
const OPS: u64 = 100_000;
const SEED: u64 = 42;

type Value = (u64, u64);

// ============================================================================
// Put / Get Latency
// ============================================================================

fn bench_put(c: &mut Criterion) {
    let mut group = c.benchmark_group("flat_put");
    group.throughput(Throughput::Elements(OPS));

    group.bench_function("create", |b| {
        b.iter_custom(|iters| {
            let mut elapsed = Duration::ZERO;
            for _ in 0..iters {
                let cache = CacheBuilder::new().build_flat::<u64, Value>();
                let start = Instant::now();
                for key in 0..OPS {
                    cache.put((key, key)).unwrap();
                }
                elapsed += start.elapsed();
            }
            elapsed
        })
    });

    group.bench_function("update", |b| {
        let cache = CacheBuilder::new().build_flat::<u64, Value>();
        for key in 0..ITEMS {
            cache.put((key, key)).unwrap();
        }
        b.iter(|| {
            for i in 0..OPS {
                cache.put((i % ITEMS, i)).unwrap();
            }
        })
    });

    group.finish();
}

fn bench_get(c: &mut Criterion) {
    let mut group = c.benchmark_group("flat_get");
    group.throughput(Throughput::Elements(OPS));

    let cache = CacheBuilder::new().build_flat::<u64, Value>();
    for key in 0..ITEMS {
        cache.put((key, key)).unwrap();
    }
    let mut rng = StdRng::seed_from_u64(SEED);
    let keys: Vec<u64> = (0..OPS).map(|_| rng.gen_range(0..ITEMS * 2)).collect();

    group.bench_function("uniform_half_hits", |b| {
        b.iter(|| {
            for key in &keys {
                black_box(cache.get(key).unwrap());
            }
        })
    });

    group.finish();
}

// ============================================================================
// Eviction Round
// ============================================================================

fn evict_all(candidates: &[CacheStatisticsSnapshot<u64>]) -> Vec<u64> {
    candidates.iter().map(|c| *c.key()).collect()
}

fn bench_eviction_round(c: &mut Criterion) {
    let mut group = c.benchmark_group("flat_eviction_round");

    for items in [1_024u64, ITEMS] {
        group.throughput(Throughput::Elements(items));
        group.bench_with_input(BenchmarkId::from_parameter(items), &items, |b, &items| {
            let cache = CacheBuilder::new().build_flat::<u64, Value>();
            b.iter(|| {
                for key in 0..items {
                    cache.put((key, key)).unwrap();
                }
                black_box(cache.evict_with(evict_all).unwrap())
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_put, bench_get, bench_eviction_round);
criterion_main!(benches);
