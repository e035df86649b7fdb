//! Criterion benchmarks for the aggregation hot path.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use pulseboard_core::aggregate::{aggregate, AggregationPass};
use pulseboard_core::domain::{Entity, EntityId, MetricKind, Platform, RawCounters, SortDirection};
use pulseboard_core::metrics::{compute_all, MetricConfig};

fn make_entities(n: usize) -> Vec<Entity> {
    (0..n)
        .map(|i| Entity {
            id: EntityId::new(format!("e{i:05}")),
            name: format!("Account {i}"),
            platform: Platform::ALL[i % Platform::ALL.len()],
            owned: i == 0,
            counters: RawCounters {
                views: (i as u64 * 7919 % 100_000) + 1,
                likes: (i as u64 * 104_729 % 5_000),
                comments: (i as u64 * 1_299_709 % 800),
                shares: (i as u64 * 15_485_863 % 400),
                posts_count: 30,
                followers: (i as u64 * 27 % 1_000_000) + 100,
                followers_start: (i as u64 * 27 % 1_000_000) + 50,
                followers_end: (i as u64 * 27 % 1_000_000) + 100,
                daily_post_counts: vec![1; 30],
            },
        })
        .collect()
}

fn bench_aggregate(c: &mut Criterion) {
    let mut group = c.benchmark_group("aggregate");
    for size in [100, 1_000, 10_000] {
        let entities = make_entities(size);
        let derived = compute_all(&entities, &MetricConfig::default());

        group.bench_with_input(BenchmarkId::new("one_shot", size), &size, |b, _| {
            b.iter(|| {
                aggregate(
                    black_box(&entities),
                    black_box(&derived),
                    MetricKind::EngagementRate,
                    SortDirection::Descending,
                )
            })
        });

        group.bench_with_input(BenchmarkId::new("chunked", size), &size, |b, _| {
            b.iter(|| {
                let mut pass = AggregationPass::new(
                    black_box(&entities),
                    black_box(&derived),
                    MetricKind::EngagementRate,
                    SortDirection::Descending,
                    AggregationPass::DEFAULT_CHUNK,
                );
                while !pass.step() {}
                pass.finish()
            })
        });
    }
    group.finish();
}

fn bench_metric_compute(c: &mut Criterion) {
    let entities = make_entities(10_000);
    c.bench_function("compute_all_10k", |b| {
        b.iter(|| compute_all(black_box(&entities), &MetricConfig::default()))
    });
}

criterion_group!(benches, bench_aggregate, bench_metric_compute);
criterion_main!(benches);
