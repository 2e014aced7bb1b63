//! Benchmark suite for pylearn-algo
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use pylearn_algo::{batch_score, compute_skill_score, derive_policy, PerformanceSnapshot};

fn sample_snapshot(i: u32) -> PerformanceSnapshot {
    let outcomes: Vec<bool> = (0..10).map(|j| (i + j) % 3 != 0).collect();
    PerformanceSnapshot::from_outcomes(1, i % 30, &outcomes, 10, 10)
}

fn bench_score_and_policy(c: &mut Criterion) {
    let snapshot = sample_snapshot(7);
    c.bench_function("compute_skill_score + derive_policy", |b| {
        b.iter(|| derive_policy(compute_skill_score(black_box(&snapshot))))
    });
}

fn bench_batch_score(c: &mut Criterion) {
    let snapshots: Vec<PerformanceSnapshot> = (0..10_000).map(sample_snapshot).collect();
    c.bench_function("batch_score 10k learners", |b| {
        b.iter(|| batch_score(black_box(&snapshots)))
    });
}

criterion_group!(benches, bench_score_and_policy, bench_batch_score);
criterion_main!(benches);
