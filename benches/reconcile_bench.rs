//! Benchmarks for the reconcile hot path
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion, Throughput};
use printwatch::reconcile::{Reconciler, ReconcilerConfig, RetentionCap};
use printwatch::snapshot::{Snapshot, TimedPoint};

fn steady_snapshot(timestamp: i64) -> Snapshot {
    Snapshot {
        printing: Some(true),
        gcode: Some(TimedPoint::new(timestamp, 1.0)),
        actual: Some(TimedPoint::new(timestamp, 0.9)),
        ..Default::default()
    }
}

fn history_snapshot(len: usize) -> Snapshot {
    let history: Vec<TimedPoint> = (0..len)
        .map(|i| TimedPoint::new(i as i64 * 1000, i as f64))
        .collect();
    Snapshot {
        printing: Some(true),
        gcode: Some(TimedPoint::new(len as i64 * 1000, 1.0)),
        actual: Some(TimedPoint::new(len as i64 * 1000, 0.9)),
        gcode_history: history.clone(),
        actual_history: history,
        history_length: Some(len),
        ..Default::default()
    }
}

fn bench_steady_append(c: &mut Criterion) {
    let mut group = c.benchmark_group("reconcile");

    for cap in [120usize, 1000] {
        group.throughput(Throughput::Elements(1));

        group.bench_function(format!("steady_append_cap_{}", cap), |b| {
            let mut reconciler = Reconciler::new(ReconcilerConfig {
                retention_cap: RetentionCap::Fixed(cap),
                ..Default::default()
            });

            // Fill to the cap so every iteration pays for an eviction
            let mut timestamp = 0i64;
            for _ in 0..cap {
                timestamp += 1000;
                reconciler.reconcile(&steady_snapshot(timestamp)).unwrap();
            }

            b.iter(|| {
                timestamp += 1000;
                reconciler
                    .reconcile(black_box(&steady_snapshot(timestamp)))
                    .unwrap()
            });
        });
    }

    group.finish();
}

fn bench_reload(c: &mut Criterion) {
    let mut group = c.benchmark_group("reconcile");

    for len in [120usize, 1000] {
        let snapshot = history_snapshot(len);

        group.throughput(Throughput::Elements(len as u64));

        group.bench_function(format!("reload_{}", len), |b| {
            b.iter_batched(
                || Reconciler::new(ReconcilerConfig::default()),
                |mut reconciler| reconciler.reconcile(black_box(&snapshot)).unwrap(),
                BatchSize::SmallInput,
            )
        });
    }

    group.finish();
}

criterion_group!(benches, bench_steady_append, bench_reload);
criterion_main!(benches);
