//! Statistics and report rendering benchmarks
//!
//! Covers the post-run path: reducing trial timings to median/min/max and
//! rendering results in both report schemas.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use driver_perf_bench::report::ReportFormat;
use driver_perf_bench::stats;
use driver_perf_bench::{BenchResult, TrialResult};
use std::time::Duration;

/// Deterministic timings in a narrow band around 10ms.
fn timings(n: usize) -> Vec<f64> {
    (0..n)
        .map(|i| 0.010 + ((i * 7919) % 1000) as f64 * 1e-6)
        .collect()
}

fn result(trials: usize, data_size: i64) -> BenchResult {
    let raw = timings(trials)
        .into_iter()
        .map(|secs| TrialResult::success(Duration::from_secs_f64(secs), 10_000))
        .collect();
    BenchResult::new("bson_flat_document_decoding", 10_000, data_size, raw)
}

fn bench_summarize(c: &mut Criterion) {
    let mut group = c.benchmark_group("summarize");
    for n in [10usize, 100, 1_000, 10_000] {
        let samples = timings(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &samples, |b, s| {
            b.iter(|| stats::summarize(black_box(s)))
        });
    }
    group.finish();
}

fn bench_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("render");
    let data_bound = result(100, 75_310_000);
    let canary = result(100, -1);

    for format in [ReportFormat::Legacy, ReportFormat::Single] {
        group.bench_function(BenchmarkId::new(format.as_str(), "data_bound"), |b| {
            b.iter(|| format.render(black_box(&data_bound)))
        });
        group.bench_function(BenchmarkId::new(format.as_str(), "canary"), |b| {
            b.iter(|| format.render(black_box(&canary)))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_summarize, bench_render);
criterion_main!(benches);
