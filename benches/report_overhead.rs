//! Report computation benchmark
//!
//! Interim reports recompute every statistic over the whole history, so the
//! cost grows with the trial count. This measures that cost for realistic
//! session lengths, plus text rendering and metric extraction.
//!
//! # Run Instructions
//!
//! ```bash
//! cargo bench --bench report_overhead
//! ```

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use pairbench::accumulator::{TrialAccumulator, TrialResult};
use pairbench::report::{ReportKind, SessionReport};
use pairbench::runner::MetricExtractor;

/// Deterministic pseudo-noisy metric pairs
fn filled_accumulator(trials: u64) -> TrialAccumulator {
    let mut acc = TrialAccumulator::new();
    for i in 0..trials {
        let noise = (i * 7919) % 1000;
        acc.push(TrialResult::new(1_900_000 + noise, 1_905_000 + (noise * 3) % 1000));
    }
    acc
}

fn bench_accumulator_report(c: &mut Criterion) {
    let mut group = c.benchmark_group("accumulator_report");

    for trials in [10u64, 100, 1000, 10_000] {
        let acc = filled_accumulator(trials);
        group.bench_with_input(BenchmarkId::from_parameter(trials), &acc, |b, acc| {
            b.iter(|| black_box(acc.report()));
        });
    }

    group.finish();
}

fn bench_render_text(c: &mut Criterion) {
    let report = SessionReport {
        kind: ReportKind::Final,
        baseline: "stockfish-master".to_string(),
        candidate: "stockfish-patch".to_string(),
        pinning_degraded: false,
        statistics: filled_accumulator(100)
            .report()
            .expect("100 trials are enough for a report"),
    };

    c.bench_function("render_text", |b| {
        b.iter(|| black_box(report.render_text()));
    });
}

fn bench_metric_extraction(c: &mut Criterion) {
    let extractor = MetricExtractor::new().expect("metric pattern compiles");
    let mut output = String::new();
    for i in 0..200 {
        output.push_str(&format!("info depth {} score cp 31 nodes 12345 nps 1900000\n", i));
    }
    output.push_str("Total time (ms) : 4213\nNodes searched  : 8264134\nNodes/second    : 1961579\n");

    c.bench_function("metric_extraction", |b| {
        b.iter(|| black_box(extractor.extract(black_box(output.as_bytes()))));
    });
}

criterion_group!(
    benches,
    bench_accumulator_report,
    bench_render_text,
    bench_metric_extraction
);
criterion_main!(benches);
