//! Criterion benchmarks for the per-run hot paths.
//!
//! Benchmarks:
//! 1. Interval detection over a full quarter-hourly day
//! 2. Detection restricted to a production window
//! 3. Series content hashing (repeat-alert suppression)

use chrono::{Duration, FixedOffset, NaiveDate, TimeZone};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rust_decimal::Decimal;

use spotalert_core::detect::{detect, detect_in_window, ProductionWindow};
use spotalert_core::domain::{PriceSample, PriceSeries};

// ── Helpers ──────────────────────────────────────────────────────────

fn make_series(minutes: i64) -> PriceSeries {
    let day = NaiveDate::from_ymd_opt(2026, 10, 20).unwrap();
    let origin = FixedOffset::east_opt(7200)
        .unwrap()
        .with_ymd_and_hms(2026, 10, 20, 0, 0, 0)
        .unwrap();
    let step = Duration::minutes(minutes);
    let count = (24 * 60 / minutes) as usize;
    let samples = (0..count)
        .map(|i| {
            // Deterministic duck curve: cheap around noon, dearer evenings.
            let cents = 8_000 + ((i as f64 * 0.13).sin() * 6_000.0) as i64;
            PriceSample::new(origin + step * i as i32, Decimal::new(cents, 2))
        })
        .collect();
    PriceSeries::new(day, step, samples).unwrap()
}

// ── 1. Detection ─────────────────────────────────────────────────────

fn bench_detect(c: &mut Criterion) {
    let mut group = c.benchmark_group("detect");
    for minutes in [15_i64, 60] {
        let series = make_series(minutes);
        group.bench_with_input(BenchmarkId::from_parameter(minutes), &series, |b, s| {
            b.iter(|| detect(black_box(s), black_box(Decimal::new(5_000, 2))))
        });
    }
    group.finish();
}

// ── 2. Windowed detection ────────────────────────────────────────────

fn bench_detect_in_window(c: &mut Criterion) {
    let series = make_series(15);
    let window = Some(ProductionWindow::new(22, 6));
    c.bench_function("detect_in_window/15", |b| {
        b.iter(|| detect_in_window(black_box(&series), Decimal::new(5_000, 2), window))
    });
}

// ── 3. Hashing ───────────────────────────────────────────────────────

fn bench_data_hash(c: &mut Criterion) {
    let series = make_series(15);
    c.bench_function("data_hash/15", |b| b.iter(|| black_box(&series).data_hash()));
}

criterion_group!(benches, bench_detect, bench_detect_in_window, bench_data_hash);
criterion_main!(benches);
