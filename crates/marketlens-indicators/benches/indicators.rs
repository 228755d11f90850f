//! Benchmarks for indicator implementations.

use chrono::{Duration, NaiveDate};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use marketlens_core::traits::Indicator;
use marketlens_core::types::PriceBar;
use marketlens_indicators::{enrich, gap_fill, EnrichOptions, Ema, Rsi, Sma};

fn generate_test_data(size: usize) -> Vec<f64> {
    (0..size)
        .map(|i| 100.0 + (i as f64 * 0.1).sin() * 10.0)
        .collect()
}

/// Bars on every other day so gap-filling has work to do.
fn generate_bars(size: usize) -> Vec<PriceBar> {
    let start = NaiveDate::from_ymd_opt(2000, 1, 1).unwrap();
    generate_test_data(size)
        .into_iter()
        .enumerate()
        .map(|(i, close)| {
            let date = start + Duration::days(2 * i as i64);
            PriceBar::new("7203", date, close, close + 1.0, close - 1.0, close, 1_000)
        })
        .collect()
}

fn benchmark_moving_averages(c: &mut Criterion) {
    let mut group = c.benchmark_group("MovingAverage");

    for size in [1000, 10000, 100000].iter() {
        let data = generate_test_data(*size);

        group.bench_with_input(BenchmarkId::new("sma", size), &data, |b, data| {
            let sma = Sma::new(25);
            b.iter(|| sma.calculate(black_box(data)))
        });

        group.bench_with_input(BenchmarkId::new("ema", size), &data, |b, data| {
            let ema = Ema::new(26);
            b.iter(|| ema.calculate(black_box(data)))
        });
    }

    group.finish();
}

fn benchmark_rsi(c: &mut Criterion) {
    let mut group = c.benchmark_group("RSI");

    for size in [1000, 10000, 100000].iter() {
        let data = generate_test_data(*size);

        group.bench_with_input(BenchmarkId::new("wilder", size), &data, |b, data| {
            let rsi = Rsi::new(14);
            b.iter(|| rsi.calculate(black_box(data)))
        });
    }

    group.finish();
}

fn benchmark_enrich(c: &mut Criterion) {
    let mut group = c.benchmark_group("Enrich");
    let today = NaiveDate::from_ymd_opt(2100, 1, 1).unwrap();

    for size in [250, 1250, 5000].iter() {
        let bars = generate_bars(*size);

        group.bench_with_input(BenchmarkId::new("gap_fill", size), &bars, |b, bars| {
            b.iter(|| gap_fill(black_box(bars)))
        });

        group.bench_with_input(BenchmarkId::new("enrich", size), &bars, |b, bars| {
            b.iter(|| enrich(black_box(bars), &EnrichOptions::default(), today))
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_moving_averages, benchmark_rsi, benchmark_enrich);
criterion_main!(benches);
