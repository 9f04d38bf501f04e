//! Benchmarks for the HWRNG health test pipeline
//!
//! Run with: cargo bench -p rngmon-core --bench health_bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rngmon_core::autocorrelation::Correlogram;
use rngmon_core::calibration::MonitorConfig;
use rngmon_core::entropy::estimate_entropy;
use rngmon_core::health_monitor::HealthMonitor;
use rngmon_core::moment_stats::signal_moments;
use rngmon_core::power_spectrum::{PsdEstimator, WindowFunction};
use rngmon_core::sample_synth::{self, NoiseSynth};
use rngmon_core::types::SampleWindow;

fn healthy_window(n: usize) -> SampleWindow {
    let signal = NoiseSynth::new(42).band_noise(n, 0.18, 7);
    sample_synth::to_adc_window(&signal, 511.5, 37.45, 1023)
        .expect("power-of-two synthesis window")
}

// ============================================================================
// Individual stage benchmarks
// ============================================================================

fn bench_stages(c: &mut Criterion) {
    let mut group = c.benchmark_group("stages");

    let n = 4096;
    let window = healthy_window(n);
    let signal: Vec<f64> = window.iter().map(|&s| f64::from(s)).collect();
    group.throughput(Throughput::Elements(n as u64));

    group.bench_function("moments", |b| {
        b.iter(|| signal_moments(black_box(&signal)))
    });

    let mut psd = PsdEstimator::new(n, WindowFunction::Rectangular);
    group.bench_function("power_spectrum", |b| {
        b.iter(|| psd.estimate(black_box(&signal), 0.03, 5))
    });

    group.bench_function("autocorrelation", |b| {
        b.iter(|| Correlogram::of_signal(black_box(&signal), 32))
    });

    group.bench_function("entropy", |b| {
        b.iter(|| estimate_entropy(black_box(window.as_slice()), 10))
    });

    group.finish();
}

// ============================================================================
// Full pipeline benchmarks
// ============================================================================

fn bench_full_evaluation(c: &mut Criterion) {
    let mut group = c.benchmark_group("evaluate");

    for n in [1024usize, 4096, 16384].iter() {
        let config = MonitorConfig {
            window_len: *n,
            ..MonitorConfig::default()
        };
        let mut monitor = HealthMonitor::new(config).expect("reference configuration");
        let window = healthy_window(*n);

        group.throughput(Throughput::Elements(*n as u64));
        group.bench_with_input(BenchmarkId::new("healthy_window", n), n, |b, _| {
            b.iter(|| monitor.evaluate(black_box(&window)))
        });
    }

    group.finish();
}

criterion_group!(
    name = stage_benches;
    config = Criterion::default();
    targets = bench_stages
);

criterion_group!(
    name = pipeline_benches;
    config = Criterion::default();
    targets = bench_full_evaluation
);

criterion_main!(stage_benches, pipeline_benches);
