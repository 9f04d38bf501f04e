//! Run the health pipeline against a healthy window and a gallery of faults
//!
//! Run with: cargo run --example health_demo -p rngmon-core

use rngmon_core::prelude::*;
use rngmon_core::sample_synth::{self, add_lag_echo, mix_by_power, tone};
use rngmon_core::types::SampleWindow;

fn main() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = MonitorConfig::default();
    let n = config.window_len;
    let full_scale = config.full_scale();
    let mut monitor = HealthMonitor::new(config).expect("reference configuration");

    let quantize = |signal: &[f64]| {
        sample_synth::to_adc_window(signal, 511.5, 37.45, full_scale)
            .expect("power-of-two synthesis window")
    };

    println!("HWRNG health monitor demo ({n}-sample windows)\n");

    let healthy = NoiseSynth::new(42).band_noise(n, 0.18, 7);
    judge(&mut monitor, "healthy band-limited noise", &quantize(&healthy));

    let flat = SampleWindow::new(vec![512; n]).expect("constant window");
    judge(&mut monitor, "flat-lined ADC", &flat);

    let hum = mix_by_power(&tone(n, 41.0 / n as f64, 0.0), &healthy, 0.5);
    judge(&mut monitor, "strong sub-band interference line", &quantize(&hum));

    let narrow = NoiseSynth::new(7).band_noise(n, 0.18, 96);
    judge(&mut monitor, "narrowband (ringing) front end", &quantize(&narrow));

    let echoed = add_lag_echo(&NoiseSynth::new(9).band_noise(n, 0.18, 5), 8, 0.5);
    judge(&mut monitor, "delayed coupling echo at lag 8", &quantize(&echoed));

    let coarse: Vec<Sample> = quantize(&NoiseSynth::new(10).band_noise(n, 0.18, 7))
        .iter()
        .map(|&s| (s / 4) * 4)
        .collect();
    let stuck = SampleWindow::new(coarse).expect("coarse window");
    judge(&mut monitor, "two stuck ADC bits", &stuck);
}

fn judge(monitor: &mut HealthMonitor, label: &str, window: &SampleWindow) {
    let report = monitor.evaluate(window).expect("window matches monitor configuration");
    match report.verdict {
        Verdict::Pass => println!("  [PASS] {label}"),
        Verdict::Fail(reason) => println!("  [FAIL] {label}: {reason}"),
    }
    println!(
        "         mean {:8.2}  variance {:10.2}  skew {:7.3}  kurtosis {:7.3}",
        report.moments.mean, report.moments.variance, report.moments.skewness, report.moments.kurtosis
    );
    if let Some(s) = report.spectrum {
        println!(
            "         peak {:.4} of fs  bandwidth {:.4} of fs",
            s.peak_fraction, s.bandwidth_fraction
        );
    }
    if let Some(e) = report.entropy {
        println!("         entropy {:.2} bits/sample", e.shannon_bits);
    }
    println!();
}
