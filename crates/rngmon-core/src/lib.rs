//! # HWRNG Health Monitor
//!
//! This crate provides runtime statistical health monitoring for a hardware
//! random number generator built around amplified thermal (Johnson-Nyquist)
//! noise sampled through an ADC.
//!
//! ## Overview
//!
//! Raw thermal noise is fragile: a cracked solder joint, a saturating
//! amplifier, coupled switching interference or a stuck ADC bit all leave
//! the output stream looking superficially random while quietly destroying
//! its entropy. The monitor judges every window of raw samples against an
//! externally calibrated tolerance set before the samples are credited as
//! entropy:
//!
//! - **Moment tests**: mean, variance, skewness and excess kurtosis against
//!   calibrated bounds, accumulated in a numerically stable single pass
//! - **Spectral shape**: FFT power spectrum, peak location and occupied
//!   bandwidth of the band-pass front end
//! - **Autocorrelation**: normalized correlogram with an exemption for the
//!   short lags the analog filter legitimately correlates
//! - **Entropy**: conservative bits-per-sample floor from the ADC code
//!   histogram
//!
//! ## Signal Flow
//!
//! ```text
//! resistor → amp → band-pass → ADC → SampleWindow → HealthMonitor → Verdict
//!                                                       │
//!                                     moments → spectrum → autocorr → entropy
//! ```
//!
//! Checks short-circuit: the verdict names the first out-of-tolerance
//! statistic, and a window must clear every stage to pass. Thresholds are
//! injected from calibration data, never computed from the stream being
//! judged.
//!
//! ## Example
//!
//! ```rust
//! use rngmon_core::prelude::*;
//!
//! let config = MonitorConfig::default();
//! let mut monitor = HealthMonitor::new(config.clone()).unwrap();
//!
//! // Synthesize a window shaped like the healthy analog front end.
//! let signal = NoiseSynth::new(1).band_noise(config.window_len, 0.18, 7);
//! let window =
//!     rngmon_core::sample_synth::to_adc_window(&signal, 511.5, 37.45, config.full_scale())
//!         .unwrap();
//!
//! let report = monitor.evaluate(&window).unwrap();
//! match report.verdict {
//!     Verdict::Pass => { /* credit the window as entropy */ }
//!     Verdict::Fail(reason) => eprintln!("window rejected: {reason}"),
//! }
//! ```

pub mod autocorrelation;
pub mod calibration;
pub mod entropy;
pub mod health_monitor;
pub mod moment_stats;
pub mod power_spectrum;
pub mod sample_synth;
pub mod types;

pub use autocorrelation::Correlogram;
pub use calibration::{CalibrationError, MonitorConfig, ThresholdSet};
pub use entropy::EntropyEstimate;
pub use health_monitor::{FailureReason, HealthMonitor, HealthReport, Verdict};
pub use moment_stats::{MomentAccumulator, MomentSet};
pub use power_spectrum::{PsdEstimator, SpectrumEstimate, WindowFunction};
pub use sample_synth::NoiseSynth;
pub use types::{MonitorError, MonitorResult, Sample, SampleWindow};

pub mod prelude {
    pub use crate::calibration::{MonitorConfig, ThresholdSet};
    pub use crate::health_monitor::{FailureReason, HealthMonitor, HealthReport, Verdict};
    pub use crate::sample_synth::NoiseSynth;
    pub use crate::types::{MonitorError, Sample, SampleWindow};
}
