//! Health Verdict Pipeline
//!
//! [`HealthMonitor`] runs one [`SampleWindow`] through the four statistical
//! stages in fixed order and returns the first out-of-tolerance condition
//! as a typed failure:
//!
//! ```text
//!   window -> moments -> power spectrum -> autocorrelation -> entropy -> Pass
//!               |              |                 |               |
//!               v              v                 v               v
//!             Fail(..)       Fail(..)          Fail(..)        Fail(..)
//! ```
//!
//! The ordering is part of the contract: cheap moment bounds run before the
//! transform, and a window that fails an early stage never reaches the later
//! ones, so a verdict always names the *first* detected defect. Statistical
//! rejection is a [`Verdict`], not an error; [`MonitorError`] is reserved
//! for contract violations such as a wrong-length window.
//!
//! All acceptance bounds are inclusive: a statistic landing exactly on a
//! threshold passes.
//!
//! ## Example
//!
//! ```rust
//! use rngmon_core::calibration::MonitorConfig;
//! use rngmon_core::health_monitor::HealthMonitor;
//! use rngmon_core::sample_synth::{self, NoiseSynth};
//!
//! let config = MonitorConfig::default();
//! let signal = NoiseSynth::new(1).band_noise(config.window_len, 0.18, 7);
//! let window = sample_synth::to_adc_window(&signal, 511.5, 37.45, config.full_scale()).unwrap();
//!
//! let mut monitor = HealthMonitor::new(config).unwrap();
//! let report = monitor.evaluate(&window).unwrap();
//! assert!(report.is_pass());
//! ```

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::autocorrelation::Correlogram;
use crate::calibration::{CalibrationError, MonitorConfig, ThresholdSet};
use crate::entropy::{estimate_entropy, EntropyEstimate};
use crate::moment_stats::{signal_moments, MomentSet};
use crate::power_spectrum::{PsdEstimator, SpectrumEstimate};
use crate::types::{MonitorError, MonitorResult, Sample, SampleWindow};

// ------- Public types -------

/// The specific statistic that rejected a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    MeanOutOfRange,
    VarianceOutOfRange,
    SkewnessTooLarge,
    KurtosisOutOfRange,
    PeakOutOfBand,
    BandwidthTooNarrow,
    ExcessAutocorrelation,
    EntropyTooLow,
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Self::MeanOutOfRange => "mean out of range",
            Self::VarianceOutOfRange => "variance out of range",
            Self::SkewnessTooLarge => "skewness too large",
            Self::KurtosisOutOfRange => "kurtosis out of range",
            Self::PeakOutOfBand => "spectral peak out of band",
            Self::BandwidthTooNarrow => "spectral bandwidth too narrow",
            Self::ExcessAutocorrelation => "excess autocorrelation",
            Self::EntropyTooLow => "entropy too low",
        };
        f.write_str(text)
    }
}

/// Outcome of one health evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Pass,
    Fail(FailureReason),
}

impl Verdict {
    pub fn is_pass(&self) -> bool {
        matches!(self, Self::Pass)
    }

    pub fn failure(&self) -> Option<FailureReason> {
        match self {
            Self::Pass => None,
            Self::Fail(reason) => Some(*reason),
        }
    }
}

/// Compact spectral diagnostics kept in a [`HealthReport`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpectrumSummary {
    pub peak_bin: usize,
    /// Peak location as a fraction of the sampling rate.
    pub peak_fraction: f64,
    pub low_edge_bin: usize,
    pub high_edge_bin: usize,
    /// Band width as a fraction of the sampling rate.
    pub bandwidth_fraction: f64,
}

impl From<&SpectrumEstimate> for SpectrumSummary {
    fn from(s: &SpectrumEstimate) -> Self {
        Self {
            peak_bin: s.peak_bin,
            peak_fraction: s.peak_fraction,
            low_edge_bin: s.low_edge_bin,
            high_edge_bin: s.high_edge_bin,
            bandwidth_fraction: s.bandwidth_fraction,
        }
    }
}

/// Worst judged lag of the correlogram, at or beyond the start lag.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CorrelationSummary {
    pub worst_lag: usize,
    /// Exceedance score `|rho| * sqrt(N - lag)` at the worst lag.
    pub worst_score: f64,
    /// Normalized autocorrelation at the worst lag.
    pub worst_rho: f64,
}

/// Verdict plus the per-stage diagnostics that were actually computed.
///
/// A stage skipped by short-circuiting leaves its field `None`; the stage
/// that produced the failure keeps its diagnostics, so a report always
/// explains its own verdict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthReport {
    pub verdict: Verdict,
    pub moments: MomentSet,
    pub spectrum: Option<SpectrumSummary>,
    pub autocorrelation: Option<CorrelationSummary>,
    pub entropy: Option<EntropyEstimate>,
}

impl HealthReport {
    pub fn is_pass(&self) -> bool {
        self.verdict.is_pass()
    }

    pub fn failure(&self) -> Option<FailureReason> {
        self.verdict.failure()
    }
}

// ------- Monitor -------

/// Runtime health monitor bound to one calibration.
///
/// Owns the spectral estimator (FFT plan and scratch buffers are reused
/// across windows), so evaluation allocates only the sample-to-float
/// conversion and the per-stage result vectors.
pub struct HealthMonitor {
    config: MonitorConfig,
    psd: PsdEstimator,
    full_scale: Sample,
}

impl HealthMonitor {
    /// Build a monitor from a validated configuration.
    pub fn new(config: MonitorConfig) -> Result<Self, CalibrationError> {
        config.validate()?;
        let psd = PsdEstimator::new(config.window_len, config.window_function);
        let full_scale = config.full_scale();
        Ok(Self {
            config,
            psd,
            full_scale,
        })
    }

    /// The configuration this monitor was built with.
    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// Judge one window.
    ///
    /// Returns `Err` only on contract violations (wrong window length, a
    /// sample past ADC full scale); every statistical outcome, pass or
    /// fail, is an `Ok` report. Evaluating the same window twice yields
    /// the same report.
    pub fn evaluate(&mut self, window: &SampleWindow) -> MonitorResult<HealthReport> {
        if window.len() != self.config.window_len {
            return Err(MonitorError::WindowLengthMismatch {
                expected: self.config.window_len,
                actual: window.len(),
            });
        }
        if let Some((index, &value)) = window
            .iter()
            .enumerate()
            .find(|(_, &s)| s > self.full_scale)
        {
            return Err(MonitorError::SampleOutOfRange {
                index,
                value,
                full_scale: self.full_scale,
            });
        }

        let thresholds = &self.config.thresholds;
        let signal: Vec<f64> = window.iter().map(|&s| f64::from(s)).collect();

        let moments = signal_moments(&signal);
        debug!(
            mean = moments.mean,
            variance = moments.variance,
            skewness = moments.skewness,
            kurtosis = moments.kurtosis,
            "moment stage"
        );
        let mut report = HealthReport {
            verdict: Verdict::Pass,
            moments,
            spectrum: None,
            autocorrelation: None,
            entropy: None,
        };
        if let Some(reason) = check_moments(&moments, thresholds) {
            warn!(%reason, "window rejected at moment stage");
            report.verdict = Verdict::Fail(reason);
            return Ok(report);
        }

        let spectrum = self.psd.estimate(
            &signal,
            thresholds.psd_bandwidth_threshold,
            thresholds.psd_threshold_repetitions,
        );
        debug!(
            peak_bin = spectrum.peak_bin,
            peak_fraction = spectrum.peak_fraction,
            bandwidth_fraction = spectrum.bandwidth_fraction,
            "spectrum stage"
        );
        report.spectrum = Some(SpectrumSummary::from(&spectrum));
        if let Some(reason) = check_spectrum(&spectrum, thresholds) {
            warn!(%reason, "window rejected at spectrum stage");
            report.verdict = Verdict::Fail(reason);
            return Ok(report);
        }

        let correlogram = Correlogram::of_signal(&signal, self.config.autocorr_max_lag);
        report.autocorrelation =
            correlogram
                .worst_from(thresholds.autocorr_start_lag)
                .map(|(lag, score)| CorrelationSummary {
                    worst_lag: lag,
                    worst_score: score,
                    worst_rho: correlogram.rho[lag],
                });
        if let Some(summary) = &report.autocorrelation {
            debug!(
                worst_lag = summary.worst_lag,
                worst_score = summary.worst_score,
                "autocorrelation stage"
            );
        }
        if let Some(reason) = check_autocorrelation(&correlogram, thresholds) {
            warn!(%reason, "window rejected at autocorrelation stage");
            report.verdict = Verdict::Fail(reason);
            return Ok(report);
        }

        let entropy = estimate_entropy(window.as_slice(), self.config.adc_bits);
        debug!(
            shannon_bits = entropy.shannon_bits,
            occupied_bins = entropy.occupied_bins,
            "entropy stage"
        );
        report.entropy = Some(entropy);
        if let Some(reason) = check_entropy(&entropy, thresholds) {
            warn!(%reason, "window rejected at entropy stage");
            report.verdict = Verdict::Fail(reason);
            return Ok(report);
        }

        Ok(report)
    }
}

impl std::fmt::Debug for HealthMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HealthMonitor")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

// ------- Stage checks -------

/// Judge the moment stage. Checks run mean, variance, skewness, kurtosis
/// in that order; the first strict violation wins.
///
/// A degenerate window (variance below the numeric floor) is attributed to
/// variance outright, because its higher moments carry no information.
pub fn check_moments(m: &MomentSet, t: &ThresholdSet) -> Option<FailureReason> {
    if m.is_degenerate() {
        return Some(FailureReason::VarianceOutOfRange);
    }
    if m.mean < t.min_mean || m.mean > t.max_mean {
        return Some(FailureReason::MeanOutOfRange);
    }
    if m.variance < t.min_variance || m.variance > t.max_variance {
        return Some(FailureReason::VarianceOutOfRange);
    }
    if m.skewness.abs() > t.max_skewness {
        return Some(FailureReason::SkewnessTooLarge);
    }
    if m.kurtosis < t.min_kurtosis || m.kurtosis > t.max_kurtosis {
        return Some(FailureReason::KurtosisOutOfRange);
    }
    None
}

/// Judge the spectral stage: peak location first, then bandwidth.
pub fn check_spectrum(s: &SpectrumEstimate, t: &ThresholdSet) -> Option<FailureReason> {
    if s.peak_fraction < t.min_peak_frequency || s.peak_fraction > t.max_peak_frequency {
        return Some(FailureReason::PeakOutOfBand);
    }
    if s.bandwidth_fraction < t.min_bandwidth {
        return Some(FailureReason::BandwidthTooNarrow);
    }
    None
}

/// Judge the autocorrelation stage: the worst exceedance score at or
/// beyond the start lag must not exceed the threshold. Lags below the
/// start lag belong to the analog front end and are exempt.
pub fn check_autocorrelation(c: &Correlogram, t: &ThresholdSet) -> Option<FailureReason> {
    match c.worst_from(t.autocorr_start_lag) {
        Some((_, score)) if score > t.autocorr_threshold => {
            Some(FailureReason::ExcessAutocorrelation)
        }
        _ => None,
    }
}

/// Judge the entropy stage against the conservative floor.
pub fn check_entropy(e: &EntropyEstimate, t: &ThresholdSet) -> Option<FailureReason> {
    if e.shannon_bits < t.min_entropy_bits {
        return Some(FailureReason::EntropyTooLow);
    }
    None
}

// ===== Tests =====
