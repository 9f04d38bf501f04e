//! # Calibration and Monitor Configuration
//!
//! The acceptance bounds for every statistical test live in an immutable
//! [`ThresholdSet`] that is loaded once and injected into the monitor
//! rather than baked into the algorithms, so a hardware revision with
//! different resistors, gain, or filter corners recalibrates by shipping a
//! new record instead of new code.
//!
//! The default record reproduces the reference board's analog error budget:
//! each bound is derived from the nominal operating point by the worst-case
//! component tolerances, temperature spans, and statistical fluctuation
//! allowances documented on the fields below.
//!
//! ## Example Configuration
//!
//! ```yaml
//! window_len: 4096
//! adc_bits: 10
//! window_function: rectangular
//! autocorr_max_lag: 32
//! thresholds:
//!   min_entropy_bits: 6.21
//!   autocorr_threshold: 2.8
//! ```
//!
//! Fields omitted from the file keep their reference defaults.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::power_spectrum::WindowFunction;

/// Errors from loading or validating calibration data.
#[derive(Debug, thiserror::Error)]
pub enum CalibrationError {
    #[error("failed to read calibration file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse calibration YAML: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("invalid calibration: {0}")]
    Invalid(String),
}

// ------- Threshold record -------

/// Acceptance bounds for one hardware revision of the noise source.
///
/// All bounds are inclusive: a statistic exactly at a minimum or maximum
/// passes. Frequencies are fractions of the sampling rate; mean and
/// variance are in ADC counts and counts squared.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdSet {
    /// Nominal mean in ADC counts. Purely theoretical: the input divider
    /// uses equal resistors, so the signal should ride at mid-scale.
    pub central_mean: f64,
    /// Minimum acceptable mean. Derived from the nominal by the worst-case
    /// divider drop (two 5% resistors over a 45 K span at 100 ppm/K), 75
    /// counts of op-amp input offset referred through the gain of 40, and
    /// 8 counts of total ADC error.
    pub min_mean: f64,
    /// Maximum acceptable mean; the same allowances applied upward.
    pub max_mean: f64,
    /// Nominal variance in ADC counts squared. This was measured.
    pub central_variance: f64,
    /// Minimum acceptable variance. Factors below the nominal: Johnson
    /// noise power at 248 K instead of 293 K (0.846), worst-case gain-chain
    /// resistor tolerances (0.656), 8 sigma of estimator fluctuation at
    /// N = 4096 (0.798), and RC low-pass tolerance (0.709).
    pub min_variance: f64,
    /// Maximum acceptable variance. The high-side counterparts of the
    /// minimum's factors (1.154, 1.523, 1.253, 1.409) plus 2.5x of
    /// allowable additive interference. Addition is reversible and costs
    /// no entropy per sample; the cap exists to stop interference from
    /// driving the chain into saturation, which is not reversible.
    pub max_variance: f64,
    /// Maximum |skewness| in either direction, ~10 standard deviations
    /// from the theoretical 0 at N = 4096. This was measured.
    pub max_skewness: f64,
    /// Minimum excess kurtosis, ~10 standard deviations below 0.
    pub min_kurtosis: f64,
    /// Maximum excess kurtosis, ~5 standard deviations above 0. Not the
    /// negation of the minimum: the kurtosis estimator's own distribution
    /// is visibly skewed (~0.35) even at N = 4096.
    pub max_kurtosis: f64,
    /// Band-edge power threshold relative to the peak bin. Conventionally
    /// 0.5 (3 dB), but a single-window PSD estimate fluctuates about
    /// 1.7 dB per bin, and the reference source is susceptible to
    /// capacitively coupled peaks when handled, so the threshold sits far
    /// lower. Even this still catches real failure modes.
    pub psd_bandwidth_threshold: f64,
    /// Consecutive below-threshold bins required before a bin counts as a
    /// band edge. Larger values suppress false edges from single-bin
    /// fluctuations.
    pub psd_threshold_repetitions: usize,
    /// Minimum peak frequency as a fraction of the sampling rate; ~500 Hz
    /// at the reference clock, well below the high-pass cutoff.
    pub min_peak_frequency: f64,
    /// Maximum peak frequency as a fraction of the sampling rate; ~9 kHz
    /// at the reference clock, well above the low-pass cutoff.
    pub max_peak_frequency: f64,
    /// Minimum bandwidth as a fraction of the sampling rate. The measured
    /// 3 dB bandwidth of the reference source is about 4.5 kHz. Do not
    /// lower this for statistical fluctuation; the edge threshold and
    /// repetition count already absorb it.
    pub min_bandwidth: f64,
    /// First lag the autocorrelation threshold applies to. Ideal white
    /// noise would use 1, but the front-end filtering legitimately
    /// correlates the first few lags; estimated from an ensemble of
    /// measured correlograms.
    pub autocorr_start_lag: usize,
    /// Autocorrelation exceedance threshold, in units of the fluctuation
    /// an uncorrelated source shows (a multiple of the variance on the raw
    /// autocovariance scale). Tuned so the autocorrelation test trips on
    /// coupled interference at about the same level as the peak test.
    pub autocorr_threshold: f64,
    /// Minimum acceptable entropy estimate in bits per sample: 8 standard
    /// deviations (at N = 4096) below the estimator's mean on a Gaussian
    /// source with a standard deviation of 20, from Monte Carlo
    /// simulation.
    pub min_entropy_bits: f64,
}

impl Default for ThresholdSet {
    fn default() -> Self {
        let central_mean = 511.5;
        let central_variance = 1402.3;
        Self {
            central_mean,
            min_mean: 0.901 * central_mean - 75.0 - 8.0,
            max_mean: 1.109 * central_mean + 75.0 + 8.0,
            central_variance,
            min_variance: 0.846 * 0.656 * 0.798 * 0.709 * central_variance,
            max_variance: 1.154 * 1.523 * 1.253 * 1.409 * 2.5 * central_variance,
            max_skewness: 0.416,
            min_kurtosis: -0.83,
            max_kurtosis: 1.13,
            psd_bandwidth_threshold: 0.03,
            psd_threshold_repetitions: 5,
            min_peak_frequency: 0.0208,
            max_peak_frequency: 0.375,
            min_bandwidth: 0.1875,
            autocorr_start_lag: 7,
            autocorr_threshold: 2.8,
            min_entropy_bits: 6.21,
        }
    }
}

impl ThresholdSet {
    /// Check internal consistency of the bounds.
    pub fn validate(&self) -> Result<(), CalibrationError> {
        if self.min_mean > self.max_mean {
            return Err(CalibrationError::Invalid(format!(
                "min_mean {} exceeds max_mean {}",
                self.min_mean, self.max_mean
            )));
        }
        if self.min_variance > self.max_variance {
            return Err(CalibrationError::Invalid(format!(
                "min_variance {} exceeds max_variance {}",
                self.min_variance, self.max_variance
            )));
        }
        if self.min_variance < 0.0 {
            return Err(CalibrationError::Invalid(
                "min_variance must be non-negative".to_string(),
            ));
        }
        if self.max_skewness < 0.0 {
            return Err(CalibrationError::Invalid(
                "max_skewness is a magnitude bound and must be non-negative".to_string(),
            ));
        }
        if self.min_kurtosis > self.max_kurtosis {
            return Err(CalibrationError::Invalid(format!(
                "min_kurtosis {} exceeds max_kurtosis {}",
                self.min_kurtosis, self.max_kurtosis
            )));
        }
        if self.psd_bandwidth_threshold <= 0.0 || self.psd_bandwidth_threshold >= 1.0 {
            return Err(CalibrationError::Invalid(format!(
                "psd_bandwidth_threshold {} must lie in (0, 1)",
                self.psd_bandwidth_threshold
            )));
        }
        if self.psd_threshold_repetitions == 0 {
            return Err(CalibrationError::Invalid(
                "psd_threshold_repetitions must be at least 1".to_string(),
            ));
        }
        if !(0.0..=0.5).contains(&self.min_peak_frequency)
            || !(0.0..=0.5).contains(&self.max_peak_frequency)
            || self.min_peak_frequency > self.max_peak_frequency
        {
            return Err(CalibrationError::Invalid(format!(
                "peak frequency bounds [{}, {}] must be ordered fractions within [0, 0.5]",
                self.min_peak_frequency, self.max_peak_frequency
            )));
        }
        if !(0.0..=0.5).contains(&self.min_bandwidth) {
            return Err(CalibrationError::Invalid(format!(
                "min_bandwidth {} must be a fraction within [0, 0.5]",
                self.min_bandwidth
            )));
        }
        if self.autocorr_threshold <= 0.0 {
            return Err(CalibrationError::Invalid(
                "autocorr_threshold must be positive".to_string(),
            ));
        }
        if self.min_entropy_bits < 0.0 {
            return Err(CalibrationError::Invalid(
                "min_entropy_bits must be non-negative".to_string(),
            ));
        }
        Ok(())
    }
}

// ------- Monitor configuration -------

/// Structural configuration of the monitor plus the injected thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Samples per test window; a power of two sized for the FFT.
    pub window_len: usize,
    /// ADC resolution in bits; sizes the entropy histogram and the sample
    /// range check.
    pub adc_bits: u32,
    /// Window function applied before the spectral transform.
    pub window_function: WindowFunction,
    /// Correlogram length L (lags 0..L are computed, L much smaller than
    /// the window).
    pub autocorr_max_lag: usize,
    /// Acceptance bounds.
    pub thresholds: ThresholdSet,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            window_len: 4096,
            adc_bits: 10,
            window_function: WindowFunction::Rectangular,
            autocorr_max_lag: 32,
            thresholds: ThresholdSet::default(),
        }
    }
}

impl MonitorConfig {
    /// Load configuration from the default search path.
    ///
    /// Order: the `RNGMON_CONFIG` environment variable, then
    /// `./rngmon.yaml`, then built-in reference defaults. The result is
    /// validated before it is returned.
    pub fn load() -> Result<Self, CalibrationError> {
        if let Ok(path) = std::env::var("RNGMON_CONFIG") {
            if Path::new(&path).exists() {
                return Self::load_from(Path::new(&path));
            }
        }
        let local = Path::new("./rngmon.yaml");
        if local.exists() {
            return Self::load_from(local);
        }
        Ok(Self::default())
    }

    /// Load and validate configuration from a specific file.
    pub fn load_from(path: &Path) -> Result<Self, CalibrationError> {
        let content = std::fs::read_to_string(path).map_err(|source| CalibrationError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::parse(&content)?;
        tracing::debug!(path = %path.display(), "loaded monitor configuration");
        Ok(config)
    }

    /// Parse and validate configuration from a YAML string.
    pub fn parse(yaml: &str) -> Result<Self, CalibrationError> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to YAML.
    pub fn to_yaml(&self) -> Result<String, CalibrationError> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Save to a file.
    pub fn save(&self, path: &Path) -> Result<(), CalibrationError> {
        let content = self.to_yaml()?;
        std::fs::write(path, content).map_err(|source| CalibrationError::Io {
            path: path.display().to_string(),
            source,
        })
    }

    /// Check structural constraints and the threshold record.
    pub fn validate(&self) -> Result<(), CalibrationError> {
        if !self.window_len.is_power_of_two() || self.window_len < 16 {
            return Err(CalibrationError::Invalid(format!(
                "window_len {} must be a power of two of at least 16",
                self.window_len
            )));
        }
        if self.adc_bits == 0 || self.adc_bits > 16 {
            return Err(CalibrationError::Invalid(format!(
                "adc_bits {} must lie in 1..=16",
                self.adc_bits
            )));
        }
        if self.autocorr_max_lag == 0 || self.autocorr_max_lag > self.window_len / 2 {
            return Err(CalibrationError::Invalid(format!(
                "autocorr_max_lag {} must lie in 1..={}",
                self.autocorr_max_lag,
                self.window_len / 2
            )));
        }
        self.thresholds.validate()?;
        if self.thresholds.autocorr_start_lag >= self.autocorr_max_lag {
            return Err(CalibrationError::Invalid(format!(
                "autocorr_start_lag {} leaves no lags to test below autocorr_max_lag {}",
                self.thresholds.autocorr_start_lag, self.autocorr_max_lag
            )));
        }
        Ok(())
    }

    /// ADC full-scale code for the configured resolution.
    pub fn full_scale(&self) -> u16 {
        ((1u32 << self.adc_bits) - 1) as u16
    }

    /// Reference configuration rendered as YAML.
    pub fn example_yaml() -> String {
        serde_yaml::to_string(&Self::default()).unwrap_or_default()
    }
}

// ===== Tests =====
