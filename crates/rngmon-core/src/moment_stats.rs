//! Running Moment Statistics
//!
//! Single-pass accumulation of the first four central moments of a sample
//! window, finalized into mean, variance, standardized skewness and excess
//! kurtosis. These are the cheapest health statistics and run first in the
//! test pipeline: a disconnected input (flat line), a saturated amplifier
//! (clipped tails) or a swapped-in deterministic signal all show up here
//! before any spectral work is spent.
//!
//! The accumulator uses the Welford-style update for higher moments rather
//! than raw power sums. With sample magnitudes around 512 and thousands of
//! samples per window, `sum(x^4)` grows past 2^52 and naive accumulation
//! loses exactly the low-order bits the kurtosis lives in.
//!
//! ## Example
//!
//! ```rust
//! use rngmon_core::moment_stats::MomentAccumulator;
//!
//! let mut acc = MomentAccumulator::new();
//! for x in [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0] {
//!     acc.push(x);
//! }
//! let m = acc.finalize();
//! assert!((m.mean - 5.0).abs() < 1e-12);
//! assert!((m.variance - 4.0).abs() < 1e-12);
//! ```

use serde::{Deserialize, Serialize};

use crate::types::{Sample, SampleWindow};

/// Variance below this is treated as degenerate: skewness and kurtosis are
/// undefined and the health judge forces a variance failure instead of
/// dividing by zero. Integer ADC windows with any two differing codes have
/// variance of at least ~1/N, far above this floor.
pub const VARIANCE_EPSILON: f64 = 1e-9;

// ------- Public types -------

/// First four standardized moments of one sample window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MomentSet {
    /// Arithmetic mean in ADC units.
    pub mean: f64,
    /// Population variance (normalized by N) in ADC units squared.
    pub variance: f64,
    /// Standardized skewness (dimensionless, symmetric = 0).
    pub skewness: f64,
    /// Excess kurtosis (dimensionless, Gaussian = 0).
    pub kurtosis: f64,
}

impl MomentSet {
    /// True when the variance is too small for skewness/kurtosis to mean
    /// anything.
    pub fn is_degenerate(&self) -> bool {
        self.variance < VARIANCE_EPSILON
    }
}

/// Single-pass accumulator for the first four central moments.
///
/// Push samples one at a time, then [`finalize`](Self::finalize). The update
/// keeps running central sums `m2..m4` so no large-magnitude cancellation
/// occurs regardless of the DC offset of the input.
#[derive(Debug, Clone, Default)]
pub struct MomentAccumulator {
    n: u64,
    mean: f64,
    m2: f64,
    m3: f64,
    m4: f64,
}

impl MomentAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of samples accumulated so far.
    pub fn count(&self) -> u64 {
        self.n
    }

    /// Fold one sample into the running moments.
    pub fn push(&mut self, x: f64) {
        self.n += 1;
        let n = self.n as f64;
        let delta = x - self.mean;
        let delta_n = delta / n;
        let delta_n2 = delta_n * delta_n;
        let term1 = delta * delta_n * (n - 1.0);

        self.mean += delta_n;
        // m4 and m3 must be updated before m2: their increments read the
        // previous lower-order sums.
        self.m4 += term1 * delta_n2 * (n * n - 3.0 * n + 3.0) + 6.0 * delta_n2 * self.m2
            - 4.0 * delta_n * self.m3;
        self.m3 += term1 * delta_n * (n - 2.0) - 3.0 * delta_n * self.m2;
        self.m2 += term1;
    }

    /// Finalize into standardized statistics.
    ///
    /// With fewer than one sample all fields are zero. On a degenerate
    /// window (vanishing `m2`) skewness and kurtosis report 0.0; the health
    /// judge rejects such windows on the variance bound before either value
    /// is consulted.
    pub fn finalize(&self) -> MomentSet {
        if self.n == 0 {
            return MomentSet {
                mean: 0.0,
                variance: 0.0,
                skewness: 0.0,
                kurtosis: 0.0,
            };
        }
        let n = self.n as f64;
        let variance = self.m2 / n;
        if self.m2 < 1e-30 {
            return MomentSet {
                mean: self.mean,
                variance,
                skewness: 0.0,
                kurtosis: 0.0,
            };
        }
        MomentSet {
            mean: self.mean,
            variance,
            skewness: n.sqrt() * self.m3 / (self.m2 * self.m2.sqrt()),
            kurtosis: n * self.m4 / (self.m2 * self.m2) - 3.0,
        }
    }
}

// ------- Convenience functions -------

/// Moments of one ADC sample window.
pub fn window_moments(window: &SampleWindow) -> MomentSet {
    samples_moments(window.as_slice())
}

/// Moments of a raw ADC sample slice.
pub fn samples_moments(samples: &[Sample]) -> MomentSet {
    let mut acc = MomentAccumulator::new();
    for &s in samples {
        acc.push(f64::from(s));
    }
    acc.finalize()
}

/// Moments of a real-valued signal (used by synthetic-signal tooling).
pub fn signal_moments(signal: &[f64]) -> MomentSet {
    let mut acc = MomentAccumulator::new();
    for &x in signal {
        acc.push(x);
    }
    acc.finalize()
}

// ===== Tests =====
