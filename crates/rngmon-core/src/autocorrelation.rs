//! Lagged Autocorrelation Health Test
//!
//! Computes the normalized autocorrelation of a sample window at short lags
//! and standardizes each lag into an exceedance score. Periodic interference
//! that is too weak or too spread out to trip the spectral peak test still
//! shows up as correlation mass at a repeating lag, so this test is the
//! pipeline's defense against capacitively coupled mains/switching noise.
//!
//! The analog front end band-limits the noise before the ADC, which makes
//! the first few lags legitimately correlated. Those lags are exempted via
//! the calibration start lag rather than tightening the threshold for all
//! lags.
//!
//! ## Scoring
//!
//! For a window of length N with normalized autocorrelation `rho[k]`, the
//! score at lag k is `|rho[k]| * sqrt(N - k)`: the magnitude of the raw
//! autocovariance measured in the standard-fluctuation units of an ideal
//! uncorrelated source (variance * sqrt(N - k)). A healthy window keeps all
//! scored lags within a small single-digit multiple; the calibration
//! threshold is 2.8.
//!
//! ## Example
//!
//! ```rust
//! use rngmon_core::autocorrelation::Correlogram;
//!
//! let signal: Vec<f64> = (0..1024).map(|i| (i % 2) as f64).collect();
//! let c = Correlogram::of_signal(&signal, 8);
//! assert!(c.rho[2] > 0.9); // period-2 signal repeats at even lags
//! ```

use serde::{Deserialize, Serialize};

// ------- Public types -------

/// Normalized autocorrelation of one window plus per-lag exceedance scores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Correlogram {
    /// `rho[k]` for lag k in `0..max_lag`; `rho[0] == 1`.
    pub rho: Vec<f64>,
    /// `|rho[k]| * sqrt(N - k)` per lag.
    pub scores: Vec<f64>,
}

impl Correlogram {
    /// Autocorrelate a real-valued signal at lags `0..max_lag`.
    ///
    /// The signal mean is removed first and the biased (1/N) autocovariance
    /// is normalized by its zero-lag value, so the result is invariant to
    /// DC offset and amplitude scaling. A degenerate (constant) signal
    /// reports `rho[0] = 1` and zero elsewhere.
    ///
    /// # Panics
    ///
    /// Panics if `max_lag` exceeds the signal length.
    pub fn of_signal(signal: &[f64], max_lag: usize) -> Self {
        assert!(
            max_lag <= signal.len(),
            "max_lag {} exceeds signal length {}",
            max_lag,
            signal.len()
        );
        let rho = autocorrelate(signal, max_lag);
        let scores = exceedance_scores(&rho, signal.len());
        Self { rho, scores }
    }

    /// Worst (largest) score at or beyond `start_lag`.
    ///
    /// Returns `(lag, score)`, or `None` when `start_lag` is past the end
    /// of the correlogram.
    pub fn worst_from(&self, start_lag: usize) -> Option<(usize, f64)> {
        self.scores
            .iter()
            .enumerate()
            .skip(start_lag)
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(lag, &score)| (lag, score))
    }
}

// ------- Convenience functions -------

/// Normalized autocorrelation `rho[k]` for lags `0..max_lag`.
///
/// Returns an empty vector for an empty signal or `max_lag == 0`.
pub fn autocorrelate(signal: &[f64], max_lag: usize) -> Vec<f64> {
    let n = signal.len();
    if n == 0 || max_lag == 0 {
        return Vec::new();
    }

    let mean = signal.iter().sum::<f64>() / n as f64;
    let centered: Vec<f64> = signal.iter().map(|x| x - mean).collect();

    let r0: f64 = centered.iter().map(|d| d * d).sum::<f64>() / n as f64;
    let mut rho = vec![0.0; max_lag.min(n)];
    rho[0] = 1.0;
    if r0 < 1e-30 {
        // Constant signal: no structure to report beyond lag 0.
        return rho;
    }

    for (k, r) in rho.iter_mut().enumerate().skip(1) {
        let sum: f64 = centered[..n - k]
            .iter()
            .zip(&centered[k..])
            .map(|(a, b)| a * b)
            .sum();
        *r = (sum / n as f64) / r0;
    }
    rho
}

/// Standardized exceedance score per lag: `|rho[k]| * sqrt(n - k)`.
pub fn exceedance_scores(rho: &[f64], n: usize) -> Vec<f64> {
    rho.iter()
        .enumerate()
        .map(|(k, r)| r.abs() * ((n.saturating_sub(k)) as f64).sqrt())
        .collect()
}

// ===== Tests =====

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    fn white_noise(n: usize, mut state: u64) -> Vec<f64> {
        (0..n)
            .map(|_| {
                state ^= state << 13;
                state ^= state >> 7;
                state ^= state << 17;
                (state as f64) / (u64::MAX as f64) - 0.5
            })
            .collect()
    }

    #[test]
    fn test_zero_lag_is_one() {
        let signal = white_noise(1024, 42);
        let rho = autocorrelate(&signal, 16);
        assert_eq!(rho.len(), 16);
        assert_relative_eq!(rho[0], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_white_noise_scores_stay_small() {
        let signal = white_noise(4096, 0xDEAD_BEEF_CAFE_BABE);
        let c = Correlogram::of_signal(&signal, 32);
        for (k, &score) in c.scores.iter().enumerate().skip(1) {
            assert!(score < 5.0, "white noise score at lag {k} too large: {score}");
        }
    }

    #[test]
    fn test_cosine_matches_damped_cosine() {
        // Full-period cosine: biased-estimator autocorrelation follows
        // (1 - k/N) cos(2 pi f k) up to edge leakage.
        let n = 256;
        let f = 1.0 / 16.0;
        let signal: Vec<f64> = (0..n).map(|i| (2.0 * PI * f * i as f64).cos()).collect();
        let rho = autocorrelate(&signal, 24);
        let expect = |k: usize| (1.0 - k as f64 / n as f64) * (2.0 * PI * f * k as f64).cos();
        for k in [4usize, 8, 16] {
            assert!(
                (rho[k] - expect(k)).abs() < 0.05,
                "lag {k}: rho {} vs expected {}",
                rho[k],
                expect(k)
            );
        }
    }

    #[test]
    fn test_constant_signal_no_nan() {
        let rho = autocorrelate(&[3.0; 512], 8);
        assert_relative_eq!(rho[0], 1.0, epsilon = 1e-12);
        for &r in &rho[1..] {
            assert_eq!(r, 0.0);
        }
    }

    #[test]
    fn test_offset_and_scale_invariance() {
        let base = white_noise(2048, 7);
        let shifted: Vec<f64> = base.iter().map(|x| 511.5 + 40.0 * x).collect();
        let a = autocorrelate(&base, 16);
        let b = autocorrelate(&shifted, 16);
        for k in 0..16 {
            assert_relative_eq!(a[k], b[k], epsilon = 1e-9);
        }
    }

    #[test]
    fn test_lag3_echo_dominates_worst_score() {
        // MA(1)-style echo at lag 3: rho[3] ~= 0.5/1.25 = 0.4.
        let e = white_noise(4096, 0x5EED_5EED);
        let signal: Vec<f64> = (0..e.len())
            .map(|i| e[i] + if i >= 3 { 0.5 * e[i - 3] } else { 0.0 })
            .collect();
        let c = Correlogram::of_signal(&signal, 32);

        let (lag, score) = c.worst_from(1).unwrap();
        assert_eq!(lag, 3, "echo lag should carry the worst score");
        assert!(score > 20.0, "echo score unexpectedly weak: {score}");

        // Beyond the echo lag the signal is white again.
        let (_, tail_score) = c.worst_from(7).unwrap();
        assert!(tail_score < 5.0, "tail score too large: {tail_score}");
    }

    #[test]
    fn test_worst_from_past_end() {
        let c = Correlogram::of_signal(&white_noise(256, 9), 8);
        assert!(c.worst_from(8).is_none());
    }
}
