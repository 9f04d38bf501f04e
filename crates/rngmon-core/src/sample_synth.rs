//! Synthetic ADC Signal Generation
//!
//! Deterministic generators for the signals the monitor is tested and
//! demonstrated against: band-shaped Gaussian noise resembling a healthy
//! thermal source, pure tones standing in for coupled interference, lag
//! echoes for autocorrelation structure, and quantization of any of them
//! into real ADC sample windows with exact target mean and spread.
//!
//! Everything is seeded and reproducible; no OS randomness is involved, so
//! a failing fixture replays bit-for-bit.
//!
//! ## Band-shaped noise
//!
//! [`NoiseSynth::band_noise`] builds the signal in the frequency domain:
//! deterministic magnitudes on a Fejér-kernel envelope centered on the
//! requested frequency, random phases, inverse transform. Because only the
//! phases are random, the window's power spectrum and autocorrelation are
//! fixed by construction: the autocorrelation is triangular with support
//! strictly below `acf_support` lags and vanishes beyond it, which mirrors
//! how the real front-end filter correlates only the first few lags.
//!
//! ## Example
//!
//! ```rust
//! use rngmon_core::sample_synth::NoiseSynth;
//!
//! let mut synth = NoiseSynth::new(42);
//! let signal = synth.band_noise(4096, 0.18, 7);
//! let window = rngmon_core::sample_synth::to_adc_window(&signal, 511.5, 37.45, 1023).unwrap();
//! assert_eq!(window.len(), 4096);
//! ```

use std::f64::consts::PI;

use num_complex::Complex64;
use rustfft::FftPlanner;

use crate::types::{MonitorResult, Sample, SampleWindow};

// ------- Generator -------

/// Seeded signal generator.
#[derive(Debug, Clone)]
pub struct NoiseSynth {
    /// xorshift64 PRNG state
    rng_state: u64,
}

impl NoiseSynth {
    /// Create a generator from a seed (0 is remapped; xorshift cannot leave
    /// the all-zero state).
    pub fn new(seed: u64) -> Self {
        Self {
            rng_state: seed.max(1),
        }
    }

    /// Uniform random [0, 1)
    pub fn uniform(&mut self) -> f64 {
        self.rng_state ^= self.rng_state << 13;
        self.rng_state ^= self.rng_state >> 7;
        self.rng_state ^= self.rng_state << 17;
        (self.rng_state as f64) / (u64::MAX as f64)
    }

    /// Standard Gaussian sample via the Box-Muller transform.
    pub fn gaussian(&mut self) -> f64 {
        let u1 = self.uniform();
        let u2 = self.uniform();
        let r = (-2.0 * u1.max(1e-30).ln()).sqrt();
        r * (2.0 * PI * u2).cos()
    }

    /// White Gaussian noise, zero mean, unit variance.
    pub fn white(&mut self, n: usize) -> Vec<f64> {
        (0..n).map(|_| self.gaussian()).collect()
    }

    /// Band-shaped Gaussian noise of length `n` (a power of two), zero
    /// mean, centered on `center` (fraction of the sampling rate).
    ///
    /// The spectral envelope is a Fejér kernel of order `acf_support`
    /// shifted to `center`, so the signal's autocorrelation is triangular
    /// over lags `1..acf_support` and zero at every longer lag. Amplitude
    /// scale is arbitrary; pass the result through [`to_adc_window`] to
    /// place the moments.
    ///
    /// # Panics
    ///
    /// Panics if `n` is not a power of two or `acf_support` is zero.
    pub fn band_noise(&mut self, n: usize, center: f64, acf_support: usize) -> Vec<f64> {
        assert!(
            n.is_power_of_two() && n >= 16,
            "band_noise length must be a power of two of at least 16"
        );
        assert!(acf_support >= 1, "acf_support must be at least 1");

        let mut spectrum = vec![Complex64::new(0.0, 0.0); n];
        let half = n / 2;
        for (k, slot) in spectrum.iter_mut().enumerate().take(half).skip(1) {
            let f = k as f64 / n as f64;
            let s = 0.5 * (fejer(f - center, acf_support) + fejer(f + center, acf_support));
            let phase = 2.0 * PI * self.uniform();
            *slot = Complex64::from_polar(s.sqrt(), phase);
        }
        // Hermitian mirror so the inverse transform comes out real; DC and
        // Nyquist stay zero to keep the signal mean-free.
        for k in 1..half {
            spectrum[n - k] = spectrum[k].conj();
        }

        let mut planner = FftPlanner::new();
        let ifft = planner.plan_fft_inverse(n);
        ifft.process(&mut spectrum);
        spectrum.iter().map(|c| c.re).collect()
    }
}

// ------- Convenience functions -------

/// Fejér kernel of order `m` at frequency offset `nu` (cycles per sample).
///
/// Non-negative, peak `m` at `nu = 0`, first zero at `1/m`. This is the
/// power spectrum of a triangular autocorrelation with support `m`.
pub fn fejer(nu: f64, m: usize) -> f64 {
    let denom = (PI * nu).sin();
    if denom.abs() < 1e-12 {
        return m as f64;
    }
    let ratio = (PI * m as f64 * nu).sin() / denom;
    ratio * ratio / m as f64
}

/// Pure sine at `fraction` of the sampling rate, unit amplitude.
pub fn tone(n: usize, fraction: f64, phase: f64) -> Vec<f64> {
    (0..n)
        .map(|i| (2.0 * PI * fraction * i as f64 + phase).sin())
        .collect()
}

/// Add a delayed copy of the signal onto itself: `y[i] = x[i] + strength * x[i - lag]`.
///
/// Injects autocorrelation of roughly `strength / (1 + strength^2)` at
/// `lag` while leaving the broadband character intact.
pub fn add_lag_echo(signal: &[f64], lag: usize, strength: f64) -> Vec<f64> {
    signal
        .iter()
        .enumerate()
        .map(|(i, &x)| {
            if i >= lag {
                x + strength * signal[i - lag]
            } else {
                x
            }
        })
        .collect()
}

/// Blend two signals with the given power split (`weight` on `a`,
/// `1 - weight` on `b`); inputs are normalized to unit variance first.
pub fn mix_by_power(a: &[f64], b: &[f64], weight: f64) -> Vec<f64> {
    assert_eq!(a.len(), b.len(), "mix inputs must have equal length");
    let na = normalize_signal(a);
    let nb = normalize_signal(b);
    let (wa, wb) = (weight.sqrt(), (1.0 - weight).sqrt());
    na.iter().zip(&nb).map(|(x, y)| wa * x + wb * y).collect()
}

/// Shift and scale to zero mean, unit variance. A degenerate (constant)
/// input comes back as all zeros.
pub fn normalize_signal(signal: &[f64]) -> Vec<f64> {
    let n = signal.len();
    if n == 0 {
        return Vec::new();
    }
    let mean = signal.iter().sum::<f64>() / n as f64;
    let var = signal.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n as f64;
    if var < 1e-30 {
        return vec![0.0; n];
    }
    let inv_sd = 1.0 / var.sqrt();
    signal.iter().map(|x| (x - mean) * inv_sd).collect()
}

/// Quantize a real-valued signal into an ADC sample window with the target
/// mean and standard deviation, clamped to `full_scale`.
///
/// The signal is renormalized first, so the realized moments land on the
/// targets to within rounding (about ±0.01 count of mean, +1/12 count² of
/// variance).
pub fn to_adc_window(
    signal: &[f64],
    mean: f64,
    std_dev: f64,
    full_scale: Sample,
) -> MonitorResult<SampleWindow> {
    let normalized = normalize_signal(signal);
    let samples: Vec<Sample> = normalized
        .iter()
        .map(|z| (mean + std_dev * z).round().clamp(0.0, f64::from(full_scale)) as Sample)
        .collect();
    SampleWindow::new(samples)
}

// ===== Tests =====

#[cfg(test)]
mod tests {
    use super::*;
    use crate::autocorrelation::Correlogram;
    use crate::moment_stats::signal_moments;
    use crate::power_spectrum::{PsdEstimator, WindowFunction};
    use approx::assert_relative_eq;

    #[test]
    fn test_same_seed_reproduces() {
        let a = NoiseSynth::new(7).band_noise(1024, 0.2, 7);
        let b = NoiseSynth::new(7).band_noise(1024, 0.2, 7);
        assert_eq!(a, b);
        let c = NoiseSynth::new(8).band_noise(1024, 0.2, 7);
        assert_ne!(a, c);
    }

    #[test]
    fn test_white_noise_moments() {
        let signal = NoiseSynth::new(0xDEAD_BEEF).white(16384);
        let m = signal_moments(&signal);
        assert!(m.mean.abs() < 0.05, "white mean: {}", m.mean);
        assert_relative_eq!(m.variance, 1.0, max_relative = 0.05);
        assert!(m.kurtosis.abs() < 0.2, "white kurtosis: {}", m.kurtosis);
    }

    #[test]
    fn test_band_noise_peak_sits_on_center() {
        let n = 4096;
        let signal = NoiseSynth::new(11).band_noise(n, 0.18, 7);
        let mut psd = PsdEstimator::new(n, WindowFunction::Rectangular);
        let spectrum = psd.estimate(&signal, 0.03, 5);
        let expected = (0.18 * n as f64).round() as usize;
        assert!(
            spectrum.peak_bin.abs_diff(expected) <= 2,
            "peak bin {} not near {}",
            spectrum.peak_bin,
            expected
        );
    }

    #[test]
    fn test_band_noise_correlation_confined_to_support() {
        let signal = NoiseSynth::new(13).band_noise(4096, 0.18, 7);
        let c = Correlogram::of_signal(&signal, 32);
        assert!(c.rho[1].abs() > 0.15, "in-support lag should correlate: {}", c.rho[1]);
        for k in 7..32 {
            assert!(
                c.rho[k].abs() < 0.02,
                "lag {k} beyond ACF support should vanish, got {}",
                c.rho[k]
            );
        }
    }

    #[test]
    fn test_lag_echo_lands_at_requested_lag() {
        let base = NoiseSynth::new(17).white(4096);
        let echoed = add_lag_echo(&base, 9, 0.5);
        let c = Correlogram::of_signal(&echoed, 16);
        assert!(
            (c.rho[9] - 0.4).abs() < 0.05,
            "echo rho at lag 9: {} (expected ~0.4)",
            c.rho[9]
        );
    }

    #[test]
    fn test_tone_spectrum() {
        let n = 1024;
        let signal = tone(n, 50.0 / n as f64, 0.0);
        let mut psd = PsdEstimator::new(n, WindowFunction::Rectangular);
        let spectrum = psd.estimate(&signal, 0.03, 5);
        assert_eq!(spectrum.peak_bin, 50);
    }

    #[test]
    fn test_to_adc_window_places_moments() {
        let signal = NoiseSynth::new(23).band_noise(4096, 0.18, 7);
        let window = to_adc_window(&signal, 511.5, 37.45, 1023).unwrap();
        let m = crate::moment_stats::window_moments(&window);
        assert!((m.mean - 511.5).abs() < 0.1, "mean {}", m.mean);
        assert_relative_eq!(m.variance, 37.45 * 37.45, max_relative = 0.01);
        assert!(window.max_sample() <= 1023);
    }

    #[test]
    fn test_to_adc_window_clamps() {
        // Target spread far beyond full scale: samples must clamp, not wrap.
        let signal = NoiseSynth::new(29).white(1024);
        let window = to_adc_window(&signal, 512.0, 5000.0, 1023).unwrap();
        assert!(window.iter().all(|&s| s <= 1023));
    }

    #[test]
    fn test_mix_by_power_weights() {
        let a = NoiseSynth::new(31).white(4096);
        let b = tone(4096, 0.1, 0.0);
        let mixed = mix_by_power(&a, &b, 0.25);
        let m = signal_moments(&mixed);
        // Unit-variance inputs with a convex power split stay near unit
        // variance when the inputs are uncorrelated.
        assert_relative_eq!(m.variance, 1.0, max_relative = 0.1);
    }

    #[test]
    fn test_normalize_degenerate() {
        assert!(normalize_signal(&[5.0; 64]).iter().all(|&x| x == 0.0));
    }

    #[test]
    fn test_fejer_kernel_shape() {
        assert_relative_eq!(fejer(0.0, 7), 7.0, epsilon = 1e-12);
        assert!(fejer(1.0 / 7.0, 7) < 1e-20, "first null of the order-7 kernel");
        assert!(fejer(0.05, 7) > 0.0);
    }
}
