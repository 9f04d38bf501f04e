//! Core types for HWRNG health monitoring
//!
//! This module defines the fundamental types shared by the statistical test
//! engine: raw ADC samples, the fixed-length test window they are collected
//! into, and the crate error type for contract violations.
//!
//! ## Signal chain
//!
//! The monitored source is thermal (Johnson-Nyquist) noise from a resistor,
//! amplified and band-limited before being digitized:
//!
//! ```text
//!   noise resistor --> amplifier --> band-pass filter --> ADC --> SampleWindow
//!       (~nV)           (x40)         (~0.5..9 kHz)     (10 bit)   (N samples)
//! ```
//!
//! One [`SampleWindow`] holds the samples for exactly one health evaluation.
//! Statistical out-of-tolerance conditions are *verdicts*, not errors; the
//! [`MonitorError`] type covers only programming-contract violations such as
//! handing the monitor a window of the wrong length.

use serde::{Deserialize, Serialize};

/// A single raw ADC reading.
///
/// The reference converter is 10 bit (0..=1023, mid-scale 511.5), but the
/// width is configuration-driven so recalibrated hardware with a different
/// converter keeps working.
pub type Sample = u16;

/// Result type for monitor operations.
pub type MonitorResult<T> = Result<T, MonitorError>;

/// Errors raised on contract violations, never on statistical failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MonitorError {
    #[error("Window length mismatch: monitor configured for {expected} samples, got {actual}")]
    WindowLengthMismatch { expected: usize, actual: usize },

    #[error("Sample window is empty")]
    EmptyWindow,

    #[error("Window length {0} is not a power of two")]
    WindowNotPowerOfTwo(usize),

    #[error("Sample {value} at index {index} exceeds ADC full scale {full_scale}")]
    SampleOutOfRange {
        index: usize,
        value: Sample,
        full_scale: Sample,
    },
}

/// One complete test window of raw ADC readings.
///
/// Invariants enforced at construction: non-empty, power-of-two length
/// (required by the spectral transform). The window is immutable once built;
/// the monitor only ever borrows it read-only, so evaluating the same window
/// twice yields the same verdict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleWindow {
    samples: Vec<Sample>,
}

impl SampleWindow {
    /// Build a window from raw ADC readings.
    ///
    /// Returns [`MonitorError::EmptyWindow`] for zero samples and
    /// [`MonitorError::WindowNotPowerOfTwo`] when the length cannot feed a
    /// radix-2 transform.
    pub fn new(samples: Vec<Sample>) -> MonitorResult<Self> {
        if samples.is_empty() {
            return Err(MonitorError::EmptyWindow);
        }
        if !samples.len().is_power_of_two() {
            return Err(MonitorError::WindowNotPowerOfTwo(samples.len()));
        }
        Ok(Self { samples })
    }

    /// Build a window by copying from a slice.
    pub fn from_slice(samples: &[Sample]) -> MonitorResult<Self> {
        Self::new(samples.to_vec())
    }

    /// Number of samples in the window.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Always false: empty windows cannot be constructed.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Borrow the raw readings.
    pub fn as_slice(&self) -> &[Sample] {
        &self.samples
    }

    /// Iterate over the raw readings.
    pub fn iter(&self) -> std::slice::Iter<'_, Sample> {
        self.samples.iter()
    }

    /// Consume the window and recover the sample storage.
    pub fn into_inner(self) -> Vec<Sample> {
        self.samples
    }

    /// Largest reading in the window.
    pub fn max_sample(&self) -> Sample {
        self.samples.iter().copied().max().unwrap_or(0)
    }
}

impl<'a> IntoIterator for &'a SampleWindow {
    type Item = &'a Sample;
    type IntoIter = std::slice::Iter<'a, Sample>;

    fn into_iter(self) -> Self::IntoIter {
        self.samples.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_accepts_power_of_two() {
        let w = SampleWindow::new(vec![512; 4096]).unwrap();
        assert_eq!(w.len(), 4096);
        assert!(!w.is_empty());
        assert_eq!(w.as_slice()[0], 512);
    }

    #[test]
    fn test_window_rejects_empty() {
        assert_eq!(
            SampleWindow::new(Vec::new()).unwrap_err(),
            MonitorError::EmptyWindow
        );
    }

    #[test]
    fn test_window_rejects_non_power_of_two() {
        assert_eq!(
            SampleWindow::new(vec![0; 1000]).unwrap_err(),
            MonitorError::WindowNotPowerOfTwo(1000)
        );
    }

    #[test]
    fn test_max_sample() {
        let w = SampleWindow::new(vec![1, 2, 1023, 7]).unwrap();
        assert_eq!(w.max_sample(), 1023);
    }

    #[test]
    fn test_error_display_names_lengths() {
        let err = MonitorError::WindowLengthMismatch {
            expected: 4096,
            actual: 1024,
        };
        let msg = err.to_string();
        assert!(msg.contains("4096") && msg.contains("1024"), "got: {msg}");
    }
}
