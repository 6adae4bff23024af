//! Filter stage: median → moving average → zero-phase bandpass.
//!
//! The median pass is skipped at frame rates too low to resolve the
//! fastest plausible beat, where a three-point median clips the crests.
//!
//! The bandpass is a pair of second-order sections (highpass then lowpass)
//! run forward and backward over the whole snapshot, so the output has no
//! phase lag and peak timing stays aligned with the input timestamps. All
//! coefficients are derived from the observed sample rate of the snapshot.

use std::f64::consts::{FRAC_1_SQRT_2, PI};

use fingerpulse_common::observed_sample_rate;
use fingerpulse_model::AcceptedPoint;
use serde::{Deserialize, Serialize};

use crate::stats;

/// Filter stage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Median filter window (odd).
    pub median_window: usize,

    /// Moving average window (odd).
    pub smoothing_window: usize,

    /// Bandpass lower edge in Hz (40 BPM).
    pub low_cut_hz: f64,

    /// Bandpass upper edge in Hz (200 BPM).
    pub high_cut_hz: f64,

    /// Minimum peak-to-peak range of the filtered signal.
    pub min_variation: f64,

    /// Samples per `high_cut_hz` period below which the median pass is
    /// skipped.
    pub median_min_samples_per_beat: f64,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            median_window: 3,
            smoothing_window: 3,
            low_cut_hz: 0.67,
            high_cut_hz: 3.3,
            min_variation: 0.08,
            median_min_samples_per_beat: 6.0,
        }
    }
}

/// Why the filter stage produced no signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterGap {
    /// Fewer than a handful of points.
    TooShort,
    /// Timestamps span no time, or the rate cannot hold the passband.
    UnknownSampleRate,
    /// Filtered range below `min_variation`.
    FlatSignal,
}

/// Band-limited waveform ready for estimation.
#[derive(Debug, Clone)]
pub struct FilteredSignal {
    pub values: Vec<f64>,

    /// Elapsed seconds of each value, same length as `values`.
    pub times: Vec<f64>,

    /// Observed sample rate in Hz.
    pub sample_rate: f64,
}

impl FilteredSignal {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Runs the three filters over a buffer snapshot.
#[derive(Debug, Clone)]
pub struct FilterStage {
    config: FilterConfig,
}

impl FilterStage {
    const MIN_POINTS: usize = 8;

    pub fn new(config: FilterConfig) -> Self {
        Self { config }
    }

    pub fn with_defaults() -> Self {
        Self::new(FilterConfig::default())
    }

    /// Whether the median pass runs at this sample rate.
    pub fn despikes_at(&self, sample_rate: f64) -> bool {
        sample_rate / self.config.high_cut_hz >= self.config.median_min_samples_per_beat
    }

    pub fn apply(&self, points: &[AcceptedPoint]) -> Result<FilteredSignal, FilterGap> {
        if points.len() < Self::MIN_POINTS {
            return Err(FilterGap::TooShort);
        }

        let first = points[0].elapsed_secs;
        let last = points[points.len() - 1].elapsed_secs;
        let sample_rate =
            observed_sample_rate(first, last, points.len()).ok_or(FilterGap::UnknownSampleRate)?;

        let raw: Vec<f64> = points.iter().map(|p| p.value).collect();
        let despiked = if self.despikes_at(sample_rate) {
            median_filter(&raw, self.config.median_window)
        } else {
            raw
        };
        let smoothed = moving_average(&despiked, self.config.smoothing_window);
        let values = bandpass(
            &smoothed,
            self.config.low_cut_hz,
            self.config.high_cut_hz,
            sample_rate,
        )
        .ok_or(FilterGap::UnknownSampleRate)?;

        let variation = stats::peak_to_peak(&values).unwrap_or(0.0);
        if variation < self.config.min_variation {
            tracing::debug!(variation, "Filtered signal too flat");
            return Err(FilterGap::FlatSignal);
        }

        Ok(FilteredSignal {
            values,
            times: points.iter().map(|p| p.elapsed_secs).collect(),
            sample_rate,
        })
    }

    pub fn config(&self) -> &FilterConfig {
        &self.config
    }
}

/// Centered running median; the window shrinks at the edges.
pub fn median_filter(values: &[f64], window: usize) -> Vec<f64> {
    if window <= 1 {
        return values.to_vec();
    }
    let half = window / 2;
    (0..values.len())
        .map(|i| {
            let start = i.saturating_sub(half);
            let end = (i + half + 1).min(values.len());
            stats::median(&values[start..end]).unwrap_or(values[i])
        })
        .collect()
}

/// Centered moving average; the window shrinks at the edges.
pub fn moving_average(values: &[f64], window: usize) -> Vec<f64> {
    if window <= 1 {
        return values.to_vec();
    }
    let half = window / 2;
    (0..values.len())
        .map(|i| {
            let start = i.saturating_sub(half);
            let end = (i + half + 1).min(values.len());
            let slice = &values[start..end];
            slice.iter().sum::<f64>() / slice.len() as f64
        })
        .collect()
}

/// Zero-phase bandpass. Removes the mean first so the highpass does not
/// have to swallow a large DC step at the start of the snapshot.
///
/// Returns `None` when `sample_rate` cannot represent the band.
pub fn bandpass(values: &[f64], low_hz: f64, high_hz: f64, sample_rate: f64) -> Option<Vec<f64>> {
    let nyquist_guard = 0.45 * sample_rate;
    let high_hz = high_hz.min(nyquist_guard);
    if !(sample_rate.is_finite() && low_hz > 0.0 && low_hz < high_hz) {
        return None;
    }

    let offset = stats::mean(values)?;
    let centered: Vec<f64> = values.iter().map(|v| v - offset).collect();

    let highpass = Biquad::highpass(low_hz, sample_rate);
    let lowpass = Biquad::lowpass(high_hz, sample_rate);
    let passed = highpass.filtfilt(&centered);
    Some(lowpass.filtfilt(&passed))
}

/// Second-order IIR section (RBJ cookbook, Butterworth Q).
#[derive(Debug, Clone, Copy)]
struct Biquad {
    b0: f64,
    b1: f64,
    b2: f64,
    a1: f64,
    a2: f64,
}

impl Biquad {
    fn lowpass(cutoff_hz: f64, sample_rate: f64) -> Self {
        let (cos_w0, alpha) = Self::prewarp(cutoff_hz, sample_rate);
        let b1 = 1.0 - cos_w0;
        Self::normalized(b1 / 2.0, b1, b1 / 2.0, cos_w0, alpha)
    }

    fn highpass(cutoff_hz: f64, sample_rate: f64) -> Self {
        let (cos_w0, alpha) = Self::prewarp(cutoff_hz, sample_rate);
        let b0 = (1.0 + cos_w0) / 2.0;
        Self::normalized(b0, -(1.0 + cos_w0), b0, cos_w0, alpha)
    }

    fn prewarp(cutoff_hz: f64, sample_rate: f64) -> (f64, f64) {
        let w0 = 2.0 * PI * cutoff_hz / sample_rate;
        (w0.cos(), w0.sin() * FRAC_1_SQRT_2)
    }

    fn normalized(b0: f64, b1: f64, b2: f64, cos_w0: f64, alpha: f64) -> Self {
        let a0 = 1.0 + alpha;
        Self {
            b0: b0 / a0,
            b1: b1 / a0,
            b2: b2 / a0,
            a1: -2.0 * cos_w0 / a0,
            a2: (1.0 - alpha) / a0,
        }
    }

    /// Direct form I, state starting at zero.
    fn run(&self, input: impl Iterator<Item = f64>) -> Vec<f64> {
        let (mut x1, mut x2, mut y1, mut y2) = (0.0, 0.0, 0.0, 0.0);
        input
            .map(|x| {
                let y = self.b0 * x + self.b1 * x1 + self.b2 * x2 - self.a1 * y1 - self.a2 * y2;
                x2 = x1;
                x1 = x;
                y2 = y1;
                y1 = y;
                y
            })
            .collect()
    }

    /// Forward pass then reverse pass.
    fn filtfilt(&self, values: &[f64]) -> Vec<f64> {
        let forward = self.run(values.iter().copied());
        let mut backward = self.run(forward.into_iter().rev());
        backward.reverse();
        backward
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine_points(freq_hz: f64, fs: f64, n: usize, offset: f64, amplitude: f64) -> Vec<AcceptedPoint> {
        (0..n)
            .map(|i| {
                let t = i as f64 / fs;
                AcceptedPoint::new(offset + amplitude * (2.0 * PI * freq_hz * t).sin(), t)
            })
            .collect()
    }

    fn rms(values: &[f64]) -> f64 {
        (values.iter().map(|v| v * v).sum::<f64>() / values.len() as f64).sqrt()
    }

    #[test]
    fn test_median_removes_isolated_spike() {
        let values = [1.0, 1.0, 50.0, 1.0, 1.0];
        assert_eq!(median_filter(&values, 3), vec![1.0; 5]);
    }

    #[test]
    fn test_moving_average_window_three() {
        let values = [0.0, 3.0, 6.0, 9.0];
        let smoothed = moving_average(&values, 3);
        assert_eq!(smoothed, vec![1.5, 3.0, 6.0, 7.5]);
    }

    #[test]
    fn test_passband_survives_and_baseline_drift_is_removed() {
        let fs = 30.0;
        let n = 300;
        let drift: Vec<f64> = (0..n).map(|i| 150.0 + 0.05 * i as f64).collect();
        let pulse = sine_points(1.2, fs, n, 0.0, 2.0);
        let combined: Vec<f64> = drift.iter().zip(&pulse).map(|(d, p)| d + p.value).collect();

        let out = bandpass(&combined, 0.67, 3.3, fs).unwrap();
        // Compare away from the edges, where forward-backward transients live.
        let core = &out[60..240];
        let expected: Vec<f64> = pulse[60..240].iter().map(|p| p.value).collect();
        let in_band = rms(&expected);
        let residual: Vec<f64> = core.iter().zip(&expected).map(|(a, b)| a - b).collect();
        assert!(rms(&residual) < 0.35 * in_band, "residual too large");
    }

    #[test]
    fn test_out_of_band_tone_is_attenuated() {
        let fs = 30.0;
        let tone = sine_points(8.0, fs, 300, 0.0, 2.0);
        let values: Vec<f64> = tone.iter().map(|p| p.value).collect();
        let out = bandpass(&values, 0.67, 3.3, fs).unwrap();
        assert!(rms(&out[60..240]) < 0.1 * rms(&values));
    }

    #[test]
    fn test_median_pass_depends_on_frame_rate() {
        let stage = FilterStage::with_defaults();
        assert!(stage.despikes_at(30.0));
        assert!(stage.despikes_at(24.0));
        assert!(!stage.despikes_at(15.0));
    }

    #[test]
    fn test_low_frame_rate_skips_median_pass() {
        // 197 BPM at 15 fps: under five samples per beat.
        let stage = FilterStage::with_defaults();
        let points = sine_points(197.0 / 60.0, 15.0, 195, 180.0, 4.0);
        let raw: Vec<f64> = points.iter().map(|p| p.value).collect();

        let signal = stage.apply(&points).unwrap();
        let expected = bandpass(&moving_average(&raw, 3), 0.67, 3.3, signal.sample_rate).unwrap();
        assert_eq!(signal.values, expected);
    }

    #[test]
    fn test_flat_signal_is_rejected() {
        let stage = FilterStage::with_defaults();
        let points: Vec<AcceptedPoint> = (0..240)
            .map(|i| AcceptedPoint::new(180.0, i as f64 / 30.0))
            .collect();
        assert_eq!(stage.apply(&points).unwrap_err(), FilterGap::FlatSignal);
    }

    #[test]
    fn test_zero_span_has_no_sample_rate() {
        let stage = FilterStage::with_defaults();
        let points: Vec<AcceptedPoint> = (0..20).map(|i| AcceptedPoint::new(i as f64, 0.0)).collect();
        assert_eq!(
            stage.apply(&points).unwrap_err(),
            FilterGap::UnknownSampleRate
        );
    }

    #[test]
    fn test_observed_rate_is_used() {
        let stage = FilterStage::with_defaults();
        let points = sine_points(1.2, 24.0, 240, 180.0, 3.0);
        let signal = stage.apply(&points).unwrap();
        assert!((signal.sample_rate - 24.0).abs() < 1e-6);
        assert_eq!(signal.len(), 240);
        assert_eq!(signal.times.len(), 240);
    }
}
