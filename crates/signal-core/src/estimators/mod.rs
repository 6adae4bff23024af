//! Frequency estimators.
//!
//! Three independent ways of turning a filtered waveform into BPM:
//! - [`autocorrelation`]: strongest self-similarity lag
//! - [`spectral`]: dominant bin of a Hann-windowed power spectrum
//! - [`peak_interval`]: median spacing of detected pulse peaks, in timestamps
//!
//! Each returns `None` rather than an out-of-range value.

pub mod autocorrelation;
pub mod peak_interval;
pub mod spectral;

use fingerpulse_model::{Bpm, BpmEstimate, EstimationMethod};
use serde::{Deserialize, Serialize};

use crate::filters::FilteredSignal;

/// Shared estimator bounds and tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimatorConfig {
    /// Lowest plausible rate.
    pub min_bpm: Bpm,

    /// Highest plausible rate.
    pub max_bpm: Bpm,

    /// Peaks required by the peak-interval estimator.
    pub min_peaks: usize,

    /// Shortest inter-peak interval kept (seconds).
    pub min_interval_secs: f64,

    /// Longest inter-peak interval kept (seconds).
    pub max_interval_secs: f64,

    /// Minimum peak separation as a fraction of the sample rate.
    pub peak_distance_factor: f64,

    /// IQR multiplier for interval trimming.
    pub iqr_k: f64,

    /// Minimum FFT length; the signal is zero-padded up to this.
    pub fft_min_len: usize,

    /// An autocorrelation peak at a half or third of the strongest lag is
    /// taken as the true period when at least this fraction of its height.
    pub subharmonic_ratio: f64,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            min_bpm: 40,
            max_bpm: 200,
            min_peaks: 3,
            min_interval_secs: 0.3,
            max_interval_secs: 1.5,
            peak_distance_factor: 0.3,
            iqr_k: 1.5,
            fft_min_len: 2048,
            subharmonic_ratio: 0.5,
        }
    }
}

impl EstimatorConfig {
    /// Round `bpm` and keep it only when inside `[min_bpm, max_bpm]`.
    pub fn plausible(&self, bpm: f64) -> Option<Bpm> {
        if !bpm.is_finite() {
            return None;
        }
        let rounded = bpm.round() as Bpm;
        (self.min_bpm..=self.max_bpm).contains(&rounded).then_some(rounded)
    }

    fn min_hz(&self) -> f64 {
        self.min_bpm as f64 / 60.0
    }

    fn max_hz(&self) -> f64 {
        self.max_bpm as f64 / 60.0
    }
}

/// Per-cycle output of all three estimators.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EstimateSet {
    pub autocorrelation: Option<Bpm>,
    pub spectral: Option<Bpm>,
    pub peak_interval: Option<Bpm>,
}

impl EstimateSet {
    /// Run every estimator on `signal`.
    pub fn estimate(signal: &FilteredSignal, config: &EstimatorConfig) -> Self {
        Self {
            autocorrelation: autocorrelation::estimate(signal, config),
            spectral: spectral::estimate(signal, config),
            peak_interval: peak_interval::estimate(signal, config),
        }
    }

    /// Present estimates tagged with their method.
    pub fn to_estimates(&self) -> Vec<BpmEstimate> {
        [
            (self.autocorrelation, EstimationMethod::Autocorrelation),
            (self.spectral, EstimationMethod::Spectral),
            (self.peak_interval, EstimationMethod::PeakInterval),
        ]
        .into_iter()
        .filter_map(|(value, method)| value.map(|v| BpmEstimate::new(v, method)))
        .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.autocorrelation.is_none() && self.spectral.is_none() && self.peak_interval.is_none()
    }
}

/// Vertex offset of the parabola through three equally spaced points,
/// in `[-0.5, 0.5]` relative to the middle one.
pub(crate) fn parabolic_offset(left: f64, center: f64, right: f64) -> f64 {
    let denom = left - 2.0 * center + right;
    if denom.abs() < f64::EPSILON {
        return 0.0;
    }
    (0.5 * (left - right) / denom).clamp(-0.5, 0.5)
}

/// Vertex offset and height of the sinusoid `A·cos(ω(k - d))` through three
/// equally spaced samples of a local maximum.
///
/// Exact for sampled tones, which matters when a beat spans only four or
/// five samples and a parabola badly underestimates the peak. Falls back
/// to the parabola when the samples do not fit a cosine.
pub(crate) fn cosine_peak(left: f64, center: f64, right: f64) -> (f64, f64) {
    if center > 0.0 {
        let cos_w = (left + right) / (2.0 * center);
        if cos_w > -1.0 && cos_w < 1.0 {
            let w = cos_w.acos();
            let quadrature = (right - left) / (2.0 * w.sin());
            let offset = quadrature.atan2(center) / w;
            if offset.abs() <= 0.5 {
                return (offset, quadrature.hypot(center));
            }
        }
    }
    let offset = parabolic_offset(left, center, right);
    (offset, center - 0.25 * (left - right) * offset)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plausible_bounds() {
        let config = EstimatorConfig::default();
        assert_eq!(config.plausible(72.4), Some(72));
        assert_eq!(config.plausible(39.4), None);
        assert_eq!(config.plausible(200.4), Some(200));
        assert_eq!(config.plausible(f64::NAN), None);
    }

    #[test]
    fn test_parabolic_offset_finds_vertex() {
        // y = -(x - 0.25)^2 sampled at -1, 0, 1
        let f = |x: f64| -(x - 0.25).powi(2);
        let offset = parabolic_offset(f(-1.0), f(0.0), f(1.0));
        assert!((offset - 0.25).abs() < 1e-12);
        assert_eq!(parabolic_offset(1.0, 1.0, 1.0), 0.0);
    }

    #[test]
    fn test_cosine_peak_is_exact_for_coarse_tones() {
        // 4.6 samples per cycle, true crest 0.3 samples right of the middle.
        let w = 2.0 * std::f64::consts::PI / 4.6;
        let f = |k: f64| 0.8 * (w * (k - 0.3)).cos();
        let (offset, height) = cosine_peak(f(-1.0), f(0.0), f(1.0));
        assert!((offset - 0.3).abs() < 1e-9);
        assert!((height - 0.8).abs() < 1e-9);

        // The parabola lands short on the same samples.
        assert!((parabolic_offset(f(-1.0), f(0.0), f(1.0)) - 0.3).abs() > 0.02);
    }

    #[test]
    fn test_cosine_peak_falls_back_on_flat_top() {
        assert_eq!(cosine_peak(1.0, 1.0, 1.0), (0.0, 1.0));
    }

    #[test]
    fn test_estimate_set_tags_methods() {
        let set = EstimateSet {
            autocorrelation: Some(72),
            spectral: None,
            peak_interval: Some(74),
        };
        let tagged = set.to_estimates();
        assert_eq!(tagged.len(), 2);
        assert_eq!(tagged[1].method, EstimationMethod::PeakInterval);
        assert!(!set.is_empty());
        assert!(EstimateSet::default().is_empty());
    }
}
