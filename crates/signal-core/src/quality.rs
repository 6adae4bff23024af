//! Signal quality classification.
//!
//! Two tiers:
//! 1. **Frame gate:** a hard check on the current frame alone. A dim frame,
//!    an ambient-light frame (no finger over the lens), or a frame where red
//!    does not dominate is `Poor`, and the frame is not accepted.
//! 2. **Buffer statistics:** once the gate passes and enough points are
//!    buffered, mean / amplitude / standard deviation of the most recent points
//!    refine the class to `Fair`, `Good`, or `Excellent`. This tier is feedback
//!    only; it never yields `Poor`.

use fingerpulse_model::{Sample, SignalQuality};
use serde::{Deserialize, Serialize};

use crate::stats;

/// Quality thresholds, all in raw 0-255 channel units.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityConfig {
    /// Minimum red intensity for a lit fingertip.
    pub min_red: f64,

    /// Green and blue both above this means ambient light reaches the sensor.
    pub ambient_channel_floor: f64,

    /// Red must be at least `(green + blue) * ratio`.
    pub red_dominance_ratio: f64,

    /// Number of recent buffered points used for statistics.
    pub stats_window: usize,

    pub excellent_mean: f64,
    pub excellent_amplitude: f64,
    /// Inclusive `(min, max)` standard deviation band for `Excellent`.
    pub excellent_std_band: (f64, f64),

    pub good_mean: f64,
    pub good_amplitude: f64,
    /// Inclusive `(min, max)` standard deviation band for `Good`.
    pub good_std_band: (f64, f64),
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            min_red: 50.0,
            ambient_channel_floor: 110.0,
            red_dominance_ratio: 0.8,
            stats_window: 30,
            excellent_mean: 120.0,
            excellent_amplitude: 5.0,
            excellent_std_band: (0.5, 25.0),
            good_mean: 80.0,
            good_amplitude: 2.0,
            good_std_band: (0.2, 40.0),
        }
    }
}

/// Why the frame gate rejected a sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameRejection {
    /// Red channel below the brightness floor.
    TooDim,
    /// Green and blue are also bright: light is not passing through tissue.
    AmbientLight,
    /// Red does not dominate green + blue.
    NotRedDominant,
    /// A channel or the timestamp is NaN/infinite.
    InvalidSample,
}

/// Summary statistics over the recent buffer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BufferStats {
    pub mean: f64,
    pub amplitude: f64,
    pub std_dev: f64,
}

impl BufferStats {
    pub fn from_values(values: &[f64]) -> Option<Self> {
        Some(Self {
            mean: stats::mean(values)?,
            amplitude: stats::peak_to_peak(values)?,
            std_dev: stats::std_dev(values)?,
        })
    }
}

/// Two-tier signal quality evaluator.
#[derive(Debug, Clone)]
pub struct SignalQualityEvaluator {
    config: QualityConfig,
}

impl SignalQualityEvaluator {
    pub fn new(config: QualityConfig) -> Self {
        Self { config }
    }

    pub fn with_defaults() -> Self {
        Self::new(QualityConfig::default())
    }

    /// Classify `sample` given the most recently accepted red values
    /// (oldest first; only the last `stats_window` are used).
    pub fn evaluate(&self, sample: &Sample, recent: &[f64]) -> SignalQuality {
        if let Err(rejection) = self.gate(sample) {
            tracing::trace!(?rejection, red = sample.red, "Frame rejected by quality gate");
            return SignalQuality::Poor;
        }

        let window = self.config.stats_window.max(1);
        if recent.len() < window {
            return SignalQuality::Fair;
        }
        let tail = &recent[recent.len() - window..];
        match BufferStats::from_values(tail) {
            Some(stats) => self.classify(&stats),
            None => SignalQuality::Fair,
        }
    }

    /// Tier 1: per-frame hard gate.
    pub fn gate(&self, sample: &Sample) -> Result<(), FrameRejection> {
        let cfg = &self.config;
        if !sample.is_finite() {
            return Err(FrameRejection::InvalidSample);
        }
        if sample.red < cfg.min_red {
            return Err(FrameRejection::TooDim);
        }
        if sample.green > cfg.ambient_channel_floor && sample.blue > cfg.ambient_channel_floor {
            return Err(FrameRejection::AmbientLight);
        }
        if sample.red < sample.green_blue() * cfg.red_dominance_ratio {
            return Err(FrameRejection::NotRedDominant);
        }
        Ok(())
    }

    /// Tier 2: map buffer statistics onto `Fair`/`Good`/`Excellent`.
    pub fn classify(&self, stats: &BufferStats) -> SignalQuality {
        let cfg = &self.config;
        let in_band = |(lo, hi): (f64, f64)| stats.std_dev >= lo && stats.std_dev <= hi;

        if stats.mean >= cfg.excellent_mean
            && stats.amplitude >= cfg.excellent_amplitude
            && in_band(cfg.excellent_std_band)
        {
            SignalQuality::Excellent
        } else if stats.mean >= cfg.good_mean
            && stats.amplitude >= cfg.good_amplitude
            && in_band(cfg.good_std_band)
        {
            SignalQuality::Good
        } else {
            SignalQuality::Fair
        }
    }

    pub fn config(&self) -> &QualityConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finger_sample(red: f64) -> Sample {
        Sample::new(red, 40.0, 30.0, 0.0)
    }

    fn pulse_values(mean: f64, amplitude: f64, n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| {
                let t = i as f64 / 30.0;
                mean + amplitude * (2.0 * std::f64::consts::PI * 1.2 * t).sin()
            })
            .collect()
    }

    #[test]
    fn test_bright_red_dominant_stable_buffer_is_excellent() {
        let evaluator = SignalQualityEvaluator::with_defaults();
        let recent = pulse_values(180.0, 4.0, 60);
        let quality = evaluator.evaluate(&finger_sample(182.0), &recent);
        assert_eq!(quality, SignalQuality::Excellent);
    }

    #[test]
    fn test_dim_frame_is_poor() {
        let evaluator = SignalQualityEvaluator::with_defaults();
        let recent = pulse_values(180.0, 4.0, 60);
        assert_eq!(
            evaluator.evaluate(&Sample::new(30.0, 5.0, 5.0, 0.0), &recent),
            SignalQuality::Poor
        );
        assert_eq!(
            evaluator.gate(&Sample::new(30.0, 5.0, 5.0, 0.0)),
            Err(FrameRejection::TooDim)
        );
    }

    #[test]
    fn test_ambient_light_is_poor() {
        let evaluator = SignalQualityEvaluator::with_defaults();
        let sample = Sample::new(200.0, 190.0, 185.0, 0.0);
        assert_eq!(evaluator.gate(&sample), Err(FrameRejection::AmbientLight));
        assert_eq!(evaluator.evaluate(&sample, &[]), SignalQuality::Poor);
    }

    #[test]
    fn test_non_red_dominant_is_poor() {
        let evaluator = SignalQualityEvaluator::with_defaults();
        let sample = Sample::new(90.0, 80.0, 60.0, 0.0);
        assert_eq!(evaluator.gate(&sample), Err(FrameRejection::NotRedDominant));
    }

    #[test]
    fn test_nan_sample_is_poor() {
        let evaluator = SignalQualityEvaluator::with_defaults();
        let sample = Sample::new(f64::NAN, 40.0, 30.0, 0.0);
        assert_eq!(evaluator.gate(&sample), Err(FrameRejection::InvalidSample));
    }

    #[test]
    fn test_short_buffer_defaults_to_fair() {
        let evaluator = SignalQualityEvaluator::with_defaults();
        let recent = pulse_values(180.0, 4.0, 10);
        assert_eq!(
            evaluator.evaluate(&finger_sample(180.0), &recent),
            SignalQuality::Fair
        );
    }

    #[test]
    fn test_flat_buffer_never_downgrades_to_poor() {
        let evaluator = SignalQualityEvaluator::with_defaults();
        let recent = vec![180.0; 60];
        assert_eq!(
            evaluator.evaluate(&finger_sample(180.0), &recent),
            SignalQuality::Fair
        );
    }

    #[test]
    fn test_moderate_buffer_is_good() {
        let evaluator = SignalQualityEvaluator::with_defaults();
        let recent = pulse_values(95.0, 1.5, 60);
        assert_eq!(
            evaluator.evaluate(&finger_sample(95.0), &recent),
            SignalQuality::Good
        );
    }
}
