//! Deterministic synthetic fingertip sample source.
//!
//! Produces a sinusoidal red-channel pulse over a steady baseline with
//! Gaussian sensor noise, optional motion bursts, timestamp jitter, and an
//! ambient-light mode where the lens is uncovered.

use std::f64::consts::PI;

use fingerpulse_common::error::{PulseError, PulseResult};
use fingerpulse_model::Sample;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyntheticConfig {
    pub bpm: f64,
    pub sample_rate_hz: f64,
    pub duration_secs: f64,

    pub base_red: f64,
    pub base_green: f64,
    pub base_blue: f64,

    /// Peak red deviation caused by the pulse.
    pub pulse_amplitude: f64,

    /// Standard deviation of per-channel sensor noise.
    pub noise_sigma: f64,

    /// Fraction of frames that belong to a motion burst.
    pub motion_ratio: f64,

    /// Frames per motion burst.
    pub motion_burst_frames: usize,

    /// Red swing during a motion burst.
    pub motion_amplitude: f64,

    /// Maximum absolute timestamp jitter in seconds.
    pub timestamp_jitter_secs: f64,

    /// Uncovered lens: all channels bright, red not dominant.
    pub ambient: bool,

    pub seed: u64,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            bpm: 72.0,
            sample_rate_hz: 30.0,
            duration_secs: 30.0,
            base_red: 180.0,
            base_green: 40.0,
            base_blue: 30.0,
            pulse_amplitude: 4.0,
            noise_sigma: 0.3,
            motion_ratio: 0.0,
            motion_burst_frames: 5,
            motion_amplitude: 35.0,
            timestamp_jitter_secs: 0.0,
            ambient: false,
            seed: 42,
        }
    }
}

impl SyntheticConfig {
    /// Frames the generator yields before ending.
    pub fn frame_count(&self) -> usize {
        (self.duration_secs * self.sample_rate_hz).round().max(0.0) as usize
    }
}

/// Iterator of synthetic samples.
pub struct SyntheticPulse {
    config: SyntheticConfig,
    rng: StdRng,
    noise: Normal<f64>,
    index: usize,
    burst_remaining: usize,
}

impl SyntheticPulse {
    pub fn new(config: SyntheticConfig) -> PulseResult<Self> {
        if !(config.sample_rate_hz > 0.0 && config.sample_rate_hz.is_finite()) {
            return Err(PulseError::config("sample_rate_hz must be positive"));
        }
        if !(0.0..=1.0).contains(&config.motion_ratio) {
            return Err(PulseError::config("motion_ratio must be within [0, 1]"));
        }
        let noise = Normal::new(0.0, config.noise_sigma)
            .map_err(|e| PulseError::config(format!("Invalid noise_sigma: {e}")))?;

        Ok(Self {
            rng: StdRng::seed_from_u64(config.seed),
            noise,
            index: 0,
            burst_remaining: 0,
            config,
        })
    }

    pub fn config(&self) -> &SyntheticConfig {
        &self.config
    }

    fn motion_offset(&mut self) -> f64 {
        let cfg = &self.config;
        if self.burst_remaining == 0 && cfg.motion_ratio > 0.0 {
            let burst = cfg.motion_burst_frames.max(1);
            let start_probability = (cfg.motion_ratio / burst as f64).min(1.0);
            if self.rng.gen_bool(start_probability) {
                self.burst_remaining = burst;
            }
        }
        if self.burst_remaining == 0 {
            return 0.0;
        }
        self.burst_remaining -= 1;
        let swing = self.config.motion_amplitude * self.rng.gen_range(0.7..=1.3);
        if self.burst_remaining % 2 == 0 {
            swing
        } else {
            -swing
        }
    }
}

impl Iterator for SyntheticPulse {
    type Item = Sample;

    fn next(&mut self) -> Option<Sample> {
        if self.index >= self.config.frame_count() {
            return None;
        }
        let nominal = self.index as f64 / self.config.sample_rate_hz;
        self.index += 1;

        let jitter = self.config.timestamp_jitter_secs.abs();
        let captured_at = if jitter > 0.0 {
            (nominal + self.rng.gen_range(-jitter..=jitter)).max(0.0)
        } else {
            nominal
        };

        let phase = 2.0 * PI * self.config.bpm / 60.0 * nominal;
        let pulse = self.config.pulse_amplitude * phase.sin();
        let motion = self.motion_offset();

        let cfg = &self.config;
        let (red, green, blue) = if cfg.ambient {
            (200.0, 190.0, 185.0)
        } else {
            (cfg.base_red + pulse + motion, cfg.base_green, cfg.base_blue)
        };

        let mut noisy = |value: f64| (value + self.noise.sample(&mut self.rng)).clamp(0.0, 255.0);
        Some(Sample::new(noisy(red), noisy(green), noisy(blue), captured_at))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_stream() {
        let config = SyntheticConfig {
            motion_ratio: 0.05,
            timestamp_jitter_secs: 0.004,
            ..SyntheticConfig::default()
        };
        let a: Vec<Sample> = SyntheticPulse::new(config.clone()).unwrap().collect();
        let b: Vec<Sample> = SyntheticPulse::new(config).unwrap().collect();
        assert_eq!(a.len(), 900);
        assert_eq!(a, b);
    }

    #[test]
    fn test_ambient_frames_are_not_red_dominant() {
        let config = SyntheticConfig {
            ambient: true,
            duration_secs: 1.0,
            ..SyntheticConfig::default()
        };
        for sample in SyntheticPulse::new(config).unwrap() {
            assert!(sample.green > 150.0 && sample.blue > 150.0);
        }
    }

    #[test]
    fn test_motion_bursts_appear_at_requested_rate() {
        let config = SyntheticConfig {
            motion_ratio: 0.1,
            noise_sigma: 0.0,
            pulse_amplitude: 0.0,
            duration_secs: 100.0,
            ..SyntheticConfig::default()
        };
        let disturbed = SyntheticPulse::new(config)
            .unwrap()
            .filter(|s| (s.red - 180.0).abs() > 10.0)
            .count();
        // 3000 frames at 10%, generous bounds.
        assert!((150..=450).contains(&disturbed), "{disturbed} disturbed frames");
    }

    #[test]
    fn test_negative_sigma_rejected() {
        let config = SyntheticConfig {
            noise_sigma: -1.0,
            ..SyntheticConfig::default()
        };
        assert!(SyntheticPulse::new(config).is_err());
    }
}
