//! Agreement policy across the three estimators.
//!
//! Rules are tried in order and the first that applies wins:
//! 1. All three present and mutually within threshold: median of three.
//! 2. Autocorrelation agrees with spectral or peak-interval: weighted mean,
//!    autocorrelation counting `autocorrelation_weight` times.
//! 3. Spectral and peak-interval agree: their mean.
//! 4. Only autocorrelation available: autocorrelation.
//! 5. Spectral and peak-interval within the last-resort threshold: their mean.
//!
//! Otherwise the cycle produces nothing.

use fingerpulse_model::Bpm;
use serde::{Deserialize, Serialize};

use crate::estimators::EstimateSet;

/// Fusion thresholds in BPM.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FusionConfig {
    pub base_threshold: f64,

    /// Threshold used when the compared estimates average above `high_rate_cutoff`.
    pub high_rate_threshold: f64,
    pub high_rate_cutoff: f64,

    /// Wider tolerance for the spectral/peak-interval last-resort check.
    pub last_resort_threshold: f64,

    /// Relative weight of autocorrelation in rule 2.
    pub autocorrelation_weight: f64,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            base_threshold: 6.0,
            high_rate_threshold: 9.0,
            high_rate_cutoff: 120.0,
            last_resort_threshold: 12.0,
            autocorrelation_weight: 2.0,
        }
    }
}

/// Which rule produced a fused value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FusionRule {
    AllAgree,
    AutocorrelationPair,
    SpectralPeakPair,
    AutocorrelationOnly,
    LastResort,
}

#[derive(Debug, Clone)]
pub struct FusionPolicy {
    config: FusionConfig,
}

impl FusionPolicy {
    pub fn new(config: FusionConfig) -> Self {
        Self { config }
    }

    pub fn with_defaults() -> Self {
        Self::new(FusionConfig::default())
    }

    /// Fused BPM, or `None` when the estimates disagree.
    pub fn fuse(&self, estimates: &EstimateSet) -> Option<Bpm> {
        self.resolve(estimates).map(|(bpm, _)| bpm)
    }

    /// Fused BPM together with the rule that produced it.
    pub fn resolve(&self, estimates: &EstimateSet) -> Option<(Bpm, FusionRule)> {
        let EstimateSet {
            autocorrelation: ac,
            spectral: sp,
            peak_interval: pk,
        } = *estimates;

        if let (Some(a), Some(s), Some(p)) = (ac, sp, pk) {
            let mut all = [a, s, p];
            all.sort_unstable();
            let mean = (a + s + p) as f64 / 3.0;
            if (all[2] - all[0]) as f64 <= self.threshold_at(mean) {
                return Some((all[1], FusionRule::AllAgree));
            }
        }

        if let Some(a) = ac {
            let partner = [sp, pk]
                .into_iter()
                .flatten()
                .filter(|&other| self.agree(a, other))
                .min_by_key(|&other| (other - a).abs());
            if let Some(other) = partner {
                let w = self.config.autocorrelation_weight;
                let fused = (w * a as f64 + other as f64) / (w + 1.0);
                return Some((fused.round() as Bpm, FusionRule::AutocorrelationPair));
            }
        }

        if let (Some(s), Some(p)) = (sp, pk) {
            if self.agree(s, p) {
                return Some((average(s, p), FusionRule::SpectralPeakPair));
            }
        }

        if let (Some(a), None, None) = (ac, sp, pk) {
            return Some((a, FusionRule::AutocorrelationOnly));
        }

        if let (Some(s), Some(p)) = (sp, pk) {
            if ((s - p).abs() as f64) <= self.config.last_resort_threshold {
                return Some((average(s, p), FusionRule::LastResort));
            }
        }

        tracing::debug!(?ac, ?sp, ?pk, "Estimators disagree, no fused value");
        None
    }

    /// Agreement threshold for estimates averaging `mean_bpm`.
    pub fn threshold_at(&self, mean_bpm: f64) -> f64 {
        if mean_bpm > self.config.high_rate_cutoff {
            self.config.high_rate_threshold
        } else {
            self.config.base_threshold
        }
    }

    fn agree(&self, a: Bpm, b: Bpm) -> bool {
        let mean = (a + b) as f64 / 2.0;
        ((a - b).abs() as f64) <= self.threshold_at(mean)
    }

    pub fn config(&self) -> &FusionConfig {
        &self.config
    }
}

fn average(a: Bpm, b: Bpm) -> Bpm {
    ((a + b) as f64 / 2.0).round() as Bpm
}
