//! Confidence and error bounds over a session's BPM history.
//!
//! Outliers are removed with an IQR fence first, then:
//! - `stability = clamp(1 - cv / max_cv, 0, 1)` with `cv = std / mean`
//! - `confidence = stability * (0.5 + 0.5 * min(n / full_confidence_samples, 1))`,
//!   capped at `max_confidence`
//! - `margin = 1.96 * std / sqrt(n)`, clamped to `[min_margin, max_margin]`

use fingerpulse_model::Bpm;
use serde::{Deserialize, Serialize};

use crate::stats;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfidenceConfig {
    pub iqr_k: f64,

    /// Coefficient of variation at which stability reaches zero.
    pub max_cv: f64,

    /// History length at which sample size stops limiting confidence.
    pub full_confidence_samples: usize,

    pub max_confidence: f64,
    pub min_margin: f64,
    pub max_margin: f64,
}

impl Default for ConfidenceConfig {
    fn default() -> Self {
        Self {
            iqr_k: 1.5,
            max_cv: 0.15,
            full_confidence_samples: 10,
            max_confidence: 0.99,
            min_margin: 2.0,
            max_margin: 10.0,
        }
    }
}

/// Result of validating a BPM history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceReport {
    /// Rounded mean of the kept readings.
    pub bpm: Bpm,
    pub confidence: f64,
    pub margin_bpm: f64,
    pub kept: usize,
    pub rejected: usize,
}

#[derive(Debug, Clone)]
pub struct ConfidenceValidator {
    config: ConfidenceConfig,
}

impl ConfidenceValidator {
    const Z_95: f64 = 1.96;

    pub fn new(config: ConfidenceConfig) -> Self {
        Self { config }
    }

    pub fn with_defaults() -> Self {
        Self::new(ConfidenceConfig::default())
    }

    /// Validate `history`; `None` when it is empty.
    pub fn assess(&self, history: &[Bpm]) -> Option<ConfidenceReport> {
        let cfg = &self.config;
        let values: Vec<f64> = history.iter().map(|&b| b as f64).collect();

        // The fence is meaningless below four points.
        let kept = if values.len() >= 4 {
            stats::iqr_filter(&values, cfg.iqr_k)
        } else {
            values.clone()
        };
        let mean = stats::mean(&kept)?;
        let n = kept.len();

        let std = stats::sample_std_dev(&kept).unwrap_or(0.0);
        let cv = if mean > 0.0 { std / mean } else { f64::INFINITY };
        let stability = if cfg.max_cv > 0.0 {
            (1.0 - cv / cfg.max_cv).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let full = cfg.full_confidence_samples.max(1) as f64;
        let sample_factor = (n as f64 / full).min(1.0);
        let confidence =
            (stability * (0.5 + 0.5 * sample_factor)).clamp(0.0, cfg.max_confidence);

        let margin_bpm = if n < 2 {
            cfg.max_margin
        } else {
            (Self::Z_95 * std / (n as f64).sqrt()).clamp(cfg.min_margin, cfg.max_margin)
        };

        Some(ConfidenceReport {
            bpm: mean.round() as Bpm,
            confidence,
            margin_bpm,
            kept: n,
            rejected: values.len() - n,
        })
    }

    pub fn config(&self) -> &ConfidenceConfig {
        &self.config
    }
}
