//! One evaluation cycle: filter → estimate → fuse.
//!
//! `PulseEvaluator` is stateless between cycles; it works on a snapshot of
//! the buffer so a caller can run it off the frame path.

use fingerpulse_model::{AcceptedPoint, Bpm};
use serde::{Deserialize, Serialize};

use crate::buffer::BufferConfig;
use crate::confidence::ConfidenceConfig;
use crate::estimators::{EstimateSet, EstimatorConfig};
use crate::filters::{FilterConfig, FilterGap, FilterStage};
use crate::fusion::{FusionConfig, FusionPolicy, FusionRule};
use crate::motion::MotionConfig;
use crate::quality::QualityConfig;

/// Every tunable of the signal pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub motion: MotionConfig,
    pub quality: QualityConfig,
    pub buffer: BufferConfig,
    pub filter: FilterConfig,
    pub estimator: EstimatorConfig,
    pub fusion: FusionConfig,
    pub confidence: ConfidenceConfig,
}

/// Why a cycle produced no BPM. None of these are errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleGap {
    InsufficientSamples,
    UnknownSampleRate,
    FlatSignal,
    NoEstimates,
    Disagreement,
}

impl From<FilterGap> for CycleGap {
    fn from(gap: FilterGap) -> Self {
        match gap {
            FilterGap::TooShort => CycleGap::InsufficientSamples,
            FilterGap::UnknownSampleRate => CycleGap::UnknownSampleRate,
            FilterGap::FlatSignal => CycleGap::FlatSignal,
        }
    }
}

/// Everything one cycle found out.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleOutcome {
    pub sample_rate: Option<f64>,
    pub estimates: EstimateSet,
    pub fused: Option<(Bpm, FusionRule)>,
    pub gap: Option<CycleGap>,
}

impl CycleOutcome {
    fn gap(gap: CycleGap, sample_rate: Option<f64>, estimates: EstimateSet) -> Self {
        Self {
            sample_rate,
            estimates,
            fused: None,
            gap: Some(gap),
        }
    }

    /// The fused BPM, if any.
    pub fn bpm(&self) -> Option<Bpm> {
        self.fused.map(|(bpm, _)| bpm)
    }
}

#[derive(Debug, Clone)]
pub struct PulseEvaluator {
    filter: FilterStage,
    estimator: EstimatorConfig,
    fusion: FusionPolicy,
}

impl PulseEvaluator {
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            filter: FilterStage::new(config.filter.clone()),
            estimator: config.estimator.clone(),
            fusion: FusionPolicy::new(config.fusion.clone()),
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(&PipelineConfig::default())
    }

    /// Run one cycle over `points` (usable buffer contents, oldest first).
    pub fn evaluate(&self, points: &[AcceptedPoint]) -> CycleOutcome {
        let signal = match self.filter.apply(points) {
            Ok(signal) => signal,
            Err(gap) => {
                tracing::debug!(?gap, points = points.len(), "Filter stage produced no signal");
                return CycleOutcome::gap(gap.into(), None, EstimateSet::default());
            }
        };

        let estimates = EstimateSet::estimate(&signal, &self.estimator);
        let sample_rate = Some(signal.sample_rate);
        if estimates.is_empty() {
            return CycleOutcome::gap(CycleGap::NoEstimates, sample_rate, estimates);
        }

        match self.fusion.resolve(&estimates) {
            Some((bpm, rule)) => {
                tracing::debug!(
                    bpm,
                    ?rule,
                    sample_rate = signal.sample_rate,
                    ?estimates,
                    "Cycle fused"
                );
                CycleOutcome {
                    sample_rate,
                    estimates,
                    fused: Some((bpm, rule)),
                    gap: None,
                }
            }
            None => CycleOutcome::gap(CycleGap::Disagreement, sample_rate, estimates),
        }
    }
}
