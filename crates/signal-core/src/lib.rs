//! Fingerpulse Signal Core: the PPG pipeline
//!
//! Turns a stream of fingertip red-channel averages into heart-rate readings:
//! - **Gating:** Motion detection and per-frame signal quality
//! - **Buffering:** Bounded, time-ordered store of accepted points
//! - **Filtering:** Median → moving average → zero-phase bandpass
//! - **Estimation:** Autocorrelation, spectral, and peak-interval BPM
//! - **Fusion:** Agreement policy across the three estimators
//! - **Confidence:** Outlier rejection, confidence score, and error margin
//!
//! This crate is pure computation with no I/O and no clocks.
//! All inputs are data; all outputs are data.

pub mod buffer;
pub mod confidence;
pub mod estimators;
pub mod filters;
pub mod fusion;
pub mod motion;
pub mod pipeline;
pub mod quality;
pub mod stats;

pub use buffer::{BufferConfig, SampleBuffer};
pub use confidence::{ConfidenceConfig, ConfidenceReport, ConfidenceValidator};
pub use estimators::{EstimateSet, EstimatorConfig};
pub use filters::{FilterConfig, FilterGap, FilterStage, FilteredSignal};
pub use fusion::{FusionConfig, FusionPolicy, FusionRule};
pub use motion::{MotionConfig, MotionDetector};
pub use pipeline::{CycleGap, CycleOutcome, PipelineConfig, PulseEvaluator};
pub use quality::{BufferStats, FrameRejection, QualityConfig, SignalQualityEvaluator};
