//! Quality classes, BPM readings, and measurement outcomes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Beats per minute.
pub type Bpm = i32;

/// Signal quality class, ordered from worst to best.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalQuality {
    Poor,
    Fair,
    Good,
    Excellent,
}

impl SignalQuality {
    /// Whether a frame of this quality may enter the sample buffer.
    pub fn is_acceptable(self) -> bool {
        self != SignalQuality::Poor
    }

    /// User-facing hint for the current class.
    pub fn hint(self) -> &'static str {
        match self {
            SignalQuality::Poor => "Adjust finger placement to cover the camera and light",
            SignalQuality::Fair => "Keep steady, measuring",
            SignalQuality::Good => "Good signal",
            SignalQuality::Excellent => "Excellent signal",
        }
    }
}

impl std::fmt::Display for SignalQuality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            SignalQuality::Poor => "poor",
            SignalQuality::Fair => "fair",
            SignalQuality::Good => "good",
            SignalQuality::Excellent => "excellent",
        };
        f.write_str(label)
    }
}

/// Which estimator produced a BPM value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EstimationMethod {
    Autocorrelation,
    Spectral,
    PeakInterval,
}

/// A single estimator's output for one evaluation cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BpmEstimate {
    pub value: Bpm,
    pub method: EstimationMethod,
}

impl BpmEstimate {
    pub fn new(value: Bpm, method: EstimationMethod) -> Self {
        Self { value, method }
    }
}

/// The committed output of one evaluation cycle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FusedReading {
    pub bpm: Bpm,

    /// Valid elapsed seconds at which the reading was produced.
    pub elapsed_secs: f64,
}

/// Why a session could not produce a measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    CameraUnavailable,
    IlluminationUnavailable,
    PermissionDenied,
    MeasurementFailed,
}

impl FailureReason {
    /// Whether the user must change settings or hardware before retrying.
    pub fn requires_intervention(self) -> bool {
        !matches!(self, FailureReason::MeasurementFailed)
    }
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            FailureReason::CameraUnavailable => "camera unavailable",
            FailureReason::IlluminationUnavailable => "illumination unavailable",
            FailureReason::PermissionDenied => "camera permission denied",
            FailureReason::MeasurementFailed => "no reliable signal could be established",
        };
        f.write_str(label)
    }
}

/// Final result of a measurement, the only artefact handed to persistence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementSummary {
    /// Heart rate after outlier rejection.
    pub bpm: Bpm,

    /// When the measurement finished.
    pub timestamp: DateTime<Utc>,

    /// Confidence in `[0.0, 0.99]`.
    pub confidence: f64,

    /// Symmetric error margin (± BPM).
    pub margin_bpm: f64,

    /// Number of readings that survived outlier rejection.
    pub readings: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quality_ordering() {
        assert!(SignalQuality::Poor < SignalQuality::Fair);
        assert!(SignalQuality::Good < SignalQuality::Excellent);
        assert!(!SignalQuality::Poor.is_acceptable());
        assert!(SignalQuality::Fair.is_acceptable());
    }

    #[test]
    fn test_quality_serializes_snake_case() {
        let json = serde_json::to_string(&SignalQuality::Excellent).unwrap();
        assert_eq!(json, "\"excellent\"");
        let method: EstimationMethod = serde_json::from_str("\"peak_interval\"").unwrap();
        assert_eq!(method, EstimationMethod::PeakInterval);
    }

    #[test]
    fn test_failure_reason_intervention() {
        assert!(FailureReason::PermissionDenied.requires_intervention());
        assert!(!FailureReason::MeasurementFailed.requires_intervention());
    }
}
