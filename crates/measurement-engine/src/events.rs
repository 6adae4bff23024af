//! Events published by a measurement session.

use fingerpulse_model::{Bpm, FailureReason, FusedReading, MeasurementSummary, SignalQuality};
use serde::{Deserialize, Serialize};

use crate::session::SessionState;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum SessionEvent {
    StateChanged(SessionState),

    /// Per-frame quality differs from the last published class.
    QualityChanged(SignalQuality),

    /// Fraction of the measurement completed, after each accepted frame.
    Progress(f64),

    /// An evaluation cycle produced a fused reading.
    BpmUpdate(FusedReading),

    /// The session finished with at least one reading.
    Finished {
        /// Arithmetic mean of all readings.
        average_bpm: Bpm,
        summary: MeasurementSummary,
    },

    Error(FailureReason),
}
