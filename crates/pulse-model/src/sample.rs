//! Sample types for the per-frame color stream.
//!
//! Recorded streams use JSONL, one sample per line:
//! `{"r":182.4,"g":38.1,"b":29.7,"t":12.033}`. Lines starting with `#` are comments.

use serde::{Deserialize, Serialize};

/// Monotonic capture timestamp in seconds.
pub type TimestampSecs = f64;

/// One frame's average color over the fixed center region.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    #[serde(rename = "r")]
    pub red: f64,

    #[serde(rename = "g")]
    pub green: f64,

    #[serde(rename = "b")]
    pub blue: f64,

    /// When the frame was captured.
    #[serde(rename = "t")]
    pub captured_at: TimestampSecs,
}

impl Sample {
    pub fn new(red: f64, green: f64, blue: f64, captured_at: TimestampSecs) -> Self {
        Self {
            red,
            green,
            blue,
            captured_at,
        }
    }

    /// Sum of the two non-red channels, used by the dominance test.
    pub fn green_blue(&self) -> f64 {
        self.green + self.blue
    }

    /// Whether every channel is a finite number.
    pub fn is_finite(&self) -> bool {
        self.red.is_finite()
            && self.green.is_finite()
            && self.blue.is_finite()
            && self.captured_at.is_finite()
    }
}

/// A red-channel value admitted into the sample buffer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AcceptedPoint {
    /// Raw red-channel average.
    pub value: f64,

    /// Valid (quality-gated) elapsed time when the point was accepted.
    pub elapsed_secs: f64,
}

impl AcceptedPoint {
    pub fn new(value: f64, elapsed_secs: f64) -> Self {
        Self {
            value,
            elapsed_secs,
        }
    }
}

/// Errors from reading a recorded sample stream.
#[derive(Debug, thiserror::Error)]
pub enum SampleParseError {
    #[error("line {line}: {source}")]
    Line {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// Parse samples from JSONL content (one JSON object per line).
pub fn parse_samples(jsonl: &str) -> Result<Vec<Sample>, SampleParseError> {
    jsonl
        .lines()
        .enumerate()
        .map(|(idx, line)| (idx + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
        .map(|(line_no, line)| {
            serde_json::from_str(line).map_err(|source| SampleParseError::Line {
                line: line_no,
                source,
            })
        })
        .collect()
}
