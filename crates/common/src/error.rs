//! Error types shared across Fingerpulse crates.

/// Top-level error type for Fingerpulse operations.
///
/// Per-frame rejections and "no estimate this cycle" are not errors and never
/// travel through this type; only control-flow misuse and acquisition failures do.
#[derive(Debug, thiserror::Error)]
pub enum PulseError {
    #[error("Acquisition error: {reason}")]
    Acquisition { reason: String },

    #[error("Invalid session state: {message}")]
    InvalidState { message: String },

    #[error("Processing error: {message}")]
    Processing { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using PulseError.
pub type PulseResult<T> = Result<T, PulseError>;

impl PulseError {
    pub fn acquisition(reason: impl Into<String>) -> Self {
        Self::Acquisition {
            reason: reason.into(),
        }
    }

    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Self::InvalidState {
            message: msg.into(),
        }
    }

    pub fn processing(msg: impl Into<String>) -> Self {
        Self::Processing {
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }
}
