//! Session and application configuration.

use std::path::Path;

use fingerpulse_common::config::{config_file_path, load_or_default, save_json, LoggingConfig};
use fingerpulse_common::error::{PulseError, PulseResult};
use fingerpulse_signal_core::PipelineConfig;
use serde::{Deserialize, Serialize};

/// Configuration for one measurement session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Valid seconds to collect before finishing automatically.
    pub duration_secs: f64,

    /// Cap on any single frame's contribution to valid time.
    pub max_frame_delta_secs: f64,

    /// Valid seconds between evaluation cycles.
    pub evaluation_interval_secs: f64,

    /// Buffered events per subscriber before the oldest are dropped.
    pub event_capacity: usize,

    /// Frames queued ahead of the worker.
    pub frame_queue_capacity: usize,

    /// Signal pipeline tunables.
    pub pipeline: PipelineConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            duration_secs: 30.0,
            max_frame_delta_secs: 0.1,
            evaluation_interval_secs: 1.0,
            event_capacity: 4096,
            frame_queue_capacity: 256,
            pipeline: PipelineConfig::default(),
        }
    }
}

impl SessionConfig {
    /// Reject values that would make a session meaningless.
    pub fn validate(&self) -> PulseResult<()> {
        if !(self.duration_secs.is_finite() && self.duration_secs > 0.0) {
            return Err(PulseError::config("duration_secs must be positive"));
        }
        if self.max_frame_delta_secs.is_nan() || self.max_frame_delta_secs <= 0.0 {
            return Err(PulseError::config("max_frame_delta_secs must be positive"));
        }
        if self.evaluation_interval_secs < 0.0 {
            return Err(PulseError::config(
                "evaluation_interval_secs must not be negative",
            ));
        }
        if self.event_capacity == 0 || self.frame_queue_capacity == 0 {
            return Err(PulseError::config("channel capacities must be non-zero"));
        }
        let estimator = &self.pipeline.estimator;
        if estimator.min_bpm <= 0 || estimator.min_bpm >= estimator.max_bpm {
            return Err(PulseError::config("estimator BPM range is empty"));
        }
        Ok(())
    }
}

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub session: SessionConfig,
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load from the standard config path, falling back to defaults.
    pub fn load() -> Self {
        Self::load_from(&config_file_path())
    }

    pub fn load_from(path: &Path) -> Self {
        load_or_default(path)
    }

    /// Save to the standard config path.
    pub fn save(&self) -> PulseResult<()> {
        self.save_to(&config_file_path())
    }

    pub fn save_to(&self, path: &Path) -> PulseResult<()> {
        save_json(self, path)
    }
}
