//! Motion detection on the raw red channel.
//!
//! A fingertip that slides or lifts produces large frame-to-frame swings in
//! red intensity, much larger than the pulse itself. The detector keeps a
//! short rolling window of raw values and flags motion when the mean absolute
//! first difference over that window exceeds a fixed threshold.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

/// Motion detector configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionConfig {
    /// Number of raw values in the rolling window.
    pub window_size: usize,

    /// Mean absolute delta (raw 0-255 units) above which motion is excessive.
    pub threshold: f64,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            window_size: 10,
            threshold: 15.0,
        }
    }
}

/// Rolling-window motion detector.
#[derive(Debug, Clone)]
pub struct MotionDetector {
    config: MotionConfig,
    window: VecDeque<f64>,
}

impl MotionDetector {
    pub fn new(config: MotionConfig) -> Self {
        let capacity = config.window_size.max(2);
        Self {
            config,
            window: VecDeque::with_capacity(capacity),
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(MotionConfig::default())
    }

    /// Feed one raw red value; returns true when motion is excessive.
    ///
    /// Must be called once per observed frame, whether or not the frame is
    /// later accepted. Until the window is full this always returns false.
    pub fn observe(&mut self, value: f64) -> bool {
        let size = self.config.window_size.max(2);
        self.window.push_back(value);
        while self.window.len() > size {
            self.window.pop_front();
        }

        match self.mean_abs_delta() {
            Some(level) if self.window.len() == size => level > self.config.threshold,
            _ => false,
        }
    }

    /// Mean absolute consecutive difference over the current window.
    pub fn mean_abs_delta(&self) -> Option<f64> {
        if self.window.len() < 2 {
            return None;
        }
        let total: f64 = self
            .window
            .iter()
            .zip(self.window.iter().skip(1))
            .map(|(a, b)| (b - a).abs())
            .sum();
        Some(total / (self.window.len() - 1) as f64)
    }

    /// Clear the window.
    pub fn reset(&mut self) {
        self.window.clear();
    }

    pub fn config(&self) -> &MotionConfig {
        &self.config
    }
}
