//! Bounded, time-ordered store of accepted points.
//!
//! The first `warmup_samples` points of a session are kept (so eviction
//! accounting stays simple) but excluded from every estimate: exposure and
//! finger pressure are still settling while they arrive. Once more than
//! `max_samples` points exist the oldest are evicted.

use std::collections::VecDeque;

use fingerpulse_model::AcceptedPoint;
use serde::{Deserialize, Serialize};

/// Sample buffer sizing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BufferConfig {
    /// Points discarded at the start of a session before any estimation.
    pub warmup_samples: usize,

    /// Capacity; older points are evicted beyond this.
    pub max_samples: usize,

    /// Buffered points required before an evaluation cycle may run.
    pub min_samples: usize,
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            warmup_samples: 60,
            max_samples: 450,
            min_samples: 180,
        }
    }
}

/// Ring buffer of accepted points with a warm-up prefix.
#[derive(Debug, Clone)]
pub struct SampleBuffer {
    config: BufferConfig,
    points: VecDeque<AcceptedPoint>,
    evicted: usize,
}

impl SampleBuffer {
    pub fn new(config: BufferConfig) -> Self {
        let capacity = config.max_samples.max(1) + 1;
        Self {
            config,
            points: VecDeque::with_capacity(capacity),
            evicted: 0,
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(BufferConfig::default())
    }

    /// Append a point, evicting the oldest beyond capacity.
    ///
    /// `elapsed_secs` is clamped so the stored sequence never decreases.
    pub fn push(&mut self, mut point: AcceptedPoint) {
        if let Some(last) = self.points.back() {
            if point.elapsed_secs < last.elapsed_secs {
                point.elapsed_secs = last.elapsed_secs;
            }
        }
        self.points.push_back(point);
        let max = self.config.max_samples.max(1);
        while self.points.len() > max {
            self.points.pop_front();
            self.evicted += 1;
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Total points accepted since the last clear, evicted ones included.
    pub fn total_accepted(&self) -> usize {
        self.evicted + self.points.len()
    }

    /// Whether enough points are buffered for an evaluation cycle.
    pub fn is_ready(&self) -> bool {
        self.points.len() >= self.config.min_samples && self.usable_len() > 0
    }

    /// Number of buffered points past the warm-up prefix.
    pub fn usable_len(&self) -> usize {
        self.points.len() - self.warmup_in_buffer()
    }

    /// Copy of the points past the warm-up prefix, oldest first.
    ///
    /// Evaluation runs on this snapshot so the buffer can keep growing.
    pub fn usable_snapshot(&self) -> Vec<AcceptedPoint> {
        self.points
            .iter()
            .skip(self.warmup_in_buffer())
            .copied()
            .collect()
    }

    /// The last `n` raw values (fewer if the buffer is shorter), oldest first.
    pub fn recent_values(&self, n: usize) -> Vec<f64> {
        let skip = self.points.len().saturating_sub(n);
        self.points.iter().skip(skip).map(|p| p.value).collect()
    }

    /// Elapsed time of the newest point.
    pub fn last_elapsed_secs(&self) -> Option<f64> {
        self.points.back().map(|p| p.elapsed_secs)
    }

    pub fn clear(&mut self) {
        self.points.clear();
        self.evicted = 0;
    }

    pub fn config(&self) -> &BufferConfig {
        &self.config
    }

    fn warmup_in_buffer(&self) -> usize {
        self.config
            .warmup_samples
            .saturating_sub(self.evicted)
            .min(self.points.len())
    }
}
