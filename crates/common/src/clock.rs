//! Valid-time accounting for sample streams.
//!
//! A measurement only makes progress while frames are being accepted, so
//! session time is not wall-clock time. This module provides:
//! - `ValidClock`: accumulates capped per-frame deltas for accepted frames
//! - `RateController`: limits how often an evaluation cycle runs
//! - `observed_sample_rate`: the measured (not nominal) sample rate

/// Accumulates *valid* elapsed time from frame capture timestamps.
///
/// Every observed frame moves the reference timestamp forward; only accepted
/// frames add their delta to the total. Deltas are capped so a scheduling
/// stall or a long rejected stretch cannot make progress jump.
#[derive(Debug, Clone)]
pub struct ValidClock {
    max_delta_secs: f64,
    last_observed_secs: Option<f64>,
    valid_elapsed_secs: f64,
}

impl ValidClock {
    /// Create a clock capping each frame's contribution at `max_delta_secs`.
    pub fn new(max_delta_secs: f64) -> Self {
        Self {
            max_delta_secs: max_delta_secs.max(0.0),
            last_observed_secs: None,
            valid_elapsed_secs: 0.0,
        }
    }

    /// Record a frame captured at `captured_at_secs`.
    ///
    /// Returns the valid elapsed time after this frame. The first frame of a
    /// run contributes nothing since it has no predecessor.
    pub fn observe(&mut self, captured_at_secs: f64, accepted: bool) -> f64 {
        let delta = match self.last_observed_secs {
            Some(prev) if captured_at_secs > prev => {
                (captured_at_secs - prev).min(self.max_delta_secs)
            }
            _ => 0.0,
        };

        // Out-of-order stamps never move the reference backwards.
        if self
            .last_observed_secs
            .map_or(true, |prev| captured_at_secs > prev)
        {
            self.last_observed_secs = Some(captured_at_secs);
        }

        if accepted {
            self.valid_elapsed_secs += delta;
        }
        self.valid_elapsed_secs
    }

    /// Valid seconds accumulated so far.
    pub fn elapsed_secs(&self) -> f64 {
        self.valid_elapsed_secs
    }

    /// Forget all observations.
    pub fn reset(&mut self) {
        self.last_observed_secs = None;
        self.valid_elapsed_secs = 0.0;
    }
}

/// Evaluation rate controller keyed on valid time.
#[derive(Debug, Clone)]
pub struct RateController {
    interval_secs: f64,
    last_tick_secs: Option<f64>,
}

impl RateController {
    /// Create a controller that fires at most once per `interval_secs`.
    pub fn new(interval_secs: f64) -> Self {
        Self {
            interval_secs: interval_secs.max(0.0),
            last_tick_secs: None,
        }
    }

    /// Check if enough time has passed for the next tick.
    /// Returns true and updates internal state if ready.
    /// The first call always returns true.
    pub fn should_tick(&mut self, now_secs: f64) -> bool {
        match self.last_tick_secs {
            None => {
                self.last_tick_secs = Some(now_secs);
                true
            }
            Some(last) if now_secs >= last + self.interval_secs => {
                self.last_tick_secs = Some(now_secs);
                true
            }
            _ => false,
        }
    }

    /// Target interval in seconds.
    pub fn interval_secs(&self) -> f64 {
        self.interval_secs
    }

    /// Make the next call to `should_tick` fire unconditionally.
    pub fn reset(&mut self) {
        self.last_tick_secs = None;
    }
}

/// Sample rate measured from a timestamp span: `(count - 1) / (last - first)`.
///
/// Returns `None` when fewer than two samples exist or the span is not positive.
pub fn observed_sample_rate(first_secs: f64, last_secs: f64, count: usize) -> Option<f64> {
    let span = last_secs - first_secs;
    if count < 2 || span <= 0.0 || !span.is_finite() {
        return None;
    }
    Some((count - 1) as f64 / span)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_valid_clock_only_counts_accepted_frames() {
        let mut clock = ValidClock::new(0.1);
        assert_eq!(clock.observe(0.0, true), 0.0);
        assert!((clock.observe(0.033, true) - 0.033).abs() < 1e-9);
        // Rejected frame: time passes but is not counted.
        assert!((clock.observe(0.066, false) - 0.033).abs() < 1e-9);
        assert!((clock.observe(0.099, true) - 0.066).abs() < 1e-9);
    }

    #[test]
    fn test_valid_clock_caps_large_gaps() {
        let mut clock = ValidClock::new(0.1);
        clock.observe(0.0, true);
        let elapsed = clock.observe(2.5, true);
        assert!((elapsed - 0.1).abs() < 1e-9);
    }

    #[test]
    fn test_valid_clock_ignores_backwards_stamps() {
        let mut clock = ValidClock::new(0.1);
        clock.observe(1.0, true);
        assert_eq!(clock.observe(0.5, true), 0.0);
        assert!((clock.observe(1.05, true) - 0.05).abs() < 1e-9);
    }

    #[test]
    fn test_rate_controller() {
        let mut ctrl = RateController::new(1.0);
        assert!(ctrl.should_tick(6.0)); // first tick always fires
        assert!(!ctrl.should_tick(6.5));
        assert!(ctrl.should_tick(7.0));
        ctrl.reset();
        assert!(ctrl.should_tick(7.1));
    }

    #[test]
    fn test_observed_sample_rate() {
        let rate = observed_sample_rate(0.0, 1.0, 31).unwrap();
        assert!((rate - 30.0).abs() < 1e-9);
        assert!(observed_sample_rate(1.0, 1.0, 10).is_none());
        assert!(observed_sample_rate(0.0, 1.0, 1).is_none());
    }

    proptest! {
        #[test]
        fn valid_elapsed_is_monotonic(
            frames in prop::collection::vec((0.0f64..0.5, any::<bool>()), 1..200)
        ) {
            let mut clock = ValidClock::new(0.1);
            let mut t = 0.0;
            let mut prev = 0.0;
            for (step, accepted) in frames {
                t += step;
                let elapsed = clock.observe(t, accepted);
                prop_assert!(elapsed >= prev);
                prop_assert!(elapsed - prev <= 0.1 + 1e-12);
                prev = elapsed;
            }
        }
    }
}
