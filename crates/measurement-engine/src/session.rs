//! Measurement session management.

use chrono::Utc;
use fingerpulse_common::clock::{RateController, ValidClock};
use fingerpulse_common::error::{PulseError, PulseResult};
use fingerpulse_model::{
    AcceptedPoint, Bpm, FailureReason, FusedReading, MeasurementSummary, Sample, SignalQuality,
};
use fingerpulse_signal_core::{
    ConfidenceValidator, MotionDetector, PulseEvaluator, SampleBuffer, SignalQualityEvaluator,
};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::backend::AcquisitionBackend;
use crate::config::SessionConfig;
use crate::events::SessionEvent;

/// State of a measurement session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Created or reset; nothing held.
    Idle,
    /// Waiting for the backend to grant camera and light.
    Acquiring,
    /// Accepting frames.
    Measuring,
    /// Completed, explicitly or on reaching the duration.
    Finished,
    /// Acquisition failed, the source reported a fatal error, or aborted.
    Failed(FailureReason),
}

/// What happened to one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameOutcome {
    pub quality: SignalQuality,

    /// The motion detector flagged this frame.
    pub motion: bool,

    /// The frame entered the buffer and advanced valid time.
    pub accepted: bool,

    pub progress: f64,

    /// Fused BPM, when this frame triggered a successful cycle.
    pub bpm: Option<Bpm>,

    /// State after the frame; `Finished` when it completed the session.
    pub state: SessionState,
}

/// One heart-rate measurement, driven frame by frame.
///
/// Frames must be delivered in capture order by a single caller; see
/// [`crate::worker::SessionHandle`] for a queued, lock-guarded wrapper.
pub struct MeasurementSession {
    config: SessionConfig,
    state: SessionState,
    backend: Box<dyn AcquisitionBackend>,
    resource_held: bool,

    motion: MotionDetector,
    quality: SignalQualityEvaluator,
    buffer: SampleBuffer,
    evaluator: PulseEvaluator,
    validator: ConfidenceValidator,
    clock: ValidClock,
    cadence: RateController,

    history: Vec<FusedReading>,
    last_quality: Option<SignalQuality>,
    summary: Option<MeasurementSummary>,
    events: broadcast::Sender<SessionEvent>,
}

impl MeasurementSession {
    pub fn new(config: SessionConfig, backend: Box<dyn AcquisitionBackend>) -> PulseResult<Self> {
        config.validate()?;
        let pipeline = &config.pipeline;
        let (events, _) = broadcast::channel(config.event_capacity);

        Ok(Self {
            state: SessionState::Idle,
            backend,
            resource_held: false,
            motion: MotionDetector::new(pipeline.motion.clone()),
            quality: SignalQualityEvaluator::new(pipeline.quality.clone()),
            buffer: SampleBuffer::new(pipeline.buffer.clone()),
            evaluator: PulseEvaluator::new(pipeline),
            validator: ConfidenceValidator::new(pipeline.confidence.clone()),
            clock: ValidClock::new(config.max_frame_delta_secs),
            cadence: RateController::new(config.evaluation_interval_secs),
            history: Vec::new(),
            last_quality: None,
            summary: None,
            events,
            config,
        })
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Receive all events published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub(crate) fn event_sender(&self) -> broadcast::Sender<SessionEvent> {
        self.events.clone()
    }

    /// Seconds of accepted signal so far.
    pub fn valid_elapsed_secs(&self) -> f64 {
        self.clock.elapsed_secs()
    }

    /// Fraction of the measurement completed, in `[0, 1]`.
    pub fn progress(&self) -> f64 {
        (self.clock.elapsed_secs() / self.config.duration_secs).clamp(0.0, 1.0)
    }

    /// Fused readings recorded this session, oldest first.
    pub fn history(&self) -> &[FusedReading] {
        &self.history
    }

    /// Summary of the last finished measurement, if it produced one.
    pub fn summary(&self) -> Option<&MeasurementSummary> {
        self.summary.as_ref()
    }

    /// Acquire the backend and begin measuring.
    ///
    /// Allowed from `Idle` or `Finished`. On acquisition failure the session
    /// moves to `Failed`, publishes the reason, and returns an error.
    pub async fn start(&mut self) -> PulseResult<()> {
        if !matches!(self.state, SessionState::Idle | SessionState::Finished) {
            return Err(PulseError::invalid_state(format!(
                "Cannot start a session in state {:?}",
                self.state
            )));
        }

        tracing::info!(
            backend = self.backend.name(),
            duration_secs = self.config.duration_secs,
            "Starting measurement session"
        );
        self.clear_measurement();
        self.set_state(SessionState::Acquiring);

        match self.backend.acquire().await {
            Ok(()) => {
                self.resource_held = true;
                self.set_state(SessionState::Measuring);
                Ok(())
            }
            Err(err) => {
                tracing::warn!(reason = %err.reason, detail = %err.detail, "Acquisition failed");
                self.set_state(SessionState::Failed(err.reason));
                self.emit(SessionEvent::Error(err.reason));
                Err(PulseError::acquisition(err.to_string()))
            }
        }
    }

    /// Process one frame. Returns `None` when the session is not measuring.
    pub fn on_frame(&mut self, sample: Sample) -> Option<FrameOutcome> {
        if self.state != SessionState::Measuring {
            tracing::trace!(state = ?self.state, "Frame ignored outside measurement");
            return None;
        }

        let finite = sample.is_finite();
        let motion = finite && self.motion.observe(sample.red);
        let recent = self
            .buffer
            .recent_values(self.config.pipeline.quality.stats_window);
        let quality = self.quality.evaluate(&sample, &recent);
        let accepted = quality.is_acceptable() && !motion;
        let elapsed = if finite {
            self.clock.observe(sample.captured_at, accepted)
        } else {
            self.clock.elapsed_secs()
        };

        if self.last_quality != Some(quality) {
            self.last_quality = Some(quality);
            self.emit(SessionEvent::QualityChanged(quality));
        }

        let mut bpm = None;
        if accepted {
            self.buffer.push(AcceptedPoint::new(sample.red, elapsed));
            self.emit(SessionEvent::Progress(self.progress()));

            if self.buffer.is_ready() && self.cadence.should_tick(elapsed) {
                bpm = self.run_cycle(elapsed);
            }
            if elapsed >= self.config.duration_secs {
                tracing::info!(elapsed_secs = elapsed, "Measurement duration reached");
                self.finish(true);
            }
        } else if motion {
            tracing::trace!(red = sample.red, "Frame rejected for motion");
        }

        Some(FrameOutcome {
            quality,
            motion,
            accepted,
            progress: self.progress(),
            bpm,
            state: self.state,
        })
    }

    /// Finish measuring now. Returns the summary when readings exist.
    pub fn stop(&mut self) -> PulseResult<Option<MeasurementSummary>> {
        if self.state != SessionState::Measuring {
            return Err(PulseError::invalid_state("Session not measuring"));
        }
        tracing::info!(elapsed_secs = self.valid_elapsed_secs(), "Stopping measurement");
        self.finish(false);
        Ok(self.summary.clone())
    }

    /// Abandon a running measurement with `reason`.
    pub fn abort(&mut self, reason: FailureReason) -> PulseResult<()> {
        if self.state != SessionState::Measuring {
            return Err(PulseError::invalid_state("Session not measuring"));
        }
        self.fail(reason);
        Ok(())
    }

    /// The frame source hit a fatal error. Ignored unless a run is active.
    pub fn on_source_error(&mut self, reason: FailureReason) {
        if matches!(
            self.state,
            SessionState::Acquiring | SessionState::Measuring
        ) {
            self.fail(reason);
        } else {
            tracing::debug!(%reason, state = ?self.state, "Source error outside a run ignored");
        }
    }

    /// Return to `Idle` from any state, releasing everything.
    pub fn reset(&mut self) {
        self.release_resource();
        self.clear_measurement();
        self.summary = None;
        if self.state != SessionState::Idle {
            self.set_state(SessionState::Idle);
        }
    }

    fn run_cycle(&mut self, elapsed: f64) -> Option<Bpm> {
        let snapshot = self.buffer.usable_snapshot();
        let outcome = self.evaluator.evaluate(&snapshot);
        match outcome.bpm() {
            Some(bpm) => {
                let reading = FusedReading {
                    bpm,
                    elapsed_secs: elapsed,
                };
                tracing::debug!(bpm, elapsed_secs = elapsed, "Fused reading");
                self.history.push(reading);
                self.emit(SessionEvent::BpmUpdate(reading));
                Some(bpm)
            }
            None => {
                tracing::debug!(gap = ?outcome.gap, elapsed_secs = elapsed, "No reading this cycle");
                None
            }
        }
    }

    fn finish(&mut self, automatic: bool) {
        self.release_resource();
        self.set_state(SessionState::Finished);

        let bpms: Vec<Bpm> = self.history.iter().map(|r| r.bpm).collect();
        let Some(report) = self.validator.assess(&bpms) else {
            tracing::warn!(automatic, "Measurement finished without any reading");
            self.summary = None;
            if automatic {
                self.emit(SessionEvent::Error(FailureReason::MeasurementFailed));
            }
            return;
        };

        let average_bpm =
            (bpms.iter().map(|&b| b as f64).sum::<f64>() / bpms.len() as f64).round() as Bpm;
        let summary = MeasurementSummary {
            bpm: report.bpm,
            timestamp: Utc::now(),
            confidence: report.confidence,
            margin_bpm: report.margin_bpm,
            readings: report.kept,
        };
        tracing::info!(
            average_bpm,
            bpm = summary.bpm,
            confidence = summary.confidence,
            margin_bpm = summary.margin_bpm,
            rejected = report.rejected,
            "Measurement finished"
        );
        self.summary = Some(summary.clone());
        self.emit(SessionEvent::Finished {
            average_bpm,
            summary,
        });
    }

    fn fail(&mut self, reason: FailureReason) {
        tracing::warn!(%reason, "Measurement failed");
        self.release_resource();
        self.set_state(SessionState::Failed(reason));
        self.emit(SessionEvent::Error(reason));
    }

    fn clear_measurement(&mut self) {
        self.motion.reset();
        self.buffer.clear();
        self.clock.reset();
        self.cadence.reset();
        self.history.clear();
        self.last_quality = None;
    }

    fn release_resource(&mut self) {
        if self.resource_held {
            self.backend.release();
            self.resource_held = false;
            tracing::debug!(backend = self.backend.name(), "Acquisition released");
        }
    }

    fn set_state(&mut self, state: SessionState) {
        tracing::debug!(from = ?self.state, to = ?state, "Session state change");
        self.state = state;
        self.emit(SessionEvent::StateChanged(state));
    }

    fn emit(&self, event: SessionEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}

impl Drop for MeasurementSession {
    fn drop(&mut self) {
        self.release_resource();
    }
}
