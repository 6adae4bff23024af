//! Single-consumer frame worker.
//!
//! Frames go through a bounded queue to one task that owns the processing
//! order. Control calls take the same lock as frame processing, so a
//! `stop()` never interleaves with half a frame and two evaluation cycles
//! never run at once.

use std::sync::Arc;

use fingerpulse_common::error::{PulseError, PulseResult};
use fingerpulse_model::{FailureReason, MeasurementSummary, Sample};
use tokio::sync::{broadcast, mpsc, Mutex};
use tokio::task::JoinHandle;

use crate::events::SessionEvent;
use crate::session::{MeasurementSession, SessionState};

/// Queued, shareable front end to a [`MeasurementSession`].
pub struct SessionHandle {
    session: Arc<Mutex<MeasurementSession>>,
    frames: mpsc::Sender<Sample>,
    events: broadcast::Sender<SessionEvent>,
    worker: JoinHandle<()>,
}

impl SessionHandle {
    /// Move `session` behind the worker. Must be called inside a tokio runtime.
    pub fn spawn(session: MeasurementSession) -> Self {
        let events = session.event_sender();
        let (frames, mut queue) = mpsc::channel(session.config().frame_queue_capacity);
        let session = Arc::new(Mutex::new(session));

        let consumer = Arc::clone(&session);
        let worker = tokio::spawn(async move {
            let mut processed: u64 = 0;
            while let Some(sample) = queue.recv().await {
                consumer.lock().await.on_frame(sample);
                processed += 1;
            }
            tracing::debug!(processed, "Frame worker drained");
        });

        Self {
            session,
            frames,
            events,
            worker,
        }
    }

    /// Queue a frame, waiting if the queue is full.
    pub async fn push_frame(&self, sample: Sample) -> PulseResult<()> {
        self.frames
            .send(sample)
            .await
            .map_err(|_| PulseError::processing("Frame worker has stopped"))
    }

    pub async fn start(&self) -> PulseResult<()> {
        self.session.lock().await.start().await
    }

    pub async fn stop(&self) -> PulseResult<Option<MeasurementSummary>> {
        self.session.lock().await.stop()
    }

    pub async fn abort(&self, reason: FailureReason) -> PulseResult<()> {
        self.session.lock().await.abort(reason)
    }

    pub async fn reset(&self) {
        self.session.lock().await.reset();
    }

    pub async fn report_source_error(&self, reason: FailureReason) {
        self.session.lock().await.on_source_error(reason);
    }

    pub async fn state(&self) -> SessionState {
        self.session.lock().await.state()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Close the queue, wait for every queued frame to be processed, and
    /// hand the session back.
    pub async fn shutdown(self) -> PulseResult<MeasurementSession> {
        let Self {
            session,
            frames,
            worker,
            ..
        } = self;
        drop(frames);
        worker
            .await
            .map_err(|e| PulseError::processing(format!("Frame worker failed: {e}")))?;

        Arc::try_unwrap(session)
            .map(Mutex::into_inner)
            .map_err(|_| PulseError::invalid_state("Session still shared after shutdown"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::ScriptedBackend;
    use crate::config::SessionConfig;

    #[tokio::test]
    async fn test_frames_are_processed_in_order() {
        let session =
            MeasurementSession::new(SessionConfig::default(), Box::new(ScriptedBackend::succeeding()))
                .unwrap();
        let handle = SessionHandle::spawn(session);
        handle.start().await.unwrap();

        for i in 0..120 {
            let t = i as f64 / 30.0;
            handle
                .push_frame(Sample::new(180.0, 40.0, 30.0, t))
                .await
                .unwrap();
        }

        let session = handle.shutdown().await.unwrap();
        // In-order delivery yields exactly 119 capped frame deltas.
        assert!((session.valid_elapsed_secs() - 119.0 / 30.0).abs() < 1e-9);
        assert_eq!(session.state(), SessionState::Measuring);
    }

    #[tokio::test]
    async fn test_control_calls_through_handle() {
        let backend = ScriptedBackend::succeeding();
        let counts = backend.clone();
        let session = MeasurementSession::new(SessionConfig::default(), Box::new(backend)).unwrap();
        let handle = SessionHandle::spawn(session);
        let mut rx = handle.subscribe();

        handle.start().await.unwrap();
        assert_eq!(handle.state().await, SessionState::Measuring);
        assert_eq!(
            rx.recv().await.unwrap(),
            SessionEvent::StateChanged(SessionState::Acquiring)
        );

        handle.report_source_error(FailureReason::IlluminationUnavailable).await;
        assert_eq!(
            handle.state().await,
            SessionState::Failed(FailureReason::IlluminationUnavailable)
        );
        assert!(counts.is_balanced());

        handle.reset().await;
        assert_eq!(handle.state().await, SessionState::Idle);
    }
}
