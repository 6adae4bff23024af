//! Backend with a predetermined outcome, for tests and offline replay.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use super::{AcquisitionBackend, AcquisitionError};

/// Succeeds or fails as configured and counts acquire/release calls.
///
/// The counters are shared, so a clone taken before the backend is moved
/// into a session still observes it.
#[derive(Debug, Clone)]
pub struct ScriptedBackend {
    outcome: Result<(), AcquisitionError>,
    acquired: Arc<AtomicUsize>,
    released: Arc<AtomicUsize>,
    held: bool,
}

impl ScriptedBackend {
    pub fn succeeding() -> Self {
        Self::with_outcome(Ok(()))
    }

    pub fn failing(error: AcquisitionError) -> Self {
        Self::with_outcome(Err(error))
    }

    fn with_outcome(outcome: Result<(), AcquisitionError>) -> Self {
        Self {
            outcome,
            acquired: Arc::new(AtomicUsize::new(0)),
            released: Arc::new(AtomicUsize::new(0)),
            held: false,
        }
    }

    /// Successful acquisitions so far.
    pub fn acquire_count(&self) -> usize {
        self.acquired.load(Ordering::SeqCst)
    }

    /// Releases of a held resource so far.
    pub fn release_count(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }

    /// Whether every successful acquisition has been released.
    pub fn is_balanced(&self) -> bool {
        self.acquire_count() == self.release_count()
    }
}

#[async_trait::async_trait]
impl AcquisitionBackend for ScriptedBackend {
    async fn acquire(&mut self) -> Result<(), AcquisitionError> {
        self.outcome.clone()?;
        self.held = true;
        self.acquired.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn release(&mut self) {
        if self.held {
            self.held = false;
            self.released.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fingerpulse_model::FailureReason;

    #[tokio::test]
    async fn test_counts_are_shared_between_clones() {
        let mut backend = ScriptedBackend::succeeding();
        let counts = backend.clone();

        backend.acquire().await.unwrap();
        assert_eq!(counts.acquire_count(), 1);
        assert!(!counts.is_balanced());

        backend.release();
        backend.release();
        assert_eq!(counts.release_count(), 1);
        assert!(counts.is_balanced());
    }

    #[tokio::test]
    async fn test_failing_backend_reports_reason() {
        let mut backend = ScriptedBackend::failing(AcquisitionError::permission_denied());
        let err = backend.acquire().await.unwrap_err();
        assert_eq!(err.reason, FailureReason::PermissionDenied);
        assert_eq!(backend.acquire_count(), 0);
    }
}
