//! Acquisition backends.
//!
//! The camera and illumination source live outside this crate. A backend is
//! the boundary to them: the session acquires it on start and releases it on
//! every exit from measuring.

use fingerpulse_model::FailureReason;

pub mod scripted;

pub use scripted::ScriptedBackend;

/// Acquisition failure reported by a backend.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{reason}: {detail}")]
pub struct AcquisitionError {
    pub reason: FailureReason,
    pub detail: String,
}

impl AcquisitionError {
    pub fn new(reason: FailureReason, detail: impl Into<String>) -> Self {
        Self {
            reason,
            detail: detail.into(),
        }
    }

    pub fn permission_denied() -> Self {
        Self::new(FailureReason::PermissionDenied, "access to the camera was refused")
    }

    pub fn camera_unavailable() -> Self {
        Self::new(FailureReason::CameraUnavailable, "no usable camera found")
    }

    pub fn illumination_unavailable() -> Self {
        Self::new(
            FailureReason::IlluminationUnavailable,
            "the light source could not be enabled",
        )
    }
}

/// Interface to the external camera + illumination collaborator.
#[async_trait::async_trait]
pub trait AcquisitionBackend: Send {
    /// Obtain the camera and switch on illumination.
    async fn acquire(&mut self) -> Result<(), AcquisitionError>;

    /// Give the resources back. Must be safe to call when nothing is held.
    fn release(&mut self);

    /// Human-readable backend name for logs.
    fn name(&self) -> &str;
}
