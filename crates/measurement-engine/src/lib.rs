//! Fingerpulse Measurement Engine
//!
//! Runs a heart-rate measurement session over a stream of fingertip frames.
//! The session owns the signal pipeline, tracks valid (quality-gated) time,
//! publishes events, and holds the camera/illumination resource for exactly
//! as long as it is measuring.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐  frames  ┌──────────────────────────────────────────┐
//! │ Sample source│ ───────▶ │ SessionHandle (mpsc, single consumer)    │
//! └──────────────┘          │  ┌────────────────────────────────────┐  │
//!                           │  │ MeasurementSession                 │  │
//!  start/stop/reset ──────▶ │  │  Motion ─▶ Quality ─▶ Buffer       │  │
//!                           │  │             every 1 s valid time:  │  │
//!                           │  │  Filter ─▶ Estimators ─▶ Fusion    │  │
//!                           │  │  on finish: Confidence validator   │  │
//!                           │  └──────────────┬─────────────────────┘  │
//!                           └─────────────────┼────────────────────────┘
//!                                             ▼
//!                              broadcast: SessionEvent
//! ```

pub mod backend;
pub mod config;
pub mod events;
pub mod session;
pub mod synthetic;
pub mod worker;

pub use backend::{AcquisitionBackend, AcquisitionError, ScriptedBackend};
pub use config::{AppConfig, SessionConfig};
pub use events::SessionEvent;
pub use session::{FrameOutcome, MeasurementSession, SessionState};
pub use synthetic::{SyntheticConfig, SyntheticPulse};
pub use worker::SessionHandle;
