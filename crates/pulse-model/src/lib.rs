//! Fingerpulse Data Model
//!
//! Defines the data contracts shared by the signal pipeline and the
//! measurement session:
//! - **Samples:** Per-frame color averages and the accepted red-channel points
//! - **Readings:** Signal quality, per-method BPM estimates, fused readings
//! - **Outcomes:** The measurement summary handed downstream and failure reasons
//!
//! Color channels are raw `[0, 255]` averages over the frame's center region.
//! Timestamps are monotonic seconds from the sample source.

pub mod reading;
pub mod sample;

pub use reading::*;
pub use sample::*;
