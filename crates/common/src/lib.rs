//! Fingerpulse Common Utilities
//!
//! Shared infrastructure for all Fingerpulse crates:
//! - Error types and result aliases
//! - Valid-time clock and evaluation cadence for sample streams
//! - Tracing/logging initialization
//! - Configuration file loading

pub mod clock;
pub mod config;
pub mod error;
pub mod logging;

pub use clock::*;
pub use config::*;
pub use error::*;
