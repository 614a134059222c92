//! Trimline Common Utilities
//!
//! Shared infrastructure for all Trimline crates:
//! - Error types and result aliases
//! - Frame/time conversion and pointer-to-time mapping
//! - Tracing/logging initialization
//! - Configuration loading

pub mod config;
pub mod error;
pub mod logging;
pub mod timecode;

pub use config::*;
pub use error::*;
pub use timecode::*;
