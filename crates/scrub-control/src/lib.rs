//! Trimline Scrub Control
//!
//! Pointer-driven editing of the trim selection:
//! - **Range sources:** which slice of the timeline a surface maps pixels onto
//! - **Drag hosts:** the UI-side listener and preview plumbing
//! - **Selection controller:** frame snapping and start/end auto-swap
//!
//! The full scrubber and the zoomed strip each own one controller; they
//! differ only in the [`VisibleRangeSource`] they are built with.

pub mod controller;
pub mod host;
pub mod range;

pub use controller::SelectionController;
pub use host::{DragEvent, DragHost, NoopHost, RecordingHost};
pub use range::{FullRange, ViewportRange, VisibleRangeSource};
