//! Visible-range accessors injected into a [`SelectionController`](crate::SelectionController).

use std::sync::{Arc, Mutex};

use trimline_common::timecode::effective_fps;
use trimline_timeline_model::{VisibleRange, ZoomViewport};

/// The time span a drag surface maps its pixels onto.
pub trait VisibleRangeSource {
    /// Range currently spanning the surface, read at every pointer move.
    fn visible_range(&self) -> VisibleRange;

    /// Framerate used for snapping.
    fn fps(&self) -> f64;

    /// Upper bound for snapped times.
    fn total_duration(&self) -> f64;
}

/// The whole source, as shown by the full-length scrubber.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FullRange {
    pub duration_secs: f64,
    pub fps: f64,
}

impl FullRange {
    pub fn new(duration_secs: f64, fps: f64) -> Self {
        Self {
            duration_secs: duration_secs.max(0.0),
            fps: effective_fps(fps),
        }
    }
}

impl VisibleRangeSource for FullRange {
    fn visible_range(&self) -> VisibleRange {
        VisibleRange::new(0.0, self.duration_secs)
    }

    fn fps(&self) -> f64 {
        self.fps
    }

    fn total_duration(&self) -> f64 {
        self.duration_secs
    }
}

/// Whatever the shared zoom viewport currently shows.
#[derive(Debug, Clone)]
pub struct ViewportRange {
    viewport: Arc<Mutex<ZoomViewport>>,
}

impl ViewportRange {
    pub fn new(viewport: Arc<Mutex<ZoomViewport>>) -> Self {
        Self { viewport }
    }

    fn read<T>(&self, f: impl FnOnce(&ZoomViewport) -> T) -> T {
        let viewport = self
            .viewport
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&viewport)
    }
}

impl VisibleRangeSource for ViewportRange {
    fn visible_range(&self) -> VisibleRange {
        self.read(ZoomViewport::visible_range)
    }

    fn fps(&self) -> f64 {
        self.read(ZoomViewport::effective_fps)
    }

    fn total_duration(&self) -> f64 {
        self.read(ZoomViewport::total_duration)
    }
}
