//! Frame-ready signal with a fallback deadline.
//!
//! After a seek, decoders report the presented frame through some callback
//! that may fire late or not at all. Units race that signal against a fixed
//! delay and render whatever frame is current when either wins. Frames taken
//! on the fallback path may be a frame or two off the requested time.

use std::future::Future;
use std::time::Duration;

use trimline_common::config::ThumbnailConfig;

/// Which side of the race finished first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameReadiness {
    /// The decoder confirmed the frame for the requested time.
    Signaled,
    /// The deadline passed first; the current frame is used as-is.
    TimedOut,
}

/// Races a frame-ready signal against a fallback deadline.
#[derive(Debug, Clone, Copy)]
pub struct FrameGate {
    timeout: Duration,
}

impl FrameGate {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn from_config(config: &ThumbnailConfig) -> Self {
        Self::new(Duration::from_millis(config.frame_ready_timeout_ms))
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Wait for `signal` or the deadline, whichever comes first.
    ///
    /// Any completion of `signal` counts as ready; its output is discarded.
    pub async fn settle<F>(&self, signal: F) -> FrameReadiness
    where
        F: Future,
    {
        match tokio::time::timeout(self.timeout, signal).await {
            Ok(_) => FrameReadiness::Signaled,
            Err(_) => {
                tracing::trace!(
                    timeout_ms = self.timeout.as_millis() as u64,
                    "frame-ready signal missed, using current frame"
                );
                FrameReadiness::TimedOut
            }
        }
    }
}

impl Default for FrameGate {
    fn default() -> Self {
        Self::from_config(&ThumbnailConfig::default())
    }
}
