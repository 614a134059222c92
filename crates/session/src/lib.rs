//! Trimline Session
//!
//! One [`TrimSession`] exists per loaded source. It is created by the screen
//! controller when a video is opened and closed when the user navigates
//! away, so no pool or cache state outlives the source it belongs to.
//!
//! ```text
//! wheel/pan ──► ZoomViewport ──(observer)──► ThumbnailEngine
//!                   │                               │
//!                   ▼                               ▼
//!           strip controller ──┐          cached thumbnails
//!       scrubber controller ───┴──► SelectionRange ──► export
//! ```

pub mod session;

pub use session::{MediaInfo, Surface, TrimSession};
