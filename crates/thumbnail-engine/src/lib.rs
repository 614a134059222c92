//! Trimline Thumbnail Engine
//!
//! Resolves thumbnails for the visible slots of the timeline strip. Cached
//! frames are returned synchronously; misses are queued and backfilled by a
//! bounded pool of decode units bound to the current source.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────┐
//! │                 ThumbnailEngine                   │
//! │                                                   │
//! │  request ──► PendingQueue ──► drain loop          │
//! │                                 │                 │
//! │              ┌──────────┬───────┴──┬──────────┐   │
//! │              ▼          ▼          ▼          ▼   │
//! │          DecodeUnit DecodeUnit DecodeUnit DecodeUnit
//! │              │          │          │          │   │
//! │              └──────────┴────┬─────┴──────────┘   │
//! │                              ▼  (one merge/batch) │
//! │                       ThumbnailCache ◄── get      │
//! └───────────────────────────────────────────────────┘
//! ```
//!
//! Units are logical resources, not threads. Any real parallelism comes
//! from the platform decoder behind [`backend::DecodeUnit`].

pub mod backend;
pub mod cache;
pub mod engine;
pub mod frame_gate;
pub mod queue;

pub use cache::{CacheKey, Thumbnail, ThumbnailCache};
pub use engine::*;
pub use frame_gate::{FrameGate, FrameReadiness};
