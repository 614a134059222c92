//! Decode unit capability.

use trimline_common::error::TrimlineResult;
use trimline_timeline_model::SourceDescriptor;

use crate::cache::Thumbnail;

/// Platform capability that seeks a source and renders a frame.
///
/// A unit is bound to exactly one source for its lifetime; a source change
/// creates fresh units. Implementations wrap a hardware decode API, a
/// software decoder, or an OS media framework.
#[async_trait::async_trait]
pub trait DecodeUnit: Send {
    /// Open `source` for seeking. Called once, before any render.
    async fn bind_source(&mut self, source: &SourceDescriptor) -> TrimlineResult<()>;

    /// Seek to `timestamp_secs` and render the presented frame.
    async fn seek_and_render(&mut self, timestamp_secs: f64) -> TrimlineResult<Thumbnail>;

    /// Backend name for logging.
    fn name(&self) -> &str;
}

/// Creates unbound decode units for the pool.
pub trait DecodeUnitFactory: Send + Sync {
    /// Create the unit that will occupy pool slot `index`.
    fn create(&self, index: usize) -> Box<dyn DecodeUnit>;
}

impl<F> DecodeUnitFactory for F
where
    F: Fn(usize) -> Box<dyn DecodeUnit> + Send + Sync,
{
    fn create(&self, index: usize) -> Box<dyn DecodeUnit> {
        self(index)
    }
}

pub mod synthetic;

pub use synthetic::{SyntheticDecoder, SyntheticDecoderConfig, SyntheticFactory};
