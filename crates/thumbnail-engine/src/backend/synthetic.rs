//! Deterministic software decode unit.
//!
//! Renders a gradient whose colour is derived from the timestamp, after a
//! configurable seek latency. Used by the CLI and tests, and as the
//! reference for how a real unit combines seeking with [`FrameGate`].

use std::time::Duration;

use trimline_common::config::ThumbnailConfig;
use trimline_common::error::{TrimlineError, TrimlineResult};
use trimline_timeline_model::SourceDescriptor;

use super::{DecodeUnit, DecodeUnitFactory};
use crate::cache::{millis_key, Thumbnail};
use crate::frame_gate::{FrameGate, FrameReadiness};

/// Locator schemes the synthetic decoder accepts. Bare paths are accepted too.
const SCHEMES: [&str; 3] = ["memory", "synthetic", "file"];

/// Behaviour of a [`SyntheticDecoder`].
#[derive(Debug, Clone)]
pub struct SyntheticDecoderConfig {
    pub width: u32,
    pub height: u32,
    /// Simulated time for the seek to complete.
    pub seek_latency: Duration,
    /// Whether the decoder ever confirms the presented frame.
    pub signals_frame_ready: bool,
    pub gate: FrameGate,
}

impl Default for SyntheticDecoderConfig {
    fn default() -> Self {
        Self::from_config(&ThumbnailConfig::default())
    }
}

impl SyntheticDecoderConfig {
    pub fn from_config(config: &ThumbnailConfig) -> Self {
        Self {
            width: config.thumbnail_width,
            height: config.thumbnail_height,
            seek_latency: Duration::from_millis(5),
            signals_frame_ready: true,
            gate: FrameGate::from_config(config),
        }
    }
}

/// A decode unit that fabricates frames instead of decoding them.
pub struct SyntheticDecoder {
    config: SyntheticDecoderConfig,
    bound: Option<SourceDescriptor>,
    frames_rendered: u64,
    fallback_frames: u64,
}

impl SyntheticDecoder {
    pub fn new(config: SyntheticDecoderConfig) -> Self {
        Self {
            config,
            bound: None,
            frames_rendered: 0,
            fallback_frames: 0,
        }
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames_rendered
    }

    /// Frames rendered after the frame-ready deadline passed.
    pub fn fallback_frames(&self) -> u64 {
        self.fallback_frames
    }

    fn render(&self, timestamp_secs: f64) -> Thumbnail {
        let width = self.config.width.max(1);
        let height = self.config.height.max(1);
        let shade = (millis_key(timestamp_secs).rem_euclid(256)) as u8;
        let mut data = Vec::with_capacity((width * height * 3) as usize);
        for _y in 0..height {
            for x in 0..width {
                let ramp = ((x * 255) / width) as u8;
                data.extend_from_slice(&[shade, ramp, 255 - shade]);
            }
        }
        Thumbnail::new(width, height, data)
    }
}

#[async_trait::async_trait]
impl DecodeUnit for SyntheticDecoder {
    async fn bind_source(&mut self, source: &SourceDescriptor) -> TrimlineResult<()> {
        let locator = source.locator.trim();
        if locator.is_empty() {
            return Err(TrimlineError::worker_init("source locator is empty"));
        }
        if let Some((scheme, _)) = locator.split_once("://") {
            if !SCHEMES.contains(&scheme) {
                return Err(TrimlineError::unsupported(format!(
                    "synthetic decoder cannot open '{scheme}' locators"
                )));
            }
        }
        self.bound = Some(source.clone());
        Ok(())
    }

    async fn seek_and_render(&mut self, timestamp_secs: f64) -> TrimlineResult<Thumbnail> {
        if self.bound.is_none() {
            return Err(TrimlineError::source("decoder is not bound to a source"));
        }
        if !timestamp_secs.is_finite() || timestamp_secs < 0.0 {
            return Err(TrimlineError::decode(timestamp_secs, "seek target out of range"));
        }

        tokio::time::sleep(self.config.seek_latency).await;

        let readiness = if self.config.signals_frame_ready {
            self.config.gate.settle(tokio::task::yield_now()).await
        } else {
            self.config.gate.settle(std::future::pending::<()>()).await
        };
        if readiness == FrameReadiness::TimedOut {
            self.fallback_frames += 1;
        }

        self.frames_rendered += 1;
        Ok(self.render(timestamp_secs))
    }

    fn name(&self) -> &str {
        "synthetic"
    }
}

/// Factory handing out identically configured synthetic units.
#[derive(Debug, Clone, Default)]
pub struct SyntheticFactory {
    pub config: SyntheticDecoderConfig,
}

impl SyntheticFactory {
    pub fn new(config: SyntheticDecoderConfig) -> Self {
        Self { config }
    }
}

impl DecodeUnitFactory for SyntheticFactory {
    fn create(&self, _index: usize) -> Box<dyn DecodeUnit> {
        Box::new(SyntheticDecoder::new(self.config.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trimline_timeline_model::SourceIdentity;

    fn source() -> SourceDescriptor {
        SourceDescriptor::new(SourceIdentity::from_content_hash("feed"), "memory://clip")
    }

    fn fast_config() -> SyntheticDecoderConfig {
        SyntheticDecoderConfig {
            width: 4,
            height: 2,
            seek_latency: Duration::from_millis(1),
            signals_frame_ready: true,
            gate: FrameGate::new(Duration::from_millis(20)),
        }
    }

    #[tokio::test]
    async fn test_renders_after_bind() {
        let mut unit = SyntheticDecoder::new(fast_config());
        unit.bind_source(&source()).await.unwrap();
        let thumb = unit.seek_and_render(1.5).await.unwrap();
        assert_eq!((thumb.width, thumb.height), (4, 2));
        assert_eq!(thumb.byte_len(), 4 * 2 * 3);
        assert_eq!(unit.frames_rendered(), 1);
        assert_eq!(unit.fallback_frames(), 0);
    }

    #[tokio::test]
    async fn test_unbound_render_fails() {
        let mut unit = SyntheticDecoder::new(fast_config());
        assert!(unit.seek_and_render(1.0).await.is_err());
    }

    #[tokio::test]
    async fn test_empty_locator_fails_to_bind() {
        let mut unit = SyntheticDecoder::new(fast_config());
        let bad = SourceDescriptor::new(SourceIdentity::from_content_hash("feed"), "  ");
        assert!(unit.bind_source(&bad).await.is_err());
    }

    #[tokio::test]
    async fn test_missing_signal_uses_fallback_frame() {
        let mut config = fast_config();
        config.signals_frame_ready = false;
        let mut unit = SyntheticDecoder::new(config);
        unit.bind_source(&source()).await.unwrap();
        assert!(unit.seek_and_render(2.0).await.is_ok());
        assert_eq!(unit.fallback_frames(), 1);
    }

    #[tokio::test]
    async fn test_unknown_scheme_is_unsupported() {
        let mut unit = SyntheticDecoder::new(fast_config());
        let remote = SourceDescriptor::new(
            SourceIdentity::from_content_hash("feed"),
            "rtsp://camera/stream",
        );
        let err = unit.bind_source(&remote).await.unwrap_err();
        assert!(matches!(err, TrimlineError::Unsupported { .. }));
    }

    #[tokio::test]
    async fn test_negative_timestamp_is_a_decode_error() {
        let mut unit = SyntheticDecoder::new(fast_config());
        unit.bind_source(&source()).await.unwrap();
        let err = unit.seek_and_render(-1.0).await.unwrap_err();
        assert!(matches!(err, TrimlineError::Decode { .. }));
    }
}
