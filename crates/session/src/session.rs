//! Trimming session management.

use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use trimline_common::config::AppConfig;
use trimline_common::error::{TrimlineError, TrimlineResult};
use trimline_scrub_control::{DragHost, FullRange, NoopHost, SelectionController, ViewportRange};
use trimline_thumbnail_engine::backend::DecodeUnitFactory;
use trimline_thumbnail_engine::{EngineEvent, Thumbnail, ThumbnailEngine};
use trimline_timeline_model::{
    MarkerKind, SelectionRange, SourceDescriptor, SubscriptionId, ViewportState, ZoomViewport,
};

/// Margin kept between a followed playhead and the strip edges.
const PLAYHEAD_MARGIN: f64 = 0.1;

type BoxedHost = Box<dyn DragHost + Send>;

/// Probe results for the loaded source.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MediaInfo {
    /// Total duration in seconds.
    pub duration_secs: f64,

    /// Best-effort framerate; non-positive when the probe found none.
    pub fps: f64,
}

impl MediaInfo {
    pub fn new(duration_secs: f64, fps: f64) -> Self {
        Self { duration_secs, fps }
    }
}

/// Which timeline surface a pointer gesture happened on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Surface {
    /// Full-length scrubber, always mapping the whole source.
    Scrubber,
    /// Zoomable thumbnail strip.
    Strip,
}

/// Everything the trimming screen needs for one source.
pub struct TrimSession {
    source: SourceDescriptor,
    media: MediaInfo,
    /// Width of the zoomed strip; the scrubber width arrives with each pointer move.
    container_width: f64,
    config: AppConfig,
    engine: ThumbnailEngine,
    viewport: Arc<Mutex<ZoomViewport>>,
    subscription: SubscriptionId,
    selection: SelectionRange,
    scrubber: SelectionController<FullRange, BoxedHost>,
    strip: SelectionController<ViewportRange, BoxedHost>,
}

impl std::fmt::Debug for TrimSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrimSession")
            .field("source", &self.source.identity)
            .field("media", &self.media)
            .field("container_width", &self.container_width)
            .field("engine", &self.engine)
            .field("selection", &self.selection)
            .finish()
    }
}

impl TrimSession {
    /// Open `source`: bind the thumbnail pool, build the viewport, and
    /// request the initial strip.
    ///
    /// Must be called from within a Tokio runtime. Returns an error only for
    /// unusable inputs; a pool whose units all fail to bind still yields a
    /// session, just one without thumbnails.
    pub async fn load(
        source: SourceDescriptor,
        media: MediaInfo,
        container_width: f64,
        factory: Arc<dyn DecodeUnitFactory>,
        config: &AppConfig,
    ) -> TrimlineResult<Self> {
        config.validate()?;
        let media = resolve_media(media, config)?;

        tracing::info!(
            source = %source.identity,
            duration = media.duration_secs,
            fps = media.fps,
            "loading trim session"
        );

        let engine = ThumbnailEngine::bind(source.clone(), factory, config.thumbnails.clone()).await;

        let mut viewport =
            ZoomViewport::from_config(media.duration_secs, media.fps, container_width, &config.viewport);
        let subscription = viewport.subscribe(thumbnail_requester(engine.clone()));
        let viewport = Arc::new(Mutex::new(viewport));

        let session = Self {
            source,
            media,
            container_width,
            config: config.clone(),
            engine,
            subscription,
            selection: SelectionRange::full(media.duration_secs),
            scrubber: SelectionController::new(
                FullRange::new(media.duration_secs, media.fps),
                Box::new(NoopHost) as BoxedHost,
            ),
            strip: SelectionController::new(
                ViewportRange::new(Arc::clone(&viewport)),
                Box::new(NoopHost) as BoxedHost,
            ),
            viewport,
        };
        session.request_visible();
        Ok(session)
    }

    /// Switch to another source. Thumbnails, viewport, and selection start over.
    pub async fn change_source(
        &mut self,
        source: SourceDescriptor,
        media: MediaInfo,
    ) -> TrimlineResult<()> {
        let media = resolve_media(media, &self.config)?;
        self.scrubber.destroy();
        self.strip.destroy();

        self.engine.rebind(source.clone()).await;

        {
            let mut viewport = lock(&self.viewport);
            viewport.unsubscribe(self.subscription);
            *viewport = ZoomViewport::from_config(
                media.duration_secs,
                media.fps,
                self.container_width,
                &self.config.viewport,
            );
            self.subscription = viewport.subscribe(thumbnail_requester(self.engine.clone()));
        }
        *self.scrubber.range_mut() = FullRange::new(media.duration_secs, media.fps);
        self.selection = SelectionRange::full(media.duration_secs);
        self.source = source;
        self.media = media;

        tracing::info!(source = %self.source.identity, "trim session switched source");
        self.request_visible();
        Ok(())
    }

    /// Shut the engine down and release any pointer listeners.
    pub fn close(mut self) {
        self.scrubber.destroy();
        self.strip.destroy();
        lock(&self.viewport).unsubscribe(self.subscription);
        self.engine.shutdown();
        tracing::info!(source = %self.source.identity, "trim session closed");
    }

    /// Replace the UI hosts of both drag surfaces.
    pub fn set_drag_hosts(&mut self, scrubber: BoxedHost, strip: BoxedHost) {
        self.scrubber.set_host(scrubber);
        self.strip.set_host(strip);
    }

    // ── Accessors ───────────────────────────────────────────────────

    pub fn source(&self) -> &SourceDescriptor {
        &self.source
    }

    pub fn media(&self) -> MediaInfo {
        self.media
    }

    pub fn engine(&self) -> &ThumbnailEngine {
        &self.engine
    }

    /// Current selection, for the export subsystem.
    pub fn selection(&self) -> SelectionRange {
        self.selection
    }

    pub fn viewport_state(&self) -> ViewportState {
        lock(&self.viewport).snapshot()
    }

    pub fn events(&self) -> broadcast::Receiver<EngineEvent> {
        self.engine.subscribe()
    }

    // ── Thumbnails ──────────────────────────────────────────────────

    /// Request the visible strip and return whatever is already cached.
    pub fn refresh_thumbnails(&self) -> Vec<(f64, Thumbnail)> {
        let timestamps = lock(&self.viewport).timestamps();
        self.engine.request_thumbnails(&timestamps);
        self.engine.get_thumbnails(&timestamps)
    }

    fn request_visible(&self) {
        let timestamps = lock(&self.viewport).timestamps();
        self.engine.request_thumbnails(&timestamps);
    }

    // ── Viewport ────────────────────────────────────────────────────

    /// Wheel over the strip at `pointer_x`.
    pub fn wheel(&mut self, pointer_x: f64, delta_sign: f64) {
        lock(&self.viewport).handle_wheel(pointer_x, delta_sign, self.container_width);
    }

    pub fn set_visible_range(&mut self, start_secs: f64, duration_secs: f64) {
        lock(&self.viewport).set_visible_range(start_secs, duration_secs);
    }

    pub fn pan_by(&mut self, fraction: f64) {
        lock(&self.viewport).pan_by(fraction);
    }

    pub fn set_zoom_level(&mut self, level: f64) {
        lock(&self.viewport).set_zoom_level(level);
    }

    pub fn reset_zoom(&mut self) {
        lock(&self.viewport).reset_zoom();
    }

    pub fn set_container_width(&mut self, container_width: f64) {
        self.container_width = container_width;
        lock(&self.viewport).set_container_width(container_width);
    }

    /// Apply a late framerate estimate to the viewport and the scrubber.
    /// Non-positive estimates fall back to the configured framerate.
    pub fn set_framerate(&mut self, fps: f64) {
        let fps = resolve_fps(fps, &self.config);
        self.media.fps = fps;
        *self.scrubber.range_mut() = FullRange::new(self.media.duration_secs, fps);
        lock(&self.viewport).set_framerate(fps);
        tracing::debug!(fps, "trim session framerate updated");
    }

    /// Keep a playing position on screen. Returns whether the strip scrolled.
    pub fn follow_playhead(&mut self, t: f64) -> bool {
        lock(&self.viewport).ensure_visible(t, PLAYHEAD_MARGIN)
    }

    // ── Selection ───────────────────────────────────────────────────

    pub fn pointer_down(&mut self, surface: Surface, marker: MarkerKind) {
        match surface {
            Surface::Scrubber => self.scrubber.pointer_down(marker),
            Surface::Strip => self.strip.pointer_down(marker),
        }
    }

    /// Pointer moved during a drag over a surface `container_width` pixels
    /// wide. Returns the snapped time of the dragged handle.
    pub fn pointer_move(
        &mut self,
        surface: Surface,
        pixel_x: f64,
        container_width: f64,
    ) -> Option<f64> {
        match surface {
            Surface::Scrubber => {
                self.scrubber
                    .pointer_move(&mut self.selection, pixel_x, container_width)
            }
            Surface::Strip => self
                .strip
                .pointer_move(&mut self.selection, pixel_x, container_width),
        }
    }

    pub fn pointer_up(&mut self, surface: Surface) {
        match surface {
            Surface::Scrubber => self.scrubber.pointer_up(),
            Surface::Strip => self.strip.pointer_up(),
        }
    }

    pub fn mark_start(&mut self, t: f64) -> MarkerKind {
        self.scrubber.mark_start(&mut self.selection, t)
    }

    pub fn mark_end(&mut self, t: f64) -> MarkerKind {
        self.scrubber.mark_end(&mut self.selection, t)
    }

    pub fn nudge(&mut self, marker: MarkerKind, frames: i64) -> MarkerKind {
        self.scrubber.nudge(&mut self.selection, marker, frames)
    }
}

fn lock(viewport: &Mutex<ZoomViewport>) -> MutexGuard<'_, ZoomViewport> {
    viewport.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Viewport observer that keeps the engine fed with the visible timestamps.
fn thumbnail_requester(engine: ThumbnailEngine) -> impl FnMut(&ViewportState) + Send + 'static {
    move |state: &ViewportState| {
        engine.request_thumbnails(&state.timestamps);
    }
}

/// Check the probed duration and apply the configured fallback framerate.
fn resolve_media(media: MediaInfo, config: &AppConfig) -> TrimlineResult<MediaInfo> {
    if !media.duration_secs.is_finite() || media.duration_secs < 0.0 {
        return Err(TrimlineError::source(format!(
            "source duration must be a finite, non-negative number of seconds (got {})",
            media.duration_secs
        )));
    }
    Ok(MediaInfo::new(media.duration_secs, resolve_fps(media.fps, config)))
}

fn resolve_fps(fps: f64, config: &AppConfig) -> f64 {
    if fps.is_finite() && fps > 0.0 {
        return fps;
    }
    tracing::debug!(
        probed = fps,
        fallback = config.viewport.fallback_fps,
        "no usable framerate"
    );
    config.viewport.fallback_fps
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_media_uses_configured_fallback() {
        let mut config = AppConfig::default();
        config.viewport.fallback_fps = 24.0;
        let media = resolve_media(MediaInfo::new(10.0, 0.0), &config).unwrap();
        assert_eq!(media.fps, 24.0);
        let media = resolve_media(MediaInfo::new(10.0, 60.0), &config).unwrap();
        assert_eq!(media.fps, 60.0);
    }

    #[test]
    fn test_resolve_media_rejects_bad_duration() {
        let config = AppConfig::default();
        assert!(resolve_media(MediaInfo::new(f64::NAN, 30.0), &config).is_err());
        assert!(resolve_media(MediaInfo::new(-1.0, 30.0), &config).is_err());
        assert!(resolve_media(MediaInfo::new(0.0, 30.0), &config).is_ok());
    }

    #[test]
    fn test_surface_serde() {
        assert_eq!(serde_json::to_string(&Surface::Strip).unwrap(), "\"strip\"");
    }
}
