//! Zoomable visible range of the thumbnail strip.
//!
//! The strip shows a fixed number of slots. Zooming changes how much of the
//! source those slots cover; it never changes the slot count. The visible
//! range is stored as the last *requested* start/duration and every derived
//! quantity (clamped range, timestamps, zoom level) is recomputed from it.
//!
//! Until the first zoom or pan the strip is pinned to the full duration.
//! That latch is one-way.

use serde::{Deserialize, Serialize};

use trimline_common::config::ViewportConfig;
use trimline_common::timecode::effective_fps;

/// Tolerance for end-of-source comparisons.
const EPSILON: f64 = 1e-9;

/// A visible sub-range of the source.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VisibleRange {
    /// First visible second.
    pub start_secs: f64,
    /// Length of the visible range in seconds.
    pub duration_secs: f64,
}

impl VisibleRange {
    pub fn new(start_secs: f64, duration_secs: f64) -> Self {
        Self {
            start_secs,
            duration_secs,
        }
    }

    /// Last visible second.
    pub fn end_secs(&self) -> f64 {
        self.start_secs + self.duration_secs
    }

    pub fn contains(&self, t: f64) -> bool {
        t >= self.start_secs && t <= self.end_secs()
    }
}

/// Pixel geometry of the slot strip.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SlotGeometry {
    /// Container width in pixels, as reported by the layout observer.
    pub container_width: f64,
    /// Width of one slot in pixels.
    pub slot_width: f64,
    /// Gap between slots in pixels.
    pub slot_gap: f64,
}

impl SlotGeometry {
    pub fn new(container_width: f64, slot_width: f64, slot_gap: f64) -> Self {
        Self {
            container_width,
            slot_width,
            slot_gap,
        }
    }

    /// Geometry for `container_width` using configured slot sizes.
    pub fn from_config(container_width: f64, config: &ViewportConfig) -> Self {
        Self::new(container_width, config.slot_width, config.slot_gap)
    }

    /// Number of whole slots that fit in the container, never less than one.
    pub fn slot_count(&self) -> usize {
        let pitch = self.slot_width + self.slot_gap;
        if !self.container_width.is_finite() || !pitch.is_finite() || pitch <= 0.0 {
            return 1;
        }
        let fit = ((self.container_width + self.slot_gap) / pitch).floor();
        if fit.is_finite() && fit >= 1.0 {
            fit as usize
        } else {
            1
        }
    }
}

/// Derived viewport state delivered to observers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewportState {
    pub start_secs: f64,
    pub duration_secs: f64,
    /// 0.0 = whole source visible, 1.0 = fully zoomed in.
    pub zoom_level: f64,
    pub slot_count: usize,
    /// Spacing between neighbouring slot timestamps.
    pub interval_secs: f64,
    /// One timestamp per visible slot, ascending.
    pub timestamps: Vec<f64>,
    /// Whether the first zoom/pan has happened.
    pub zoomed: bool,
}

/// Handle returned by [`ZoomViewport::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Observer = Box<dyn FnMut(&ViewportState) + Send>;

/// Viewport state machine for one loaded source.
pub struct ZoomViewport {
    total_duration: f64,
    fps: f64,
    geometry: SlotGeometry,
    zoom_step: f64,
    requested_start: f64,
    requested_duration: f64,
    zoomed: bool,
    observers: Vec<(SubscriptionId, Observer)>,
    next_subscription: u64,
}

impl std::fmt::Debug for ZoomViewport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZoomViewport")
            .field("total_duration", &self.total_duration)
            .field("fps", &self.fps)
            .field("geometry", &self.geometry)
            .field("requested_start", &self.requested_start)
            .field("requested_duration", &self.requested_duration)
            .field("zoomed", &self.zoomed)
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl ZoomViewport {
    /// Default duration multiplier for one zoom-in step.
    pub const DEFAULT_ZOOM_STEP: f64 = 0.85;

    /// Create an unzoomed viewport over `total_duration` seconds.
    pub fn new(total_duration: f64, fps: f64, geometry: SlotGeometry) -> Self {
        let total_duration = if total_duration.is_finite() {
            total_duration.max(0.0)
        } else {
            0.0
        };
        Self {
            total_duration,
            fps,
            geometry,
            zoom_step: Self::DEFAULT_ZOOM_STEP,
            requested_start: 0.0,
            requested_duration: total_duration,
            zoomed: false,
            observers: Vec::new(),
            next_subscription: 0,
        }
    }

    /// Create a viewport using configured slot sizes and zoom step.
    pub fn from_config(
        total_duration: f64,
        fps: f64,
        container_width: f64,
        config: &ViewportConfig,
    ) -> Self {
        Self::new(
            total_duration,
            fps,
            SlotGeometry::from_config(container_width, config),
        )
        .with_zoom_step(config.zoom_step)
    }

    /// Override the zoom-in multiplier. Values outside `(0, 1)` are ignored.
    pub fn with_zoom_step(mut self, step: f64) -> Self {
        if step > 0.0 && step < 1.0 {
            self.zoom_step = step;
        }
        self
    }

    // ── Derived quantities ──────────────────────────────────────────

    pub fn total_duration(&self) -> f64 {
        self.total_duration
    }

    /// Framerate used for frame math (probe value or fallback).
    pub fn effective_fps(&self) -> f64 {
        effective_fps(self.fps)
    }

    pub fn geometry(&self) -> SlotGeometry {
        self.geometry
    }

    pub fn is_zoomed(&self) -> bool {
        self.zoomed
    }

    pub fn slot_count(&self) -> usize {
        self.geometry.slot_count()
    }

    /// Shortest visible duration: one frame per slot, capped at the source length.
    pub fn min_visible_duration(&self) -> f64 {
        (self.slot_count() as f64 / self.effective_fps()).min(self.total_duration)
    }

    /// Visible duration after clamping (full duration until the first zoom/pan).
    pub fn visible_duration(&self) -> f64 {
        if !self.zoomed {
            return self.total_duration;
        }
        self.clamp_duration(self.requested_duration)
    }

    /// Visible start after clamping so the range stays inside the source.
    pub fn visible_start(&self) -> f64 {
        self.clamp_start(self.requested_start, self.visible_duration())
    }

    pub fn visible_range(&self) -> VisibleRange {
        VisibleRange::new(self.visible_start(), self.visible_duration())
    }

    /// Spacing between slot timestamps.
    pub fn interval(&self) -> f64 {
        let slots = self.slot_count();
        let duration = self.visible_duration();
        if slots <= 1 {
            duration
        } else {
            duration / (slots - 1) as f64
        }
    }

    /// Evenly spaced slot timestamps covering the visible range.
    pub fn timestamps(&self) -> Vec<f64> {
        if self.total_duration <= 0.0 {
            return Vec::new();
        }
        let start = self.visible_start();
        let interval = self.interval();
        (0..self.slot_count())
            .map(|i| start + i as f64 * interval)
            .filter(|t| *t <= self.total_duration + EPSILON)
            .map(|t| t.min(self.total_duration))
            .collect()
    }

    /// How far the view is zoomed in, from 0.0 (whole source) to 1.0 (minimum duration).
    pub fn zoom_level(&self) -> f64 {
        let span = self.total_duration - self.min_visible_duration();
        if span <= EPSILON {
            return 0.0;
        }
        ((self.total_duration - self.visible_duration()) / span).clamp(0.0, 1.0)
    }

    /// Current derived state.
    pub fn snapshot(&self) -> ViewportState {
        ViewportState {
            start_secs: self.visible_start(),
            duration_secs: self.visible_duration(),
            zoom_level: self.zoom_level(),
            slot_count: self.slot_count(),
            interval_secs: self.interval(),
            timestamps: self.timestamps(),
            zoomed: self.zoomed,
        }
    }

    // ── Mutations ───────────────────────────────────────────────────

    /// Pointer-anchored wheel zoom.
    ///
    /// `delta_sign < 0` zooms in, `> 0` zooms out, `0` is ignored. The time
    /// under `pointer_x` before the step stays under `pointer_x` after it.
    pub fn handle_wheel(&mut self, pointer_x: f64, delta_sign: f64, container_width: f64) {
        if delta_sign == 0.0 || delta_sign.is_nan() {
            return;
        }
        self.latch();

        let fraction = pointer_fraction(pointer_x, container_width);
        let before = self.visible_range();
        let anchor = before.start_secs + fraction * before.duration_secs;

        let factor = if delta_sign < 0.0 {
            self.zoom_step
        } else {
            1.0 / self.zoom_step
        };
        let duration = self.clamp_duration(before.duration_secs * factor);
        let start = self.clamp_start(anchor - fraction * duration, duration);

        tracing::trace!(
            anchor,
            fraction,
            from = before.duration_secs,
            to = duration,
            "wheel zoom"
        );

        self.requested_duration = duration;
        self.requested_start = start;
        self.notify();
    }

    /// Center the current visible duration on `fraction` of the whole source.
    pub fn set_zoom_center(&mut self, fraction: f64) {
        if fraction.is_nan() {
            return;
        }
        self.latch();
        let duration = self.visible_duration();
        let center = fraction.clamp(0.0, 1.0) * self.total_duration;
        self.requested_duration = duration;
        self.requested_start = self.clamp_start(center - duration / 2.0, duration);
        self.notify();
    }

    /// Directly set the visible range (panning, nudges, playhead follow).
    pub fn set_visible_range(&mut self, start_secs: f64, duration_secs: f64) {
        if !start_secs.is_finite() || !duration_secs.is_finite() {
            return;
        }
        self.latch();
        let duration = self.clamp_duration(duration_secs);
        self.requested_duration = duration;
        self.requested_start = self.clamp_start(start_secs, duration);
        self.notify();
    }

    /// Pan by a fraction of the visible duration (negative pans left).
    pub fn pan_by(&mut self, fraction: f64) {
        let range = self.visible_range();
        self.set_visible_range(
            range.start_secs + fraction * range.duration_secs,
            range.duration_secs,
        );
    }

    /// Scroll so `t` stays at least `margin_fraction` of the view away from
    /// either edge. Returns whether the range moved. Does nothing while the
    /// view is unzoomed, since the whole source is visible then.
    pub fn ensure_visible(&mut self, t: f64, margin_fraction: f64) -> bool {
        if !self.zoomed || !t.is_finite() {
            return false;
        }
        let range = self.visible_range();
        let margin = range.duration_secs * margin_fraction.clamp(0.0, 0.5);
        let start = if t < range.start_secs + margin {
            t - margin
        } else if t > range.end_secs() - margin {
            t - range.duration_secs + margin
        } else {
            return false;
        };
        let clamped = self.clamp_start(start, range.duration_secs);
        if (clamped - range.start_secs).abs() <= EPSILON {
            return false;
        }
        self.set_visible_range(clamped, range.duration_secs);
        true
    }

    /// Set the zoom level directly (slider), keeping the current center.
    pub fn set_zoom_level(&mut self, level: f64) {
        if level.is_nan() {
            return;
        }
        let range = self.visible_range();
        let center = range.start_secs + range.duration_secs / 2.0;
        let min = self.min_visible_duration();
        let duration = self.total_duration - level.clamp(0.0, 1.0) * (self.total_duration - min);
        self.set_visible_range(center - duration / 2.0, duration);
    }

    /// Show the whole source again. The zoom latch stays set.
    pub fn reset_zoom(&mut self) {
        self.set_visible_range(0.0, self.total_duration);
    }

    /// Layout collaborator reported a new container width.
    pub fn set_container_width(&mut self, container_width: f64) {
        self.geometry.container_width = container_width;
        self.notify();
    }

    /// Framerate probe delivered a (new) estimate.
    pub fn set_framerate(&mut self, fps: f64) {
        self.fps = fps;
        self.notify();
    }

    // ── Subscription ────────────────────────────────────────────────

    /// Register an observer called synchronously after every mutation.
    pub fn subscribe(
        &mut self,
        observer: impl FnMut(&ViewportState) + Send + 'static,
    ) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.observers.push((id, Box::new(observer)));
        id
    }

    /// Remove an observer. Returns whether it was registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(sid, _)| *sid != id);
        self.observers.len() != before
    }

    fn notify(&mut self) {
        if self.observers.is_empty() {
            return;
        }
        let state = self.snapshot();
        for (_, observer) in self.observers.iter_mut() {
            observer(&state);
        }
    }

    // ── Helpers ─────────────────────────────────────────────────────

    fn latch(&mut self) {
        if !self.zoomed {
            tracing::debug!(total = self.total_duration, "viewport leaves unzoomed state");
            self.zoomed = true;
            self.requested_start = 0.0;
            self.requested_duration = self.total_duration;
        }
    }

    fn clamp_duration(&self, duration: f64) -> f64 {
        duration.clamp(self.min_visible_duration(), self.total_duration)
    }

    fn clamp_start(&self, start: f64, duration: f64) -> f64 {
        start.clamp(0.0, (self.total_duration - duration).max(0.0))
    }
}

/// Pointer position as a fraction of the container, midpoint for a collapsed container.
fn pointer_fraction(pointer_x: f64, container_width: f64) -> f64 {
    if container_width.is_nan() || container_width <= 0.0 || pointer_x.is_nan() {
        return 0.5;
    }
    (pointer_x / container_width).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// 10 slots of 160px with 4px gaps.
    fn ten_slots() -> SlotGeometry {
        SlotGeometry::new(1636.0, 160.0, 4.0)
    }

    #[test]
    fn test_slot_count() {
        assert_eq!(ten_slots().slot_count(), 10);
        assert_eq!(SlotGeometry::new(1635.0, 160.0, 4.0).slot_count(), 9);
        assert_eq!(SlotGeometry::new(0.0, 160.0, 4.0).slot_count(), 1);
        assert_eq!(SlotGeometry::new(-50.0, 160.0, 4.0).slot_count(), 1);
        assert_eq!(SlotGeometry::new(500.0, 0.0, 0.0).slot_count(), 1);
    }

    #[test]
    fn test_initial_state_is_unzoomed() {
        let vp = ZoomViewport::new(120.0, 30.0, ten_slots());
        let state = vp.snapshot();
        assert_eq!(state.duration_secs, 120.0);
        assert_eq!(state.start_secs, 0.0);
        assert_eq!(state.zoom_level, 0.0);
        assert!(!state.zoomed);
        assert!((vp.min_visible_duration() - 10.0 / 30.0).abs() < 1e-9);
    }

    #[test]
    fn test_wheel_zoom_in_is_pointer_anchored() {
        let mut vp = ZoomViewport::new(120.0, 30.0, ten_slots());
        vp.handle_wheel(818.0, -1.0, 1636.0);
        assert!((vp.visible_duration() - 102.0).abs() < 1e-9);
        assert!((vp.visible_start() - 9.0).abs() < 1e-9);
        assert!(vp.is_zoomed());
        assert!(vp.zoom_level() > 0.0);
    }

    #[test]
    fn test_wheel_zoom_out_caps_at_total() {
        let mut vp = ZoomViewport::new(120.0, 30.0, ten_slots());
        vp.handle_wheel(100.0, 1.0, 1636.0);
        assert_eq!(vp.visible_duration(), 120.0);
        assert_eq!(vp.visible_start(), 0.0);
    }

    #[test]
    fn test_zero_delta_is_ignored() {
        let mut vp = ZoomViewport::new(120.0, 30.0, ten_slots());
        vp.handle_wheel(100.0, 0.0, 1636.0);
        assert!(!vp.is_zoomed());
    }

    #[test]
    fn test_collapsed_container_zooms_about_midpoint() {
        let mut vp = ZoomViewport::new(100.0, 30.0, ten_slots());
        vp.handle_wheel(40.0, -1.0, 0.0);
        let range = vp.visible_range();
        assert!((range.start_secs + range.duration_secs / 2.0 - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_zoom_in_stops_at_min_duration() {
        let mut vp = ZoomViewport::new(120.0, 30.0, ten_slots());
        for _ in 0..200 {
            vp.handle_wheel(400.0, -1.0, 1636.0);
        }
        assert!((vp.visible_duration() - vp.min_visible_duration()).abs() < 1e-9);
        assert!((vp.zoom_level() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_timestamps_span_visible_range() {
        let vp = ZoomViewport::new(90.0, 30.0, ten_slots());
        let ts = vp.timestamps();
        assert_eq!(ts.len(), 10);
        assert_eq!(ts[0], 0.0);
        assert!((ts[9] - 90.0).abs() < 1e-9);
        assert!((ts[1] - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_single_slot_uses_full_interval() {
        let vp = ZoomViewport::new(60.0, 30.0, SlotGeometry::new(100.0, 160.0, 4.0));
        assert_eq!(vp.slot_count(), 1);
        assert_eq!(vp.interval(), 60.0);
        assert_eq!(vp.timestamps(), vec![0.0]);
    }

    #[test]
    fn test_short_source_caps_min_duration() {
        // 10 slots at 30fps wants 0.33s, but the clip is only 0.2s long.
        let vp = ZoomViewport::new(0.2, 30.0, ten_slots());
        assert!((vp.min_visible_duration() - 0.2).abs() < 1e-12);
        assert_eq!(vp.zoom_level(), 0.0);
    }

    #[test]
    fn test_empty_source_has_no_timestamps() {
        let mut vp = ZoomViewport::new(0.0, 30.0, ten_slots());
        vp.handle_wheel(10.0, -1.0, 1636.0);
        assert!(vp.timestamps().is_empty());
        assert_eq!(vp.visible_duration(), 0.0);
    }

    #[test]
    fn test_set_zoom_center_clamps_to_source() {
        let mut vp = ZoomViewport::new(100.0, 30.0, ten_slots());
        vp.set_visible_range(0.0, 20.0);
        vp.set_zoom_center(0.5);
        assert!((vp.visible_start() - 40.0).abs() < 1e-9);
        vp.set_zoom_center(1.0);
        assert!((vp.visible_start() - 80.0).abs() < 1e-9);
        assert!((vp.visible_duration() - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_set_visible_range_clamps() {
        let mut vp = ZoomViewport::new(100.0, 30.0, ten_slots());
        vp.set_visible_range(95.0, 10.0);
        assert_eq!(vp.visible_start(), 90.0);
        vp.set_visible_range(-5.0, 500.0);
        assert_eq!(vp.visible_start(), 0.0);
        assert_eq!(vp.visible_duration(), 100.0);
        vp.set_visible_range(10.0, 0.0);
        assert!((vp.visible_duration() - vp.min_visible_duration()).abs() < 1e-12);
    }

    #[test]
    fn test_pan_and_ensure_visible() {
        let mut vp = ZoomViewport::new(100.0, 30.0, ten_slots());
        assert!(!vp.ensure_visible(90.0, 0.1));

        vp.set_visible_range(0.0, 20.0);
        vp.pan_by(0.5);
        assert!((vp.visible_start() - 10.0).abs() < 1e-9);

        assert!(vp.ensure_visible(35.0, 0.1));
        let range = vp.visible_range();
        assert!((range.end_secs() - 37.0).abs() < 1e-9);
        assert!(!vp.ensure_visible(30.0, 0.1));
    }

    #[test]
    fn test_set_zoom_level_round_trips() {
        let mut vp = ZoomViewport::new(100.0, 30.0, ten_slots());
        vp.set_zoom_level(0.5);
        assert!((vp.zoom_level() - 0.5).abs() < 1e-9);
        vp.reset_zoom();
        assert_eq!(vp.zoom_level(), 0.0);
        assert!(vp.is_zoomed());
    }

    #[test]
    fn test_resize_reclamps_duration() {
        let mut vp = ZoomViewport::new(100.0, 10.0, ten_slots());
        vp.set_visible_range(0.0, 1.0);
        assert!((vp.visible_duration() - 1.0).abs() < 1e-9);
        // 20 slots at 10fps need at least 2 seconds.
        vp.set_container_width(3276.0);
        assert_eq!(vp.slot_count(), 20);
        assert!((vp.visible_duration() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_framerate_update_reclamps_duration() {
        let mut vp = ZoomViewport::new(100.0, 30.0, ten_slots());
        vp.set_visible_range(10.0, 0.5);
        assert!((vp.visible_duration() - 0.5).abs() < 1e-9);

        vp.set_framerate(5.0);
        assert!((vp.min_visible_duration() - 2.0).abs() < 1e-9);
        assert!((vp.visible_duration() - 2.0).abs() < 1e-9);
        assert!((vp.visible_start() - 10.0).abs() < 1e-9);

        // Unknown framerate falls back to 30 fps.
        vp.set_framerate(0.0);
        assert!((vp.min_visible_duration() - 10.0 / 30.0).abs() < 1e-9);
    }

    #[test]
    fn test_observers_see_every_mutation() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut vp = ZoomViewport::new(120.0, 30.0, ten_slots());
        let sink = Arc::clone(&seen);
        let id = vp.subscribe(move |state| sink.lock().unwrap().push(state.duration_secs));

        vp.handle_wheel(818.0, -1.0, 1636.0);
        vp.set_visible_range(0.0, 50.0);
        assert_eq!(seen.lock().unwrap().len(), 2);

        assert!(vp.unsubscribe(id));
        vp.pan_by(0.1);
        assert_eq!(seen.lock().unwrap().len(), 2);
        assert!(!vp.unsubscribe(id));
    }
}
