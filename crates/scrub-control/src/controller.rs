//! Marker drag sessions and explicit mark actions.

use trimline_common::timecode::{effective_fps, map_pointer_to_time, snap_time_to_frame};
use trimline_timeline_model::{MarkerKind, SelectionRange};

use crate::host::DragHost;
use crate::range::VisibleRangeSource;

/// The handle being dragged. Lives from pointer-down to pointer-up.
#[derive(Debug, Clone, Copy)]
struct DragSession {
    marker: MarkerKind,
}

/// Applies pointer gestures and mark actions to a [`SelectionRange`].
///
/// The controller never owns the selection: both timeline surfaces edit the
/// same range, so it is passed in on every call.
#[derive(Debug)]
pub struct SelectionController<R, H> {
    range: R,
    host: H,
    session: Option<DragSession>,
    listening: bool,
}

impl<R: VisibleRangeSource, H: DragHost> SelectionController<R, H> {
    pub fn new(range: R, host: H) -> Self {
        Self {
            range,
            host,
            session: None,
            listening: false,
        }
    }

    pub fn range(&self) -> &R {
        &self.range
    }

    pub fn range_mut(&mut self) -> &mut R {
        &mut self.range
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    /// Swap the UI host, detaching listeners from the old one.
    pub fn set_host(&mut self, host: H) {
        self.release_listeners();
        self.session = None;
        self.host = host;
    }

    pub fn is_dragging(&self) -> bool {
        self.session.is_some()
    }

    /// Handle currently following the pointer.
    pub fn active_marker(&self) -> Option<MarkerKind> {
        self.session.map(|s| s.marker)
    }

    // ── Drag session ────────────────────────────────────────────────

    /// Pointer went down on `marker`'s handle.
    pub fn pointer_down(&mut self, marker: MarkerKind) {
        if self.listening {
            tracing::debug!("detaching listeners left over from a previous drag");
            self.release_listeners();
        }
        self.host.attach_listeners();
        self.listening = true;
        self.session = Some(DragSession { marker });
        tracing::debug!(?marker, "drag started");
        self.host.drag_state_changed(true, Some(marker));
    }

    /// Pointer moved to `pixel_x` within a surface `container_width` pixels wide.
    ///
    /// Returns the snapped time now held by the dragged handle, or `None`
    /// when no drag is active.
    pub fn pointer_move(
        &mut self,
        selection: &mut SelectionRange,
        pixel_x: f64,
        container_width: f64,
    ) -> Option<f64> {
        let session = self.session?;
        let visible = self.range.visible_range();
        let t = map_pointer_to_time(
            pixel_x,
            container_width,
            visible.start_secs,
            visible.end_secs(),
        );
        let value = snap_time_to_frame(t, self.range.fps(), self.range.total_duration());

        let holder = selection.move_marker(session.marker, value);
        if holder != session.marker {
            tracing::debug!(from = ?session.marker, to = ?holder, "markers swapped");
            self.session = Some(DragSession { marker: holder });
            self.host.drag_state_changed(true, Some(holder));
        }
        self.host.seek_preview(value);
        Some(value)
    }

    /// Pointer released. Ends the session if there is one.
    pub fn pointer_up(&mut self) {
        if self.session.take().is_none() && !self.listening {
            return;
        }
        self.release_listeners();
        tracing::debug!("drag ended");
        self.host.drag_state_changed(false, None);
    }

    /// Tear down without emitting a state change.
    pub fn destroy(&mut self) {
        self.session = None;
        self.release_listeners();
    }

    fn release_listeners(&mut self) {
        if self.listening {
            self.host.detach_listeners();
            self.listening = false;
        }
    }

    // ── Explicit actions ────────────────────────────────────────────

    /// Set the start bound at `t`, snapped. Returns the handle holding it.
    pub fn mark_start(&self, selection: &mut SelectionRange, t: f64) -> MarkerKind {
        self.mark(selection, MarkerKind::Start, t)
    }

    /// Set the end bound at `t`, snapped. Returns the handle holding it.
    pub fn mark_end(&self, selection: &mut SelectionRange, t: f64) -> MarkerKind {
        self.mark(selection, MarkerKind::End, t)
    }

    /// Step `marker` by whole frames (negative steps move left).
    pub fn nudge(
        &self,
        selection: &mut SelectionRange,
        marker: MarkerKind,
        frames: i64,
    ) -> MarkerKind {
        let fps = effective_fps(self.range.fps());
        let target = selection.bound(marker) + frames as f64 / fps;
        self.mark(selection, marker, target)
    }

    fn mark(&self, selection: &mut SelectionRange, marker: MarkerKind, t: f64) -> MarkerKind {
        let value = snap_time_to_frame(t, self.range.fps(), self.range.total_duration());
        selection.move_marker(marker, value)
    }
}
