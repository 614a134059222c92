//! UI-side callbacks a drag session drives.

use std::sync::{Arc, Mutex};

use serde::Serialize;
use trimline_timeline_model::MarkerKind;

/// Listener and preview plumbing owned by the surface hosting a controller.
pub trait DragHost {
    /// Start routing pointer move/up events to the controller.
    fn attach_listeners(&mut self);

    /// Stop routing pointer events. Must tolerate being called when detached.
    fn detach_listeners(&mut self);

    /// Show the frame at `t` in the live preview.
    fn seek_preview(&mut self, t: f64);

    /// A drag started, ended, or switched handles. `marker` is `None` when
    /// `active` is false.
    fn drag_state_changed(&mut self, active: bool, marker: Option<MarkerKind>);
}

impl<H: DragHost + ?Sized> DragHost for Box<H> {
    fn attach_listeners(&mut self) {
        (**self).attach_listeners();
    }

    fn detach_listeners(&mut self) {
        (**self).detach_listeners();
    }

    fn seek_preview(&mut self, t: f64) {
        (**self).seek_preview(t);
    }

    fn drag_state_changed(&mut self, active: bool, marker: Option<MarkerKind>) {
        (**self).drag_state_changed(active, marker);
    }
}

/// Host for surfaces nobody is watching.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHost;

impl DragHost for NoopHost {
    fn attach_listeners(&mut self) {}

    fn detach_listeners(&mut self) {}

    fn seek_preview(&mut self, _t: f64) {}

    fn drag_state_changed(&mut self, _active: bool, _marker: Option<MarkerKind>) {}
}

/// One callback received by a [`RecordingHost`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DragEvent {
    Attached,
    Detached,
    Seek { t: f64 },
    StateChanged {
        active: bool,
        marker: Option<MarkerKind>,
    },
}

/// Host that records every callback. Clones share one log, so a clone can
/// be handed to a controller while the original is inspected.
#[derive(Debug, Clone, Default)]
pub struct RecordingHost {
    events: Arc<Mutex<Vec<DragEvent>>>,
    attached: Arc<Mutex<bool>>,
}

impl RecordingHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<DragEvent> {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Drain and return the log.
    pub fn take_events(&self) -> Vec<DragEvent> {
        std::mem::take(
            &mut *self
                .events
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner()),
        )
    }

    pub fn is_attached(&self) -> bool {
        *self
            .attached
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn record(&self, event: DragEvent) {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(event);
    }

    fn set_attached(&self, attached: bool) {
        *self
            .attached
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = attached;
    }
}

impl DragHost for RecordingHost {
    fn attach_listeners(&mut self) {
        self.set_attached(true);
        self.record(DragEvent::Attached);
    }

    fn detach_listeners(&mut self) {
        self.set_attached(false);
        self.record(DragEvent::Detached);
    }

    fn seek_preview(&mut self, t: f64) {
        self.record(DragEvent::Seek { t });
    }

    fn drag_state_changed(&mut self, active: bool, marker: Option<MarkerKind>) {
        self.record(DragEvent::StateChanged { active, marker });
    }
}
