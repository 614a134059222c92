//! Trim selection bounds.

use serde::{Deserialize, Serialize};

/// Which selection handle a gesture or action refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkerKind {
    Start,
    End,
}

impl MarkerKind {
    /// The other handle.
    pub fn opposite(self) -> Self {
        match self {
            MarkerKind::Start => MarkerKind::End,
            MarkerKind::End => MarkerKind::Start,
        }
    }
}

/// Trim selection `[start_secs, end_secs]`.
///
/// `start_secs <= end_secs` always holds. Moving one bound across the other
/// swaps them instead of rejecting the move.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawSelection")]
pub struct SelectionRange {
    start_secs: f64,
    end_secs: f64,
}

#[derive(Deserialize)]
struct RawSelection {
    start_secs: f64,
    end_secs: f64,
}

impl From<RawSelection> for SelectionRange {
    fn from(raw: RawSelection) -> Self {
        SelectionRange::new(raw.start_secs, raw.end_secs)
    }
}

impl SelectionRange {
    /// Selection from two bounds in any order.
    pub fn new(a: f64, b: f64) -> Self {
        Self {
            start_secs: a.min(b),
            end_secs: a.max(b),
        }
    }

    /// Whole-source selection, the default after loading.
    pub fn full(duration_secs: f64) -> Self {
        Self::new(0.0, duration_secs.max(0.0))
    }

    pub fn start_secs(&self) -> f64 {
        self.start_secs
    }

    pub fn end_secs(&self) -> f64 {
        self.end_secs
    }

    pub fn duration_secs(&self) -> f64 {
        self.end_secs - self.start_secs
    }

    pub fn contains(&self, t: f64) -> bool {
        t >= self.start_secs && t <= self.end_secs
    }

    /// Bound held by `marker`.
    pub fn bound(&self, marker: MarkerKind) -> f64 {
        match marker {
            MarkerKind::Start => self.start_secs,
            MarkerKind::End => self.end_secs,
        }
    }

    /// Move `marker` to `value`, swapping bounds if it crosses the other one.
    ///
    /// Returns the marker that holds `value` afterwards: `marker` itself, or
    /// its opposite when a swap happened.
    pub fn move_marker(&mut self, marker: MarkerKind, value: f64) -> MarkerKind {
        match marker {
            MarkerKind::Start if value > self.end_secs => {
                self.start_secs = self.end_secs;
                self.end_secs = value;
                MarkerKind::End
            }
            MarkerKind::Start => {
                self.start_secs = value;
                MarkerKind::Start
            }
            MarkerKind::End if value < self.start_secs => {
                self.end_secs = self.start_secs;
                self.start_secs = value;
                MarkerKind::Start
            }
            MarkerKind::End => {
                self.end_secs = value;
                MarkerKind::End
            }
        }
    }
}
