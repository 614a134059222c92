//! Deduplicated FIFO of requested-but-uncached timestamps.

use std::collections::{HashSet, VecDeque};

use crate::cache::millis_key;

/// Pending decode requests in arrival order, one per millisecond key.
#[derive(Debug, Default)]
pub struct PendingQueue {
    order: VecDeque<f64>,
    keys: HashSet<i64>,
}

impl PendingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueue `timestamp_secs` unless its key is already pending.
    pub fn push(&mut self, timestamp_secs: f64) -> bool {
        if !self.keys.insert(millis_key(timestamp_secs)) {
            return false;
        }
        self.order.push_back(timestamp_secs);
        true
    }

    pub fn pop_front(&mut self) -> Option<f64> {
        let next = self.order.pop_front()?;
        self.keys.remove(&millis_key(next));
        Some(next)
    }

    pub fn contains(&self, timestamp_secs: f64) -> bool {
        self.keys.contains(&millis_key(timestamp_secs))
    }

    /// Drop everything not yet dispatched. Returns how many entries were removed.
    pub fn clear(&mut self) -> usize {
        let removed = self.order.len();
        self.order.clear();
        self.keys.clear();
        removed
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
