//! Content-addressed thumbnail cache.
//!
//! Entries are addressed by source identity plus the requested timestamp
//! rounded to the millisecond. Nothing is evicted individually; the cache is
//! reset wholesale when the source changes. The UI only ever asks for one
//! strip's worth of slots at a time, which keeps it bounded in practice.

use std::collections::HashMap;
use std::sync::Arc;

use trimline_timeline_model::SourceIdentity;

/// Timestamp rounded to whole milliseconds.
pub fn millis_key(timestamp_secs: f64) -> i64 {
    (timestamp_secs * 1000.0).round() as i64
}

/// Address of a cached frame.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    source: SourceIdentity,
    millis: i64,
}

impl CacheKey {
    pub fn new(source: &SourceIdentity, timestamp_secs: f64) -> Self {
        Self {
            source: source.clone(),
            millis: millis_key(timestamp_secs),
        }
    }

    pub fn source(&self) -> &SourceIdentity {
        &self.source
    }

    pub fn millis(&self) -> i64 {
        self.millis
    }

    /// The key's timestamp in seconds (millisecond precision).
    pub fn timestamp_secs(&self) -> f64 {
        self.millis as f64 / 1000.0
    }
}

/// A rendered frame. The pixel encoding is up to the decode unit.
#[derive(Debug, Clone, PartialEq)]
pub struct Thumbnail {
    pub width: u32,
    pub height: u32,
    /// Opaque image payload, shared between the cache and readers.
    pub data: Arc<[u8]>,
}

impl Thumbnail {
    pub fn new(width: u32, height: u32, data: impl Into<Arc<[u8]>>) -> Self {
        Self {
            width,
            height,
            data: data.into(),
        }
    }

    pub fn byte_len(&self) -> usize {
        self.data.len()
    }
}

/// Flat cache for one source.
#[derive(Debug)]
pub struct ThumbnailCache {
    source: SourceIdentity,
    entries: HashMap<CacheKey, Thumbnail>,
}

impl ThumbnailCache {
    pub fn new(source: SourceIdentity) -> Self {
        Self {
            source,
            entries: HashMap::new(),
        }
    }

    pub fn source(&self) -> &SourceIdentity {
        &self.source
    }

    /// Key for `timestamp_secs` under the current source.
    pub fn key(&self, timestamp_secs: f64) -> CacheKey {
        CacheKey::new(&self.source, timestamp_secs)
    }

    pub fn get(&self, timestamp_secs: f64) -> Option<&Thumbnail> {
        self.entries.get(&self.key(timestamp_secs))
    }

    pub fn contains(&self, timestamp_secs: f64) -> bool {
        self.entries.contains_key(&self.key(timestamp_secs))
    }

    /// Insert a whole batch at once. Entries keyed to another source are
    /// dropped. Returns how many entries were stored.
    pub fn merge(&mut self, batch: Vec<(CacheKey, Thumbnail)>) -> usize {
        let mut stored = 0;
        for (key, thumbnail) in batch {
            if key.source != self.source {
                tracing::debug!(stale = %key.source, "dropping frame for a previous source");
                continue;
            }
            self.entries.insert(key, thumbnail);
            stored += 1;
        }
        stored
    }

    /// Drop every entry and start addressing `source`.
    pub fn reset(&mut self, source: SourceIdentity) {
        self.entries.clear();
        self.source = source;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
