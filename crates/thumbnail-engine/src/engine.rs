//! Decode-unit pool and request draining.
//!
//! One [`ThumbnailEngine`] exists per loaded source. It owns the decode
//! units, the pending queue, and the cache. Callers never block on decoding:
//! `request_thumbnails` only enqueues, and a background drain loop hands
//! queued timestamps to idle units one batch at a time.

use std::any::Any;
use std::collections::HashSet;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, MutexGuard};

use futures_util::future::{join_all, FutureExt};
use futures_util::stream::{FuturesUnordered, StreamExt};
use serde::Serialize;
use tokio::sync::{broadcast, Notify};

use trimline_common::config::ThumbnailConfig;
use trimline_timeline_model::{SourceDescriptor, SourceIdentity};

use crate::backend::{DecodeUnit, DecodeUnitFactory};
use crate::cache::{millis_key, CacheKey, Thumbnail, ThumbnailCache};
use crate::queue::PendingQueue;

/// Capacity of the engine event channel.
const EVENT_CAPACITY: usize = 256;

/// Availability of the decode units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PoolStatus {
    /// Units are still binding to the source and none has succeeded yet.
    Initializing,
    /// At least one unit is bound.
    Ready { units: usize },
    /// Every unit failed to bind. Requests are queued but never decoded.
    Failed,
    /// The engine was shut down.
    Closed,
}

/// Notifications for the UI layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EngineEvent {
    /// The number of bound units changed: a unit joined, or a panicking unit was dropped.
    Ready { units: usize },
    /// No unit could bind to the source, or every bound unit was lost.
    Failed,
    /// A batch landed in the cache. Lists every timestamp it stored.
    BatchMerged { timestamps: Vec<f64> },
    /// A single render failed. The timestamp stays uncached.
    DecodeFailed { timestamp_secs: f64 },
    /// The engine moved to a different source and dropped its cache.
    SourceChanged { source: SourceIdentity },
}

struct PoolState {
    /// Bumped on every source change; in-flight work from older generations is discarded.
    generation: u64,
    source: SourceDescriptor,
    status: PoolStatus,
    /// `None` marks a unit that is claimed by an in-flight decode.
    units: Vec<Option<Box<dyn DecodeUnit>>>,
    queue: PendingQueue,
    in_flight: HashSet<i64>,
    cache: ThumbnailCache,
    draining: bool,
}

impl PoolState {
    fn idle_units(&self) -> usize {
        self.units.iter().filter(|u| u.is_some()).count()
    }

    fn is_settled(&self) -> bool {
        if self.draining {
            return false;
        }
        match self.status {
            PoolStatus::Ready { .. } => self.queue.is_empty(),
            PoolStatus::Initializing => false,
            PoolStatus::Failed | PoolStatus::Closed => true,
        }
    }
}

struct Inner {
    state: Mutex<PoolState>,
    factory: Arc<dyn DecodeUnitFactory>,
    config: ThumbnailConfig,
    events: broadcast::Sender<EngineEvent>,
    settled: Notify,
    runtime: tokio::runtime::Handle,
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, PoolState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn emit(&self, event: EngineEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    /// Start a drain loop unless one is running or there is nothing to do.
    fn kick(self: &Arc<Self>, state: &mut PoolState) {
        if state.draining || state.queue.is_empty() || state.idle_units() == 0 {
            return;
        }
        state.draining = true;
        let inner = Arc::clone(self);
        let generation = state.generation;
        self.runtime.spawn(async move { inner.drain(generation).await });
    }

    /// Dispatch batches until the queue is empty or no unit is idle.
    async fn drain(self: Arc<Self>, generation: u64) {
        loop {
            let batch = {
                let mut state = self.lock();
                if state.generation != generation {
                    return;
                }
                let PoolState {
                    units,
                    queue,
                    in_flight,
                    ..
                } = &mut *state;

                let mut batch = Vec::new();
                for (slot, entry) in units.iter_mut().enumerate() {
                    if entry.is_none() {
                        continue;
                    }
                    let Some(timestamp) = queue.pop_front() else {
                        break;
                    };
                    if let Some(unit) = entry.take() {
                        in_flight.insert(millis_key(timestamp));
                        batch.push((slot, unit, timestamp));
                    }
                }

                if batch.is_empty() {
                    state.draining = false;
                    drop(state);
                    self.settled.notify_waiters();
                    return;
                }
                tracing::debug!(size = batch.len(), "dispatching thumbnail batch");
                batch
            };

            // The whole batch is awaited before merging, so a fast unit
            // waits for the slowest render in its batch.
            let outcomes = join_all(batch.into_iter().map(|(slot, mut unit, timestamp)| async move {
                let outcome = AssertUnwindSafe(async move {
                    let result = unit.seek_and_render(timestamp).await;
                    (unit, result)
                })
                .catch_unwind()
                .await;
                (slot, timestamp, outcome)
            }))
            .await;

            let (timestamps, failed, lost) = {
                let mut state = self.lock();
                if state.generation != generation {
                    tracing::debug!("discarding batch rendered for a previous source");
                    return;
                }

                let mut merged = Vec::new();
                let mut failed = Vec::new();
                let mut dead_slots = Vec::new();
                for (slot, timestamp, outcome) in outcomes {
                    state.in_flight.remove(&millis_key(timestamp));
                    match outcome {
                        Ok((unit, result)) => {
                            // Released whether or not the render worked.
                            if let Some(entry) = state.units.get_mut(slot) {
                                *entry = Some(unit);
                            }
                            match result {
                                Ok(thumbnail) => {
                                    merged.push((state.cache.key(timestamp), thumbnail))
                                }
                                Err(e) => {
                                    tracing::warn!(timestamp, error = %e, "thumbnail decode failed");
                                    failed.push(timestamp);
                                }
                            }
                        }
                        Err(panic) => {
                            tracing::error!(
                                timestamp,
                                unit = slot,
                                reason = panic_message(&*panic),
                                "decode unit panicked; dropping it from the pool"
                            );
                            dead_slots.push(slot);
                            failed.push(timestamp);
                        }
                    }
                }

                let lost = !dead_slots.is_empty();
                if lost {
                    let mut slot = 0;
                    state.units.retain(|_| {
                        let keep = !dead_slots.contains(&slot);
                        slot += 1;
                        keep
                    });
                    state.status = match state.units.len() {
                        0 => PoolStatus::Failed,
                        units => PoolStatus::Ready { units },
                    };
                }

                let timestamps: Vec<f64> =
                    merged.iter().map(|(key, _)| key.timestamp_secs()).collect();
                state.cache.merge(merged);
                (timestamps, failed, lost.then_some(state.status))
            };

            tracing::debug!(
                stored = timestamps.len(),
                failed = failed.len(),
                "thumbnail batch merged"
            );
            if !timestamps.is_empty() {
                self.emit(EngineEvent::BatchMerged { timestamps });
            }
            for timestamp_secs in failed {
                self.emit(EngineEvent::DecodeFailed { timestamp_secs });
            }
            match lost {
                Some(PoolStatus::Ready { units }) => self.emit(EngineEvent::Ready { units }),
                Some(_) => {
                    tracing::warn!("every decode unit was lost; thumbnails unavailable");
                    self.emit(EngineEvent::Failed);
                }
                None => {}
            }
        }
    }

    /// Create and bind a fresh set of units for `generation`.
    ///
    /// Units join the pool as they bind, so the pool becomes ready with the
    /// first success. Resolves once every unit has either bound or failed.
    async fn populate(self: &Arc<Self>, generation: u64, source: SourceDescriptor) {
        let pool_size = self.config.pool_size.max(1);
        let mut binding: FuturesUnordered<_> = (0..pool_size)
            .map(|index| {
                let mut unit = self.factory.create(index);
                let source = source.clone();
                async move {
                    let result = unit.bind_source(&source).await;
                    (index, unit, result)
                }
            })
            .collect();

        while let Some((index, unit, result)) = binding.next().await {
            match result {
                Ok(()) => {
                    let units = {
                        let mut state = self.lock();
                        if state.generation != generation {
                            return;
                        }
                        state.units.push(Some(unit));
                        let units = state.units.len();
                        state.status = PoolStatus::Ready { units };
                        self.kick(&mut state);
                        units
                    };
                    tracing::debug!(unit = index, units, "decode unit bound");
                    self.emit(EngineEvent::Ready { units });
                }
                Err(e) => {
                    tracing::warn!(
                        unit = index,
                        backend = unit.name(),
                        error = %e,
                        "decode unit failed to bind"
                    );
                }
            }
        }

        let mut state = self.lock();
        if state.generation != generation {
            return;
        }
        let status = state.status;
        match status {
            PoolStatus::Ready { units } => {
                tracing::info!(
                    source = %state.source.identity,
                    units,
                    pool_size,
                    "thumbnail pool ready"
                );
            }
            _ => {
                state.status = PoolStatus::Failed;
                drop(state);
                tracing::warn!(pool_size, "no decode unit could bind; thumbnails unavailable");
                self.emit(EngineEvent::Failed);
                self.settled.notify_waiters();
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "unknown panic"
    }
}

/// Thumbnail cache backed by a bounded pool of decode units.
///
/// Cloning yields another handle to the same engine.
#[derive(Clone)]
pub struct ThumbnailEngine {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for ThumbnailEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.lock();
        f.debug_struct("ThumbnailEngine")
            .field("source", &state.source.identity)
            .field("status", &state.status)
            .field("pending", &state.queue.len())
            .field("in_flight", &state.in_flight.len())
            .field("cached", &state.cache.len())
            .finish()
    }
}

impl ThumbnailEngine {
    /// Create an engine for `source` and bind its decode units.
    ///
    /// Must be called from within a Tokio runtime. Resolves once every unit
    /// has bound or failed; a pool where all units failed is returned in the
    /// [`PoolStatus::Failed`] state rather than as an error.
    pub async fn bind(
        source: SourceDescriptor,
        factory: Arc<dyn DecodeUnitFactory>,
        config: ThumbnailConfig,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let inner = Arc::new(Inner {
            state: Mutex::new(PoolState {
                generation: 0,
                cache: ThumbnailCache::new(source.identity.clone()),
                source: source.clone(),
                status: PoolStatus::Initializing,
                units: Vec::new(),
                queue: PendingQueue::new(),
                in_flight: HashSet::new(),
                draining: false,
            }),
            factory,
            config,
            events,
            settled: Notify::new(),
            runtime: tokio::runtime::Handle::current(),
        });

        tracing::info!(source = %source.identity, "binding thumbnail pool");
        inner.populate(0, source).await;
        Self { inner }
    }

    /// Switch to another source: drop units, queue, and cache, then bind new units.
    ///
    /// Decodes still running for the old source finish, but their frames are
    /// discarded and their units are dropped instead of rejoining the pool.
    pub async fn rebind(&self, source: SourceDescriptor) {
        let generation = {
            let mut state = self.inner.lock();
            state.generation += 1;
            state.source = source.clone();
            state.status = PoolStatus::Initializing;
            state.units.clear();
            state.queue.clear();
            state.in_flight.clear();
            state.cache.reset(source.identity.clone());
            state.draining = false;
            state.generation
        };
        tracing::info!(source = %source.identity, "thumbnail source changed");
        self.inner.emit(EngineEvent::SourceChanged {
            source: source.identity.clone(),
        });
        self.inner.populate(generation, source).await;
    }

    /// Tear the pool down. Later requests are ignored.
    pub fn shutdown(&self) {
        {
            let mut state = self.inner.lock();
            if state.status == PoolStatus::Closed {
                return;
            }
            state.generation += 1;
            state.status = PoolStatus::Closed;
            state.units.clear();
            state.queue.clear();
            state.in_flight.clear();
            let source = state.source.identity.clone();
            state.cache.reset(source);
            state.draining = false;
        }
        tracing::info!("thumbnail pool shut down");
        self.inner.settled.notify_waiters();
    }

    /// Queue every timestamp that is not cached, queued, or being decoded,
    /// and start draining. Returns how many timestamps were newly queued.
    ///
    /// Never blocks and never fails; negative or non-finite timestamps are skipped.
    pub fn request_thumbnails(&self, timestamps: &[f64]) -> usize {
        let mut state = self.inner.lock();
        if state.status == PoolStatus::Closed {
            return 0;
        }

        let mut queued = 0;
        for &timestamp in timestamps {
            if !timestamp.is_finite() || timestamp < 0.0 {
                continue;
            }
            if state.cache.contains(timestamp)
                || state.in_flight.contains(&millis_key(timestamp))
            {
                continue;
            }
            if state.queue.push(timestamp) {
                queued += 1;
            }
        }

        if queued > 0 {
            tracing::trace!(queued, pending = state.queue.len(), "thumbnails requested");
        }
        self.inner.kick(&mut state);
        queued
    }

    /// Cached thumbnails for `timestamps`, in request order. Misses are
    /// omitted. Never triggers decoding.
    pub fn get_thumbnails(&self, timestamps: &[f64]) -> Vec<(f64, Thumbnail)> {
        let state = self.inner.lock();
        timestamps
            .iter()
            .filter_map(|&t| state.cache.get(t).map(|thumb| (t, thumb.clone())))
            .collect()
    }

    /// Cached thumbnail for one timestamp.
    pub fn get_thumbnail(&self, timestamp_secs: f64) -> Option<Thumbnail> {
        self.inner.lock().cache.get(timestamp_secs).cloned()
    }

    /// Drop queued requests that have not been dispatched. In-flight decodes
    /// still complete and land in the cache. Returns how many were dropped.
    pub fn cancel_pending(&self) -> usize {
        let removed = self.inner.lock().queue.clear();
        if removed > 0 {
            tracing::debug!(removed, "pending thumbnail requests cancelled");
        }
        removed
    }

    /// Resolve once nothing is queued or decoding (or the pool cannot decode).
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.inner.settled.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if self.inner.lock().is_settled() {
                return;
            }
            notified.await;
        }
    }

    /// Receive engine events. Lagging receivers lose the oldest events.
    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.inner.events.subscribe()
    }

    pub fn status(&self) -> PoolStatus {
        self.inner.lock().status
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.status(), PoolStatus::Ready { .. })
    }

    pub fn source(&self) -> SourceIdentity {
        self.inner.lock().source.identity.clone()
    }

    /// Units currently bound and not decoding.
    pub fn idle_units(&self) -> usize {
        self.inner.lock().idle_units()
    }

    pub fn pending_count(&self) -> usize {
        self.inner.lock().queue.len()
    }

    pub fn in_flight_count(&self) -> usize {
        self.inner.lock().in_flight.len()
    }

    pub fn cached_count(&self) -> usize {
        self.inner.lock().cache.len()
    }

    /// Whether `timestamp_secs` is cached under the current source.
    pub fn is_cached(&self, timestamp_secs: f64) -> bool {
        self.inner.lock().cache.contains(timestamp_secs)
    }

    /// Cache key the engine would use for `timestamp_secs`.
    pub fn cache_key(&self, timestamp_secs: f64) -> CacheKey {
        self.inner.lock().cache.key(timestamp_secs)
    }
}
