//! Persisted, batched event queue with at-least-once delivery.
//!
//! The whole queue lives as one JSON array under a single storage key.
//! `add`, a successful `flush` and `clear` are the only writers, each doing a
//! full read-modify-write under a lock shared by every queue in the process
//! that uses the same key.

use crate::collector::{EventSink, HttpCollector};
use crate::config::QueueConfig;
use crate::error::EventQueueError;
use crate::event::{Event, EventBatch};
use crate::storage::KeyValueStorage;
use glasskit_monitoring::{EventQueueMetrics, LogExt};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Instant;
use tokio::sync::Mutex;
use tracing::{debug, error, info, instrument, warn};

/// Result of a call to [`EventQueue::flush`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushOutcome {
    /// Another flush was running; nothing was done
    InProgress,
    /// Nothing was queued
    Empty,
    /// No collector is configured; events stay queued
    NoEndpoint,
    /// This many events were delivered and removed
    Sent(usize),
}

/// Diagnostics snapshot of the queue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueStats {
    /// Number of queued events
    pub size: usize,
    /// Timestamp of the oldest queued event
    pub oldest_timestamp: Option<i64>,
    /// Timestamp of the newest queued event
    pub newest_timestamp: Option<i64>,
}

struct QueueInner {
    config: QueueConfig,
    storage: Arc<dyn KeyValueStorage>,
    sink: Option<Arc<dyn EventSink>>,
    flushing: AtomicBool,
    write_lock: Arc<Mutex<()>>,
}

/// Write lock for a storage slot, shared by all queues using `key`
fn slot_lock(key: &str) -> Arc<Mutex<()>> {
    static SLOTS: OnceLock<parking_lot::Mutex<HashMap<String, Arc<Mutex<()>>>>> = OnceLock::new();
    SLOTS
        .get_or_init(Default::default)
        .lock()
        .entry(key.to_string())
        .or_default()
        .clone()
}

/// Outbound telemetry queue.
///
/// Cheap to clone; clones share the same in-progress flag. Queues on the
/// same storage key also share a write lock, so concurrent adds from
/// separate queues are never lost.
#[derive(Clone)]
pub struct EventQueue {
    inner: Arc<QueueInner>,
}

/// Clears the in-progress flag when a flush ends, however it ends
struct FlushGuard<'a>(&'a AtomicBool);

impl Drop for FlushGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl EventQueue {
    /// Create a queue delivering to the configured HTTP endpoint, if any
    pub fn new(config: QueueConfig, storage: Arc<dyn KeyValueStorage>) -> Result<Self, EventQueueError> {
        let sink: Option<Arc<dyn EventSink>> = match &config.endpoint {
            Some(endpoint) => Some(Arc::new(HttpCollector::new(endpoint.clone(), config.request_timeout())?)),
            None => None,
        };
        Self::with_sink(config, storage, sink)
    }

    /// Create a queue delivering to a custom sink. `None` behaves like a
    /// missing endpoint.
    pub fn with_sink(
        config: QueueConfig,
        storage: Arc<dyn KeyValueStorage>,
        sink: Option<Arc<dyn EventSink>>,
    ) -> Result<Self, EventQueueError> {
        config.validate()?;

        Ok(Self {
            inner: Arc::new(QueueInner {
                storage,
                sink,
                flushing: AtomicBool::new(false),
                write_lock: slot_lock(&config.storage_key),
                config,
            }),
        })
    }

    /// Queue configuration
    pub fn config(&self) -> &QueueConfig {
        &self.inner.config
    }

    /// Backing storage
    pub fn storage(&self) -> Arc<dyn KeyValueStorage> {
        self.inner.storage.clone()
    }

    /// Whether a flush is currently running
    pub fn is_flushing(&self) -> bool {
        self.inner.flushing.load(Ordering::SeqCst)
    }

    /// Append an event and persist the queue.
    ///
    /// Evicts the oldest events beyond `maxQueueSize`. Once the queue holds
    /// `batchSize` events a flush is started in the background; its failure
    /// is logged, never returned. Returns the new queue size.
    #[instrument(skip(self, event), fields(event_id = %event.id))]
    pub async fn add(&self, event: Event) -> Result<usize, EventQueueError> {
        let size = {
            let _guard = self.inner.write_lock.lock().await;
            let mut events = self.get().await?;
            events.push(event);

            let overflow = events.len().saturating_sub(self.inner.config.max_queue_size);
            if overflow > 0 {
                events.drain(..overflow);
                warn!(
                    evicted = overflow,
                    max_queue_size = self.inner.config.max_queue_size,
                    "Event queue full, dropped oldest events"
                );
                EventQueueMetrics::record_evicted(overflow);
            }

            self.write(&events).await?;
            events.len()
        };

        EventQueueMetrics::record_enqueued(size);
        debug!(size, "Event queued");

        if size >= self.inner.config.batch_size {
            self.spawn_flush();
        }

        Ok(size)
    }

    fn spawn_flush(&self) {
        let queue = self.clone();
        tokio::spawn(async move {
            if let Err(e) = queue.flush().await {
                warn!("Background event flush failed: {}", e);
            }
        });
    }

    /// Send every queued event as one batch.
    ///
    /// Overlapping calls collapse: while a flush runs, further calls return
    /// [`FlushOutcome::InProgress`]. Failed sends are retried with
    /// exponential backoff; if every attempt fails the queue is left as it
    /// was and the error is returned. On success only the delivered events
    /// are removed, so events added meanwhile stay queued.
    #[instrument(skip(self))]
    pub async fn flush(&self) -> Result<FlushOutcome, EventQueueError> {
        if self
            .inner
            .flushing
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!("Flush already in progress");
            return Ok(FlushOutcome::InProgress);
        }
        let _in_progress = FlushGuard(&self.inner.flushing);

        let events = self.get().await?;
        if events.is_empty() {
            return Ok(FlushOutcome::Empty);
        }

        let Some(sink) = &self.inner.sink else {
            warn!(queued = events.len(), "No event endpoint configured, keeping events queued");
            return Ok(FlushOutcome::NoEndpoint);
        };

        let started = Instant::now();
        let batch = EventBatch::new(events);
        let ((), attempts) = self.inner.config.retry.run(|_| sink.send(&batch)).await?;

        let sent: HashSet<&str> = batch.events.iter().map(|event| event.id.as_str()).collect();
        let remaining = {
            let _guard = self.inner.write_lock.lock().await;
            let mut current = self.get().await?;
            current.retain(|event| !sent.contains(event.id.as_str()));
            self.write(&current).await?;
            current.len()
        };

        EventQueueMetrics::record_flush(
            batch.len(),
            remaining,
            attempts,
            started.elapsed().as_secs_f64() * 1000.0,
        );
        info!(sent = batch.len(), remaining, attempts, "Flushed events");

        Ok(FlushOutcome::Sent(batch.len()))
    }

    /// Snapshot of the persisted queue, oldest first.
    ///
    /// A payload that no longer parses is copied to `<storageKey>.corrupt`,
    /// logged, and read as an empty queue; the next `add` overwrites it.
    pub async fn get(&self) -> Result<Vec<Event>, EventQueueError> {
        let key = &self.inner.config.storage_key;
        let Some(raw) = self.inner.storage.get(key).await? else {
            return Ok(Vec::new());
        };

        match serde_json::from_str(&raw) {
            Ok(events) => Ok(events),
            Err(e) => {
                error!(storage_key = %key, "Persisted event queue is corrupt, starting empty: {}", e);
                EventQueueMetrics::record_corrupt();
                self.inner
                    .storage
                    .set(&format!("{}.corrupt", key), raw)
                    .await
                    .log_err("Failed to set aside corrupt event queue")
                    .ok();
                Ok(Vec::new())
            }
        }
    }

    /// Number of persisted events
    pub async fn size(&self) -> Result<usize, EventQueueError> {
        Ok(self.get().await?.len())
    }

    /// Drop every queued event
    pub async fn clear(&self) -> Result<(), EventQueueError> {
        let _guard = self.inner.write_lock.lock().await;
        self.inner.storage.remove(&self.inner.config.storage_key).await?;
        EventQueueMetrics::record_depth(0);
        info!("Event queue cleared");
        Ok(())
    }

    /// Size and timestamp range of the queue
    pub async fn stats(&self) -> Result<QueueStats, EventQueueError> {
        let events = self.get().await?;
        Ok(QueueStats {
            size: events.len(),
            oldest_timestamp: events.first().map(|event| event.timestamp),
            newest_timestamp: events.last().map(|event| event.timestamp),
        })
    }

    async fn write(&self, events: &[Event]) -> Result<(), EventQueueError> {
        let raw = serde_json::to_string(events)?;
        self.inner.storage.set(&self.inner.config.storage_key, raw).await?;
        Ok(())
    }
}

impl std::fmt::Debug for EventQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventQueue")
            .field("config", &self.inner.config)
            .field("has_sink", &self.inner.sink.is_some())
            .field("flushing", &self.is_flushing())
            .finish()
    }
}
