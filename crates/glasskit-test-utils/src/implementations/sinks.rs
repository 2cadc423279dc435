//! Event sinks for tests.

use async_trait::async_trait;
use glasskit_events::{Event, EventBatch, EventQueueError, EventSink};
use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

/// Sink recording every batch it accepts, optionally failing first.
#[derive(Default)]
pub struct RecordingSink {
    batches: Mutex<Vec<EventBatch>>,
    send_count: AtomicUsize,
    failures_left: AtomicUsize,
    delivered: Notify,
}

impl fmt::Debug for RecordingSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordingSink")
            .field("batches", &self.batches.lock().len())
            .field("send_count", &self.send_count())
            .finish()
    }
}

impl RecordingSink {
    /// Sink accepting every batch
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Sink rejecting the first `times` sends with a 503
    pub fn failing(times: usize) -> Arc<Self> {
        let sink = Self::default();
        sink.failures_left.store(times, Ordering::SeqCst);
        Arc::new(sink)
    }

    /// Sink rejecting every send
    pub fn always_failing() -> Arc<Self> {
        Self::failing(usize::MAX)
    }

    /// Accepted batches, in order
    pub fn batches(&self) -> Vec<EventBatch> {
        self.batches.lock().clone()
    }

    /// Every accepted event, in order
    pub fn sent_events(&self) -> Vec<Event> {
        self.batches
            .lock()
            .iter()
            .flat_map(|batch| batch.events.iter().cloned())
            .collect()
    }

    /// Number of send calls, failed ones included
    pub fn send_count(&self) -> usize {
        self.send_count.load(Ordering::SeqCst)
    }

    /// Wait until the next batch is accepted
    pub async fn wait_for_delivery(&self) {
        self.delivered.notified().await;
    }
}

#[async_trait]
impl EventSink for RecordingSink {
    async fn send(&self, batch: &EventBatch) -> Result<(), EventQueueError> {
        self.send_count.fetch_add(1, Ordering::SeqCst);

        let failing = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok();
        if failing {
            return Err(EventQueueError::Status {
                status: 503,
                body: "collector unavailable".to_string(),
            });
        }

        self.batches.lock().push(batch.clone());
        self.delivered.notify_one();
        Ok(())
    }
}

/// Sink that parks every send until released.
#[derive(Debug, Default)]
pub struct BlockingSink {
    entered: Notify,
    gate: Notify,
    send_count: AtomicUsize,
}

impl BlockingSink {
    /// Create a closed sink
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Wait until a send is parked
    pub async fn wait_until_entered(&self) {
        self.entered.notified().await;
    }

    /// Let one parked send complete successfully
    pub fn release(&self) {
        self.gate.notify_one();
    }

    /// Number of send calls
    pub fn send_count(&self) -> usize {
        self.send_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EventSink for BlockingSink {
    async fn send(&self, _batch: &EventBatch) -> Result<(), EventQueueError> {
        self.send_count.fetch_add(1, Ordering::SeqCst);
        self.entered.notify_one();
        self.gate.notified().await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_generators::events::events;

    #[tokio::test]
    async fn test_recording_sink_fails_then_records() {
        let sink = RecordingSink::failing(1);
        let batch = EventBatch::new(events(2));

        assert!(sink.send(&batch).await.is_err());
        assert!(sink.send(&batch).await.is_ok());
        assert_eq!(sink.send_count(), 2);
        assert_eq!(sink.batches().len(), 1);
        assert_eq!(sink.sent_events().len(), 2);
    }
}
