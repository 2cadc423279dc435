//! Periodic flushing owned by the host.

use crate::error::EventQueueError;
use crate::queue::{EventQueue, FlushOutcome};
use glasskit_monitoring::LogExt;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;

/// Background task calling [`EventQueue::flush`] on a fixed interval.
///
/// The task stops when [`AutoFlush::stop`] is called or the handle is
/// dropped.
#[derive(Debug)]
pub struct AutoFlush {
    handle: JoinHandle<()>,
}

impl AutoFlush {
    /// Flush `queue` every `interval`, starting one interval from now.
    ///
    /// Fails with [`EventQueueError::Configuration`] for a zero interval.
    pub fn spawn(queue: EventQueue, interval: Duration) -> Result<Self, EventQueueError> {
        if interval.is_zero() {
            return Err(EventQueueError::Configuration(
                "flush interval must be greater than 0".to_string(),
            ));
        }

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticker.tick().await;

            loop {
                ticker.tick().await;
                match queue.flush().await.log_err("Periodic event flush failed") {
                    Ok(FlushOutcome::Sent(count)) => debug!(count, "Periodic flush sent events"),
                    Ok(outcome) => debug!(?outcome, "Periodic flush"),
                    Err(_) => {}
                }
            }
        });

        Ok(Self { handle })
    }

    /// Flush on the queue's configured `batchInterval`
    pub fn from_config(queue: EventQueue) -> Result<Self, EventQueueError> {
        let interval = queue.config().batch_interval();
        Self::spawn(queue, interval)
    }

    /// Stop the task
    pub fn stop(self) {
        self.handle.abort();
    }

    /// Whether the task is still running
    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }
}

impl Drop for AutoFlush {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
