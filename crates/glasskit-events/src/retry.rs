//! Bounded exponential backoff.

use crate::error::EventQueueError;
use glasskit_monitoring::EventQueueMetrics;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// How a failed send is retried
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,
    /// Delay before the second attempt; doubles for every further attempt
    pub base_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 1000,
        }
    }
}

impl RetryPolicy {
    /// Delay to wait after the given failed attempt (1-based)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2_u64.saturating_pow(attempt.saturating_sub(1));
        Duration::from_millis(self.base_delay_ms.saturating_mul(factor))
    }

    /// Run `operation` until it succeeds or the attempts are used up.
    ///
    /// Returns the value together with the number of attempts it took. No
    /// delay follows the final attempt.
    pub async fn run<T, F, Fut>(&self, mut operation: F) -> Result<(T, u32), EventQueueError>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, EventQueueError>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match operation(attempt).await {
                Ok(value) => return Ok((value, attempt)),
                Err(e) if attempt >= max_attempts => {
                    EventQueueMetrics::record_flush_failure(attempt);
                    return Err(EventQueueError::RetriesExhausted {
                        attempts: attempt,
                        last_error: Box::new(e),
                    });
                }
                Err(e) => {
                    let delay = self.delay_for(attempt);
                    warn!(
                        attempt,
                        max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        "Send attempt failed, retrying: {}",
                        e
                    );
                    EventQueueMetrics::record_flush_retry(attempt);
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}
