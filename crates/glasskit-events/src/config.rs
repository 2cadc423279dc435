//! Queue configuration.

use crate::error::EventQueueError;
use crate::retry::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

/// Storage key of the persisted queue
pub const DEFAULT_STORAGE_KEY: &str = "glasskit:event_queue";

/// Event queue configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QueueConfig {
    /// Queue size that triggers an opportunistic flush from `add`
    pub batch_size: usize,
    /// Period of the host-owned flush scheduler, in milliseconds
    pub batch_interval: u64,
    /// Collector URL; without one, events stay queued
    pub endpoint: Option<String>,
    /// Maximum number of persisted events; the oldest are evicted first
    pub max_queue_size: usize,
    /// Storage key of the persisted queue
    pub storage_key: String,
    /// Retry behaviour of a flush
    pub retry: RetryPolicy,
    /// Per-request timeout of the HTTP collector, in milliseconds
    pub request_timeout_ms: u64,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            batch_size: 10,
            batch_interval: 30_000,
            endpoint: None,
            max_queue_size: 1000,
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            retry: RetryPolicy::default(),
            request_timeout_ms: 10_000,
        }
    }
}

impl QueueConfig {
    /// Load configuration from `GLASSKIT_EVENTS_*` environment variables,
    /// falling back to defaults
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(endpoint) = env::var("GLASSKIT_EVENTS_ENDPOINT") {
            if !endpoint.trim().is_empty() {
                config.endpoint = Some(endpoint);
            }
        }
        if let Some(batch_size) = parse_env("GLASSKIT_EVENTS_BATCH_SIZE") {
            config.batch_size = batch_size;
        }
        if let Some(interval) = parse_env("GLASSKIT_EVENTS_BATCH_INTERVAL_MS") {
            config.batch_interval = interval;
        }
        if let Some(max_size) = parse_env("GLASSKIT_EVENTS_MAX_QUEUE_SIZE") {
            config.max_queue_size = max_size;
        }
        if let Some(attempts) = parse_env("GLASSKIT_EVENTS_MAX_ATTEMPTS") {
            config.retry.max_attempts = attempts;
        }

        config
    }

    /// Set the collector endpoint
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Flush scheduler period
    pub fn batch_interval(&self) -> Duration {
        Duration::from_millis(self.batch_interval)
    }

    /// HTTP request timeout
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Reject settings the queue cannot work with
    pub fn validate(&self) -> Result<(), EventQueueError> {
        if self.batch_size == 0 {
            return Err(EventQueueError::Configuration("batchSize must be greater than 0".to_string()));
        }
        if self.batch_interval == 0 {
            return Err(EventQueueError::Configuration("batchInterval must be greater than 0".to_string()));
        }
        if self.max_queue_size == 0 {
            return Err(EventQueueError::Configuration("maxQueueSize must be greater than 0".to_string()));
        }
        if self.retry.max_attempts == 0 {
            return Err(EventQueueError::Configuration("retry.maxAttempts must be greater than 0".to_string()));
        }
        if self.storage_key.is_empty() {
            return Err(EventQueueError::Configuration("storageKey must not be empty".to_string()));
        }
        Ok(())
    }
}

fn parse_env<T: FromStr>(name: &str) -> Option<T> {
    let raw = env::var(name).ok()?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("Invalid {} value: {}, using default", name, raw);
            None
        }
    }
}
