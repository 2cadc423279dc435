//! Delivery of event batches to the remote collector.

use crate::error::EventQueueError;
use crate::event::EventBatch;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

/// Destination for event batches.
///
/// Returning `Ok` acknowledges every event in the batch.
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Deliver one batch
    async fn send(&self, batch: &EventBatch) -> Result<(), EventQueueError>;
}

/// Sink posting batches as JSON to an HTTP collector
#[derive(Debug, Clone)]
pub struct HttpCollector {
    endpoint: String,
    client: Client,
}

impl HttpCollector {
    /// Build a collector for `endpoint` with a per-request timeout
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, EventQueueError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| EventQueueError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            endpoint: endpoint.into(),
            client,
        })
    }

    /// Collector URL
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn map_http_error(&self, error: reqwest::Error) -> EventQueueError {
        if error.is_timeout() {
            EventQueueError::Transport(format!("Request timeout: {}", error))
        } else if error.is_connect() {
            EventQueueError::Transport(format!("Connection error: {}", error))
        } else {
            EventQueueError::Transport(format!("HTTP error: {}", error))
        }
    }
}

#[async_trait]
impl EventSink for HttpCollector {
    async fn send(&self, batch: &EventBatch) -> Result<(), EventQueueError> {
        debug!(endpoint = %self.endpoint, events = batch.len(), "Posting event batch");

        let response = self
            .client
            .post(&self.endpoint)
            .json(batch)
            .send()
            .await
            .map_err(|e| self.map_http_error(e))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(EventQueueError::Status {
            status: status.as_u16(),
            body,
        })
    }
}
