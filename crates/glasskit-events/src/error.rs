//! Error types for storage and delivery.

use thiserror::Error;

/// Errors raised by a key-value storage backend
#[derive(Error, Debug)]
pub enum StorageError {
    /// Filesystem failure
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Any other backend failure
    #[error("Storage backend error: {0}")]
    Backend(String),
}

/// Errors raised by the event queue and tracker
#[derive(Error, Debug)]
pub enum EventQueueError {
    /// Reading or writing the persisted queue failed
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// The persisted queue could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The request never produced a response
    #[error("Transport error: {0}")]
    Transport(String),

    /// The collector answered with a non-success status
    #[error("Collector returned status {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body, possibly empty
        body: String,
    },

    /// Every send attempt failed
    #[error("Flush failed after {attempts} attempts: {last_error}")]
    RetriesExhausted {
        /// Number of attempts made
        attempts: u32,
        /// Error of the final attempt
        last_error: Box<EventQueueError>,
    },

    /// Invalid queue configuration
    #[error("Configuration error: {0}")]
    Configuration(String),
}
