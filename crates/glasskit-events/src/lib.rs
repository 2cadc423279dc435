//! Glasskit Events
//!
//! An at-least-once, locally persisted outbound queue for telemetry events.
//! Events are batched, flushed to a remote collector on a size threshold or
//! a host-owned timer, and retried with exponential backoff on failure.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod collector;
pub mod config;
pub mod error;
pub mod event;
pub mod queue;
pub mod retry;
pub mod scheduler;
pub mod storage;
pub mod tracker;

pub use collector::{EventSink, HttpCollector};
pub use config::{QueueConfig, DEFAULT_STORAGE_KEY};
pub use error::{EventQueueError, StorageError};
pub use event::{Event, EventBatch, Properties};
pub use queue::{EventQueue, FlushOutcome, QueueStats};
pub use retry::RetryPolicy;
pub use scheduler::AutoFlush;
pub use storage::{FileStorage, InMemoryStorage, KeyValueStorage};
pub use tracker::{EventTracker, SESSION_STORAGE_KEY};
