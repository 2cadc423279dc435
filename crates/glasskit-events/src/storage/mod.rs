//! Durable key-value slots used to persist the queue and the session id.

use crate::error::StorageError;
use async_trait::async_trait;

mod file;
mod memory;

pub use file::FileStorage;
pub use memory::InMemoryStorage;

/// Minimal asynchronous key-value contract
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait KeyValueStorage: Send + Sync {
    /// Read a value, `None` if the key was never written or was removed
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Write a value, replacing any previous one
    async fn set(&self, key: &str, value: String) -> Result<(), StorageError>;

    /// Remove a value. Removing a missing key is not an error.
    async fn remove(&self, key: &str) -> Result<(), StorageError>;
}
