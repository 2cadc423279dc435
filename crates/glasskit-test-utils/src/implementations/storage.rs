//! Storage fakes.

use async_trait::async_trait;
use glasskit_events::{InMemoryStorage, KeyValueStorage, StorageError};
use std::sync::atomic::{AtomicBool, Ordering};

/// Storage wrapping an in-memory map whose writes can be switched to fail
#[derive(Debug, Default)]
pub struct FailingStorage {
    inner: InMemoryStorage,
    fail_writes: AtomicBool,
    fail_reads: AtomicBool,
}

impl FailingStorage {
    /// Storage that works until told otherwise
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `set` and `remove` fail
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Make `get` fail
    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    fn check(&self, flag: &AtomicBool, op: &str) -> Result<(), StorageError> {
        if flag.load(Ordering::SeqCst) {
            Err(StorageError::Backend(format!("simulated {} failure", op)))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl KeyValueStorage for FailingStorage {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.check(&self.fail_reads, "read")?;
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: String) -> Result<(), StorageError> {
        self.check(&self.fail_writes, "write")?;
        self.inner.set(key, value).await
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.check(&self.fail_writes, "write")?;
        self.inner.remove(key).await
    }
}
