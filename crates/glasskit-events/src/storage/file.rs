use super::KeyValueStorage;
use crate::error::StorageError;
use async_trait::async_trait;
use std::fmt::Write as _;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, warn};
use uuid::Uuid;

/// Storage keeping one JSON file per key under a directory.
///
/// Writes go to a uniquely named temporary file that is then renamed over
/// the target, so a crash mid-write never leaves a truncated value behind.
/// Clones share one write lock.
#[derive(Debug, Clone)]
pub struct FileStorage {
    root: PathBuf,
    write_lock: Arc<Mutex<()>>,
}

impl FileStorage {
    /// Use `root` as the storage directory, creating it if needed
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let root = root.into();
        fs::create_dir_all(&root).await?;
        debug!(path = %root.display(), "Opened file storage");
        Ok(Self {
            root,
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    /// Storage directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File backing `key`.
    ///
    /// ASCII letters, digits and `-` are kept; every other byte becomes `_XX`
    /// (uppercase hex), so distinct keys never share a file.
    pub fn path_for(&self, key: &str) -> PathBuf {
        let mut file_name = String::with_capacity(key.len() + 5);
        for byte in key.bytes() {
            if byte.is_ascii_alphanumeric() || byte == b'-' {
                file_name.push(byte as char);
            } else {
                let _ = write!(file_name, "_{:02X}", byte);
            }
        }
        file_name.push_str(".json");
        self.root.join(file_name)
    }
}

#[async_trait]
impl KeyValueStorage for FileStorage {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(self.path_for(key)).await {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn set(&self, key: &str, value: String) -> Result<(), StorageError> {
        let path = self.path_for(key);
        let tmp = path.with_extension(format!("{}.tmp", Uuid::new_v4().simple()));

        let _guard = self.write_lock.lock().await;
        let written = match fs::write(&tmp, value).await {
            Ok(()) => fs::rename(&tmp, &path).await,
            Err(e) => Err(e),
        };

        if let Err(e) = written {
            if let Err(cleanup) = fs::remove_file(&tmp).await {
                if cleanup.kind() != ErrorKind::NotFound {
                    warn!(path = %tmp.display(), "Failed to remove temporary file: {}", cleanup);
                }
            }
            return Err(e.into());
        }
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().await;
        match fs::remove_file(self.path_for(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
