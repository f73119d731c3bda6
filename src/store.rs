//! Persistent key-value layer for record partitions.
//!
//! One logical table: key = partition string (e.g. `WKTS2025`), value =
//! the full record sequence for that key, overwritten wholesale on save.
//! The layer is opaque to the value's meaning and imposes no size limit
//! of its own.

use async_trait::async_trait;
use std::path::PathBuf;
use tracing::debug;

use crate::error::StoreError;
use crate::model::Record;

/// Durable key → records persistence.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Returns the stored sequence for `key`, or `None` if it was never
    /// written.
    async fn get(&self, key: &str) -> Result<Option<Vec<Record>>, StoreError>;

    /// Overwrites the value at `key`. No partial-write state is
    /// observable: the prior value remains readable until the write
    /// commits.
    async fn put(&self, key: &str, records: &[Record]) -> Result<(), StoreError>;

    /// Removes one key. Removing an absent key is not an error.
    async fn delete(&self, key: &str) -> Result<(), StoreError>;

    /// Removes every key.
    async fn clear(&self) -> Result<(), StoreError>;
}

/// File-backed [`RecordStore`]: one JSON file per key under a data
/// directory. Writes go to a temp file first and are renamed into place,
/// so a quota failure mid-write never clobbers the prior value.
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

#[async_trait]
impl RecordStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<Record>>, StoreError> {
        let path = self.path_for(key);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreError::Unavailable(e)),
        };

        let records: Vec<Record> = serde_json::from_slice(&bytes).map_err(StoreError::Corrupt)?;
        debug!(key, count = records.len(), "store read");
        Ok(Some(records))
    }

    async fn put(&self, key: &str, records: &[Record]) -> Result<(), StoreError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(StoreError::from_io)?;

        let body = serde_json::to_vec(records).map_err(StoreError::Corrupt)?;
        let path = self.path_for(key);
        let tmp = self.dir.join(format!("{key}.json.tmp"));

        if let Err(e) = tokio::fs::write(&tmp, &body).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(StoreError::from_io(e));
        }
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(StoreError::from_io)?;

        debug!(key, count = records.len(), "store write");
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        match tokio::fs::remove_file(self.path_for(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::Unavailable(e)),
        }
    }

    async fn clear(&self) -> Result<(), StoreError> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(StoreError::Unavailable(e)),
        };

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(StoreError::Unavailable)?
        {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some("json") {
                tokio::fs::remove_file(&path)
                    .await
                    .map_err(StoreError::Unavailable)?;
            }
        }

        Ok(())
    }
}
