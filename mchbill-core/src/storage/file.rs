//! File-based storage backend
//!
//! Each key is one file `<data_dir>/<key>.dat`. Writes go to a temporary
//! sibling first and are renamed into place, so a crash mid-write leaves the
//! previous value intact.

use super::{validate_key, StorageBackend, StorageResult};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

const RECORD_EXTENSION: &str = "dat";

/// Directory-backed key-value store
#[derive(Debug, Clone)]
pub struct FileStorage {
    base_path: PathBuf,
}

impl FileStorage {
    /// Open (creating if needed) a store rooted at `base_path`
    pub async fn open(base_path: impl Into<PathBuf>) -> StorageResult<Self> {
        let base_path = base_path.into();
        fs::create_dir_all(&base_path).await?;
        debug!(path = %base_path.display(), "Opened file storage");
        Ok(FileStorage { base_path })
    }

    /// Directory holding the records
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn record_path(&self, key: &str) -> PathBuf {
        self.base_path.join(format!("{}.{}", key, RECORD_EXTENSION))
    }

    /// Write file atomically (write to temp, then rename)
    async fn write_atomic(&self, path: &Path, data: &str) -> StorageResult<()> {
        let temp_path = path.with_extension("tmp");
        fs::write(&temp_path, data).await?;
        fs::rename(&temp_path, path).await?;
        Ok(())
    }
}

#[async_trait]
impl StorageBackend for FileStorage {
    async fn get(&self, key: &str) -> StorageResult<Option<String>> {
        validate_key(key)?;
        match fs::read_to_string(self.record_path(key)).await {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        validate_key(key)?;
        let path = self.record_path(key);
        self.write_atomic(&path, value).await
    }

    async fn remove(&self, key: &str) -> StorageResult<()> {
        validate_key(key)?;
        match fs::remove_file(self.record_path(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn keys(&self) -> StorageResult<Vec<String>> {
        let mut keys = Vec::new();
        let mut entries = fs::read_dir(&self.base_path).await?;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(RECORD_EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                keys.push(stem.to_string());
            }
        }

        keys.sort();
        Ok(keys)
    }
}
