//! In-memory storage backend (non-persistent, for tests and scratch sessions)

use super::{validate_key, StorageBackend, StorageError, StorageResult};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

/// Helper to convert poison errors into StorageError
fn handle_poison<T>(_err: PoisonError<T>) -> StorageError {
    StorageError::LockPoisoned
}

/// In-memory key-value backend
#[derive(Clone, Default)]
pub struct MemoryStorage {
    entries: Arc<RwLock<HashMap<String, String>>>,
    fail_writes: Arc<AtomicBool>,
}

impl MemoryStorage {
    /// Create an empty memory backend
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `set`/`remove` fail with `Unavailable`.
    ///
    /// Lets callers exercise the persistence-failure paths of the stores.
    pub fn fail_writes(&self, enabled: bool) {
        self.fail_writes.store(enabled, Ordering::SeqCst);
    }

    /// Number of stored keys
    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    /// Whether nothing is stored
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check_writable(&self) -> StorageResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("writes disabled".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl StorageBackend for MemoryStorage {
    async fn get(&self, key: &str) -> StorageResult<Option<String>> {
        validate_key(key)?;
        Ok(self.entries.read().map_err(handle_poison)?.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        validate_key(key)?;
        self.check_writable()?;
        self.entries
            .write()
            .map_err(handle_poison)?
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> StorageResult<()> {
        validate_key(key)?;
        self.check_writable()?;
        self.entries.write().map_err(handle_poison)?.remove(key);
        Ok(())
    }

    async fn keys(&self) -> StorageResult<Vec<String>> {
        let mut keys: Vec<String> = self
            .entries
            .read()
            .map_err(handle_poison)?
            .keys()
            .cloned()
            .collect();
        keys.sort();
        Ok(keys)
    }
}
