//! Storage module
//!
//! Key-value persistence used by the inventory and auth stores. Values are
//! strings (JSON documents); backends decide where the bytes end up.

use async_trait::async_trait;
use thiserror::Error;

pub mod encryption;
pub mod file;
pub mod memory;
pub mod secure;

pub use encryption::Cipher;
pub use file::FileStorage;
pub use memory::MemoryStorage;
pub use secure::{ActivityTimer, SecureStorage};

/// Key holding the registered user list
pub const USERS_KEY: &str = "mch_users";

/// Key holding the active session pointer
pub const SESSION_KEY: &str = "mch_session";

/// Key holding the flattened inventory snapshot
pub const INVENTORY_KEY: &str = "mch_inventory";

/// Key holding the highest inventory id ever issued
pub const INVENTORY_SEQ_KEY: &str = "mch_inventory_seq";

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid key: {0}")]
    InvalidKey(String),

    #[error("Encryption error: {0}")]
    Encryption(String),

    #[error("Decryption error: {0}")]
    Decryption(String),

    #[error("Corrupted record under {key}: {reason}")]
    Corrupted { key: String, reason: String },

    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error("Lock poisoned: a thread panicked while holding the lock")]
    LockPoisoned,
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Abstract key-value backend
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Read the value stored under `key`
    async fn get(&self, key: &str) -> StorageResult<Option<String>>;

    /// Store `value` under `key`, replacing any previous value
    async fn set(&self, key: &str, value: &str) -> StorageResult<()>;

    /// Remove `key`. Removing a missing key is not an error.
    async fn remove(&self, key: &str) -> StorageResult<()>;

    /// List all keys currently stored
    async fn keys(&self) -> StorageResult<Vec<String>>;

    /// Whether the backend's idle-session window has elapsed
    fn idle_expired(&self) -> bool {
        false
    }
}

/// Reject keys that cannot be mapped safely onto a file name
pub(crate) fn validate_key(key: &str) -> StorageResult<()> {
    if key.is_empty()
        || !key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.')
        || key.starts_with('.')
    {
        return Err(StorageError::InvalidKey(key.to_string()));
    }
    Ok(())
}
