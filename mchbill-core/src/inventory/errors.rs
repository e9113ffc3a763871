/*
    errors.rs - Error types for the inventory subsystem
*/

use crate::storage::StorageError;
use thiserror::Error;

/// Errors that can occur in inventory operations
#[derive(Debug, Error)]
pub enum InventoryError {
    /// Input rejected before any mutation
    #[error("Validation error: {0}")]
    Validation(String),

    /// Persistence layer failed; in-memory state was left untouched
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Reading or writing an import/export file failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for inventory operations
pub type InventoryResult<T> = Result<T, InventoryError>;

impl From<serde_json::Error> for InventoryError {
    fn from(err: serde_json::Error) -> Self {
        InventoryError::Serialization(err.to_string())
    }
}
