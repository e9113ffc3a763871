/*
    errors.rs - Error types for the auth subsystem
*/

use crate::storage::StorageError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    /// Unknown email or wrong password (deliberately indistinguishable)
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("An account with email {0} already exists")]
    EmailTaken(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Password hashing failed: {0}")]
    Hashing(String),
}

pub type AuthResult<T> = Result<T, AuthError>;

impl From<serde_json::Error> for AuthError {
    fn from(err: serde_json::Error) -> Self {
        AuthError::Serialization(err.to_string())
    }
}
