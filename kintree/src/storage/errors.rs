//! Error types for storage operations

use std::error::Error;
use std::fmt;

/// Error type for storage operations
#[derive(Debug)]
pub enum StorageError {
    /// Atomic batch write was rejected
    Transaction(String),

    /// Record not found
    NotFound(String),

    /// Serialization/deserialization error
    Serialization(String),

    /// Connection error
    Connection(String),

    /// Validation error
    Validation(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::Transaction(msg) => write!(f, "Transaction error: {}", msg),
            StorageError::NotFound(msg) => write!(f, "Not found: {}", msg),
            StorageError::Serialization(msg) => write!(f, "Serialization error: {}", msg),
            StorageError::Connection(msg) => write!(f, "Connection error: {}", msg),
            StorageError::Validation(msg) => write!(f, "Validation error: {}", msg),
        }
    }
}

impl Error for StorageError {}

/// Convert a JSON error to a storage error
impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Serialization(err.to_string())
    }
}

/// Convert StorageError to the top-level KintreeError
impl From<StorageError> for crate::KintreeError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Transaction(s) => crate::KintreeError::TransactionFailure(s),
            StorageError::NotFound(s) => crate::KintreeError::NotFound(s),
            StorageError::Serialization(s) => crate::KintreeError::DecodeFailure(s),
            StorageError::Connection(s) => crate::KintreeError::Storage(s),
            StorageError::Validation(s) => crate::KintreeError::InvalidOperation(s),
        }
    }
}
