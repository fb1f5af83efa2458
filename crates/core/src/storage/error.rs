//! Error types for the storage module.

use thiserror::Error;

/// Errors that can occur while writing to an object store.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The store rejected the write or could not be reached.
    #[error("Failed to put {key}: {reason}")]
    PutFailed { key: String, reason: String },

    /// The store is misconfigured.
    #[error("Invalid storage configuration: {0}")]
    InvalidConfig(String),
}

impl StorageError {
    /// Creates a new put failed error.
    pub fn put_failed(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::PutFailed {
            key: key.into(),
            reason: reason.into(),
        }
    }
}
