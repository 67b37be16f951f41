//! Error types for fsdb
//!
//! Provides a unified error type for all store operations.

use thiserror::Error;

/// Result type alias using FsDbError
pub type Result<T> = std::result::Result<T, FsDbError>;

/// Unified error type for fsdb operations
#[derive(Debug, Error)]
pub enum FsDbError {
    // -------------------------------------------------------------------------
    // Lookup Errors
    // -------------------------------------------------------------------------
    #[error("collection does not exist: {0}")]
    CollectionNotFound(String),

    #[error("key does not exist: {collection}/{key}")]
    KeyNotFound { collection: String, key: String },

    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Serialization Errors
    // -------------------------------------------------------------------------
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // -------------------------------------------------------------------------
    // Naming Errors
    // -------------------------------------------------------------------------
    #[error("Invalid name: {0:?}")]
    InvalidName(String),
}

impl FsDbError {
    /// True for both unknown collections and unknown keys
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            FsDbError::CollectionNotFound(_) | FsDbError::KeyNotFound { .. }
        )
    }

    pub(crate) fn key_not_found(collection: &str, key: &str) -> Self {
        FsDbError::KeyNotFound {
            collection: collection.to_string(),
            key: key.to_string(),
        }
    }
}
