//! Storage abstraction trait
//!
//! This module defines the Storage trait that all object store gateways implement.

use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use postpix_core::PipelineError;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("Object not found: {bucket}/{key}")]
    NotFound { bucket: String, key: String },

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

impl From<StorageError> for PipelineError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound { bucket, key } => PipelineError::NotFound { bucket, key },
            StorageError::InvalidKey(reason) => PipelineError::MalformedNotification(reason),
            other => PipelineError::Transient(other.to_string()),
        }
    }
}

/// Source object bytes plus the content type the store reported for them, if any.
#[derive(Debug, Clone)]
pub struct FetchedObject {
    pub data: Bytes,
    pub content_type: Option<String>,
}

/// Object store gateway
///
/// Implementations never retry internally; errors go straight back to the caller,
/// which decides whether the failure is item-scoped. A `store` either fully replaces
/// the object at `(bucket, key)` or leaves it untouched, so re-running an interrupted
/// work item overwrites rather than corrupts its derivative.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Fetch the full object at `(bucket, key)`.
    ///
    /// Returns `StorageError::NotFound` when the object does not exist.
    async fn fetch(&self, bucket: &str, key: &str) -> StorageResult<FetchedObject>;

    /// Write `data` to `(bucket, key)` and return the object's public URL.
    async fn store(
        &self,
        bucket: &str,
        key: &str,
        data: Bytes,
        content_type: &str,
    ) -> StorageResult<String>;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;
}

/// Reject keys that could escape their bucket.
pub(crate) fn validate_key(key: &str) -> StorageResult<()> {
    if key.is_empty() {
        return Err(StorageError::InvalidKey("Storage key is empty".to_string()));
    }
    if key.split('/').any(|segment| segment == "..") || key.starts_with('/') {
        return Err(StorageError::InvalidKey(format!(
            "Storage key '{}' contains invalid path segments",
            key
        )));
    }
    Ok(())
}
