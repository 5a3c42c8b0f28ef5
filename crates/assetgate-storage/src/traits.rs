//! Storage abstraction trait
//!
//! This module defines the Storage trait that all storage backends must implement.

use crate::StorageProvider;
use assetgate_core::UploadError;
use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid storage path: {0}")]
    InvalidKey(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

impl From<StorageError> for UploadError {
    fn from(err: StorageError) -> Self {
        UploadError::StorageBackend(err.to_string())
    }
}

/// Storage abstraction trait
///
/// Exactly one backend is selected at startup and shared as
/// `Arc<dyn Storage>`. Paths are relative (see the crate root documentation);
/// URLs are whatever the backend serves the object under.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Write `data` at `path`, creating intermediate segments and overwriting
    /// any existing object. Returns the URL of the stored object.
    async fn save(&self, data: Bytes, path: &str, content_type: &str) -> StorageResult<String>;

    /// Delete an object given either its path or its URL.
    ///
    /// Returns `false` when nothing existed at that location.
    async fn delete(&self, url_or_path: &str) -> StorageResult<bool>;

    /// Check if an object exists
    async fn exists(&self, path: &str) -> StorageResult<bool>;

    /// Read an object back
    async fn read(&self, path: &str) -> StorageResult<Bytes>;

    /// URL an object at `path` is served under
    fn url_for(&self, path: &str) -> String;

    /// Recover the relative path from a URL produced by `url_for`
    fn path_from_url(&self, url: &str) -> Option<String>;

    /// Which provider this backend implements
    fn provider(&self) -> StorageProvider;

    /// Accept either a URL produced by this backend or a bare path.
    fn resolve_path(&self, url_or_path: &str) -> String {
        self.path_from_url(url_or_path)
            .unwrap_or_else(|| url_or_path.to_string())
    }
}

/// Reject paths that could escape the storage root.
pub(crate) fn check_path(path: &str) -> StorageResult<()> {
    if path.is_empty() || path.contains("..") || path.starts_with('/') || path.contains('\\') {
        return Err(StorageError::InvalidKey(format!(
            "Storage path contains invalid characters: {}",
            path
        )));
    }
    Ok(())
}
