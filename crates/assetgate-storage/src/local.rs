use crate::traits::{check_path, Storage, StorageError, StorageResult};
use crate::StorageProvider;
use async_trait::async_trait;
use bytes::Bytes;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Local filesystem storage implementation
#[derive(Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
    base_url: String,
}

impl LocalStorage {
    /// Create a new LocalStorage instance
    ///
    /// # Arguments
    /// * `base_path` - Root directory for file storage (e.g., "/var/lib/assetgate/uploads")
    /// * `base_url` - URL prefix files are served under (e.g., "/storage")
    pub async fn new(base_path: impl Into<PathBuf>, base_url: String) -> StorageResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(LocalStorage {
            base_path,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Convert a relative path to a filesystem path under the base directory
    fn key_to_path(&self, path: &str) -> StorageResult<PathBuf> {
        check_path(path)?;
        Ok(self.base_path.join(path))
    }

    /// Ensure parent directory exists
    async fn ensure_parent_dir(&self, path: &Path) -> StorageResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl Storage for LocalStorage {
    async fn save(&self, data: Bytes, path: &str, _content_type: &str) -> StorageResult<String> {
        let file_path = self.key_to_path(path)?;
        let size = data.len();

        self.ensure_parent_dir(&file_path).await?;

        let start = std::time::Instant::now();

        let mut file = fs::File::create(&file_path).await.map_err(|e| {
            StorageError::UploadFailed(format!(
                "Failed to create file {}: {}",
                file_path.display(),
                e
            ))
        })?;

        file.write_all(&data).await.map_err(|e| {
            StorageError::UploadFailed(format!(
                "Failed to write file {}: {}",
                file_path.display(),
                e
            ))
        })?;

        file.sync_all().await.map_err(|e| {
            StorageError::UploadFailed(format!(
                "Failed to sync file {}: {}",
                file_path.display(),
                e
            ))
        })?;

        tracing::info!(
            path = %file_path.display(),
            key = %path,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage write successful"
        );

        Ok(self.url_for(path))
    }

    async fn delete(&self, url_or_path: &str) -> StorageResult<bool> {
        let key = self.resolve_path(url_or_path);
        let file_path = self.key_to_path(&key)?;

        match fs::remove_file(&file_path).await {
            Ok(()) => {
                tracing::info!(key = %key, "Local storage delete successful");
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(key = %key, "Local storage delete: nothing to remove");
                Ok(false)
            }
            Err(e) => Err(StorageError::DeleteFailed(format!(
                "Failed to delete file {}: {}",
                file_path.display(),
                e
            ))),
        }
    }

    async fn exists(&self, path: &str) -> StorageResult<bool> {
        let file_path = self.key_to_path(path)?;
        Ok(fs::try_exists(&file_path).await.unwrap_or(false))
    }

    async fn read(&self, path: &str) -> StorageResult<Bytes> {
        let file_path = self.key_to_path(path)?;
        match fs::read(&file_path).await {
            Ok(data) => Ok(Bytes::from(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(path.to_string()))
            }
            Err(e) => Err(StorageError::IoError(e)),
        }
    }

    fn url_for(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    fn path_from_url(&self, url: &str) -> Option<String> {
        let prefix = format!("{}/", self.base_url);
        url.strip_prefix(&prefix)
            .filter(|rest| !rest.is_empty())
            .map(String::from)
    }

    fn provider(&self) -> StorageProvider {
        StorageProvider::Local
    }
}
