#[cfg(feature = "storage-local")]
use crate::LocalStorage;
#[cfg(any(feature = "storage-s3", feature = "storage-azure"))]
use crate::ObjectStoreStorage;
use crate::{Storage, StorageError, StorageProvider, StorageResult};
use assetgate_core::StorageConfig;
use std::sync::Arc;

fn required(value: &Option<String>, name: &str) -> StorageResult<String> {
    value
        .clone()
        .ok_or_else(|| StorageError::ConfigError(format!("{} not configured", name)))
}

/// Create the storage backend selected by configuration
pub async fn create_storage(config: &StorageConfig) -> StorageResult<Arc<dyn Storage>> {
    match config.provider {
        #[cfg(feature = "storage-s3")]
        StorageProvider::BlobA => {
            let bucket = required(&config.s3_bucket, "S3_BUCKET")?;
            let region = required(&config.s3_region, "S3_REGION or AWS_REGION")?;
            let storage = ObjectStoreStorage::s3(bucket, region, config.s3_endpoint.clone())?;
            Ok(Arc::new(storage))
        }

        #[cfg(not(feature = "storage-s3"))]
        StorageProvider::BlobA => Err(StorageError::ConfigError(
            "S3 storage backend not available (storage-s3 feature not enabled)".to_string(),
        )),

        #[cfg(feature = "storage-azure")]
        StorageProvider::BlobB => {
            let account = required(&config.azure_account, "AZURE_STORAGE_ACCOUNT")?;
            let access_key = required(&config.azure_access_key, "AZURE_STORAGE_KEY")?;
            let container = required(&config.azure_container, "AZURE_STORAGE_CONTAINER")?;
            let storage = ObjectStoreStorage::azure(account, access_key, container)?;
            Ok(Arc::new(storage))
        }

        #[cfg(not(feature = "storage-azure"))]
        StorageProvider::BlobB => Err(StorageError::ConfigError(
            "Azure storage backend not available (storage-azure feature not enabled)".to_string(),
        )),

        #[cfg(feature = "storage-local")]
        StorageProvider::Local => {
            if config.local_path.trim().is_empty() {
                return Err(StorageError::ConfigError(
                    "LOCAL_STORAGE_PATH not configured".to_string(),
                ));
            }
            let storage =
                LocalStorage::new(&config.local_path, config.local_base_url.clone()).await?;
            Ok(Arc::new(storage))
        }

        #[cfg(not(feature = "storage-local"))]
        StorageProvider::Local => Err(StorageError::ConfigError(
            "Local storage backend not available (storage-local feature not enabled)".to_string(),
        )),
    }
}
