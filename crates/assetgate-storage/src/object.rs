//! Object store backed storage (S3-compatible and Azure Blob)
//!
//! Both providers share this implementation over `Arc<dyn ObjectStore>` and
//! differ only in how the client is authenticated and how public URLs are
//! formed.

use crate::traits::{check_path, Storage, StorageError, StorageResult};
use crate::StorageProvider;
use async_trait::async_trait;
use bytes::Bytes;
use object_store::path::Path;
use object_store::Error as ObjectStoreError;
use object_store::{
    Attribute, Attributes, ObjectStore, ObjectStoreExt, PutOptions, PutPayload,
    Result as ObjectResult,
};
use std::sync::Arc;

/// Storage over a generic object store client
#[derive(Clone)]
pub struct ObjectStoreStorage {
    store: Arc<dyn ObjectStore>,
    provider: StorageProvider,
    /// Public URL prefix of the bucket/container, without trailing slash
    url_base: String,
}

impl ObjectStoreStorage {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        provider: StorageProvider,
        url_base: impl Into<String>,
    ) -> Self {
        let url_base: String = url_base.into();
        Self {
            store,
            provider,
            url_base: url_base.trim_end_matches('/').to_string(),
        }
    }

    /// S3 or S3-compatible bucket (`blobA`)
    ///
    /// # Arguments
    /// * `bucket` - S3 bucket name
    /// * `region` - AWS region (or region identifier for S3-compatible providers)
    /// * `endpoint_url` - Optional custom endpoint for S3-compatible providers
    ///   (e.g., "http://localhost:9000" for MinIO)
    #[cfg(feature = "storage-s3")]
    pub fn s3(bucket: String, region: String, endpoint_url: Option<String>) -> StorageResult<Self> {
        use object_store::aws::AmazonS3Builder;

        // Credentials come from the standard AWS environment variables.
        let mut builder = AmazonS3Builder::from_env()
            .with_region(region.clone())
            .with_bucket_name(bucket.clone());

        if let Some(ref endpoint) = endpoint_url {
            let allow_http = endpoint.starts_with("http://");
            builder = builder
                .with_endpoint(endpoint.clone())
                .with_allow_http(allow_http);
        }

        let store = builder
            .build()
            .map_err(|e| StorageError::ConfigError(e.to_string()))?;

        // Path-style URLs for S3-compatible providers, virtual-hosted style for AWS
        let url_base = match endpoint_url {
            Some(endpoint) => format!("{}/{}", endpoint.trim_end_matches('/'), bucket),
            None => format!("https://{}.s3.{}.amazonaws.com", bucket, region),
        };

        Ok(Self::new(Arc::new(store), StorageProvider::BlobA, url_base))
    }

    /// Azure Blob container (`blobB`)
    #[cfg(feature = "storage-azure")]
    pub fn azure(account: String, access_key: String, container: String) -> StorageResult<Self> {
        use object_store::azure::MicrosoftAzureBuilder;

        let store = MicrosoftAzureBuilder::new()
            .with_account(account.clone())
            .with_access_key(access_key)
            .with_container_name(container.clone())
            .build()
            .map_err(|e| StorageError::ConfigError(e.to_string()))?;

        let url_base = format!("https://{}.blob.core.windows.net/{}", account, container);

        Ok(Self::new(Arc::new(store), StorageProvider::BlobB, url_base))
    }

    fn location(path: &str) -> StorageResult<Path> {
        check_path(path)?;
        Ok(Path::from(path.to_string()))
    }
}

#[async_trait]
impl Storage for ObjectStoreStorage {
    async fn save(&self, data: Bytes, path: &str, content_type: &str) -> StorageResult<String> {
        let location = Self::location(path)?;
        let size = data.len() as u64;
        let start = std::time::Instant::now();

        let mut attributes = Attributes::new();
        attributes.insert(Attribute::ContentType, content_type.to_string().into());
        let options = PutOptions {
            attributes,
            ..Default::default()
        };

        let result: ObjectResult<_> = self
            .store
            .put_opts(&location, PutPayload::from(data), options)
            .await;

        result.map_err(|e| {
            tracing::error!(
                error = %e,
                provider = %self.provider,
                key = %path,
                size_bytes = size,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "Object store write failed"
            );
            StorageError::UploadFailed(e.to_string())
        })?;

        tracing::info!(
            provider = %self.provider,
            key = %path,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Object store write successful"
        );

        Ok(self.url_for(path))
    }

    async fn delete(&self, url_or_path: &str) -> StorageResult<bool> {
        let key = self.resolve_path(url_or_path);
        let location = Self::location(&key)?;
        let start = std::time::Instant::now();

        // Object stores delete idempotently, so existence is probed first.
        match self.store.head(&location).await {
            Ok(_) => {}
            Err(ObjectStoreError::NotFound { .. }) => return Ok(false),
            Err(e) => return Err(StorageError::BackendError(e.to_string())),
        }

        let result: ObjectResult<_> = self.store.delete(&location).await;

        result.map_err(|e| {
            tracing::error!(
                error = %e,
                provider = %self.provider,
                key = %key,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "Object store delete failed"
            );
            StorageError::DeleteFailed(e.to_string())
        })?;

        tracing::info!(
            provider = %self.provider,
            key = %key,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Object store delete successful"
        );

        Ok(true)
    }

    async fn exists(&self, path: &str) -> StorageResult<bool> {
        let location = Self::location(path)?;
        match self.store.head(&location).await {
            Ok(_) => Ok(true),
            Err(ObjectStoreError::NotFound { .. }) => Ok(false),
            Err(e) => Err(StorageError::BackendError(e.to_string())),
        }
    }

    async fn read(&self, path: &str) -> StorageResult<Bytes> {
        let location = Self::location(path)?;
        let result = self.store.get(&location).await.map_err(|e| match e {
            ObjectStoreError::NotFound { .. } => StorageError::NotFound(path.to_string()),
            other => StorageError::BackendError(other.to_string()),
        })?;

        result
            .bytes()
            .await
            .map_err(|e| StorageError::BackendError(e.to_string()))
    }

    fn url_for(&self, path: &str) -> String {
        format!("{}/{}", self.url_base, path)
    }

    fn path_from_url(&self, url: &str) -> Option<String> {
        let prefix = format!("{}/", self.url_base);
        url.strip_prefix(&prefix)
            .filter(|rest| !rest.is_empty())
            .map(String::from)
    }

    fn provider(&self) -> StorageProvider {
        self.provider
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use object_store::memory::InMemory;

    fn storage() -> ObjectStoreStorage {
        ObjectStoreStorage::new(
            Arc::new(InMemory::new()),
            StorageProvider::BlobA,
            "https://media.s3.eu-west-3.amazonaws.com/",
        )
    }

    #[tokio::test]
    async fn test_save_and_read() {
        let storage = storage();
        let url = storage
            .save(
                Bytes::from_static(b"jpeg-bytes"),
                "vehicles/42/2026/03/v.jpg",
                "image/jpeg",
            )
            .await
            .unwrap();

        assert_eq!(
            url,
            "https://media.s3.eu-west-3.amazonaws.com/vehicles/42/2026/03/v.jpg"
        );
        assert_eq!(
            storage.read("vehicles/42/2026/03/v.jpg").await.unwrap(),
            Bytes::from_static(b"jpeg-bytes")
        );
    }

    #[tokio::test]
    async fn test_delete_reports_existence() {
        let storage = storage();
        let url = storage
            .save(Bytes::from_static(b"x"), "avatars/1/2026/01/a.jpg", "image/jpeg")
            .await
            .unwrap();

        assert!(storage.delete(&url).await.unwrap());
        assert!(!storage.exists("avatars/1/2026/01/a.jpg").await.unwrap());
        assert!(!storage.delete("avatars/1/2026/01/a.jpg").await.unwrap());
    }

    #[tokio::test]
    async fn test_read_missing_is_not_found() {
        let err = storage().read("nope/x.jpg").await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_rejects_traversal() {
        let err = storage()
            .save(Bytes::from_static(b"x"), "a/../../b", "image/jpeg")
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::InvalidKey(_)));
    }

    #[cfg(feature = "storage-azure")]
    #[test]
    fn test_azure_url_scheme() {
        let storage = ObjectStoreStorage::azure(
            "acct".to_string(),
            "a2V5".to_string(),
            "media".to_string(),
        )
        .unwrap();
        assert_eq!(
            storage.url_for("documents/1/2026/01/d.pdf"),
            "https://acct.blob.core.windows.net/media/documents/1/2026/01/d.pdf"
        );
        assert_eq!(
            storage
                .path_from_url("https://acct.blob.core.windows.net/media/documents/1/d.pdf")
                .as_deref(),
            Some("documents/1/d.pdf")
        );
        assert_eq!(storage.provider(), StorageProvider::BlobB);
    }

    #[cfg(feature = "storage-s3")]
    #[test]
    fn test_s3_compatible_url_scheme() {
        let storage = ObjectStoreStorage::s3(
            "media".to_string(),
            "us-east-1".to_string(),
            Some("http://localhost:9000/".to_string()),
        )
        .unwrap();
        assert_eq!(
            storage.url_for("avatars/1/a.jpg"),
            "http://localhost:9000/media/avatars/1/a.jpg"
        );
    }
}
