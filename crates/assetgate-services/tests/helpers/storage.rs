use assetgate_core::StorageProvider;
use assetgate_services::{Storage, StorageError, StorageResult};
use async_trait::async_trait;
use bytes::Bytes;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Store wrapper that counts writes and can fail the n-th one.
pub struct CountingStorage {
    inner: Arc<dyn Storage>,
    saves: AtomicUsize,
    fail_on_save: Option<usize>,
    cancel_after_save: Option<(usize, CancellationToken)>,
}

impl CountingStorage {
    pub fn new(inner: Arc<dyn Storage>) -> Self {
        Self {
            inner,
            saves: AtomicUsize::new(0),
            fail_on_save: None,
            cancel_after_save: None,
        }
    }

    /// Fail the `n`-th save (1-based) and every one after it.
    pub fn failing_from(inner: Arc<dyn Storage>, n: usize) -> Self {
        Self {
            inner,
            saves: AtomicUsize::new(0),
            fail_on_save: Some(n),
            cancel_after_save: None,
        }
    }

    /// Fire `token` once the `n`-th save has completed.
    pub fn cancelling_after(inner: Arc<dyn Storage>, n: usize, token: CancellationToken) -> Self {
        Self {
            inner,
            saves: AtomicUsize::new(0),
            fail_on_save: None,
            cancel_after_save: Some((n, token)),
        }
    }

    pub fn saves(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Storage for CountingStorage {
    async fn save(&self, data: Bytes, path: &str, content_type: &str) -> StorageResult<String> {
        let attempt = self.saves.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_on_save.is_some_and(|n| attempt >= n) {
            return Err(StorageError::UploadFailed(format!(
                "injected failure on write {}",
                attempt
            )));
        }
        let url = self.inner.save(data, path, content_type).await?;
        if let Some((n, token)) = &self.cancel_after_save {
            if attempt >= *n {
                token.cancel();
            }
        }
        Ok(url)
    }

    async fn delete(&self, url_or_path: &str) -> StorageResult<bool> {
        self.inner.delete(url_or_path).await
    }

    async fn exists(&self, path: &str) -> StorageResult<bool> {
        self.inner.exists(path).await
    }

    async fn read(&self, path: &str) -> StorageResult<Bytes> {
        self.inner.read(path).await
    }

    fn url_for(&self, path: &str) -> String {
        self.inner.url_for(path)
    }

    fn path_from_url(&self, url: &str) -> Option<String> {
        self.inner.path_from_url(url)
    }

    fn provider(&self) -> StorageProvider {
        self.inner.provider()
    }
}
