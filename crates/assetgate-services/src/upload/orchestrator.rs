//! Upload orchestration
//!
//! Drives a request through validate, rate check, scan, transform, store and
//! sign. Nothing is written to storage until every earlier stage succeeded,
//! and an upload either returns a result with all of its variants stored or
//! returns an error.

use assetgate_core::{
    AppliedProcessing, AssetCategory, BatchConfig, PipelineConfig, ProcessedAsset, SigningConfig,
    TtlClass, UploadError, UploadFlags, UploadRequest, UploadResult, ValidatedAsset, VariantInfo,
    VariantName,
};
use assetgate_infra::{Cache, InMemoryCache, UploadRateLimiter, UrlSigner};
use assetgate_processing::{AssetTransformer, AssetValidator, ContentHasher};
use assetgate_storage::keys::{is_valid_segment, sanitize_segment};
use assetgate_storage::{create_storage, secure_filename, storage_path, variant_filename, Storage};
use chrono::Utc;
use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::stage::{StageTracker, UploadStage};
use crate::scanner::{ScanResult, ThreatScanner};

const SIGNED_URL_KEY_PREFIX: &str = "signed_url";

/// Pipeline coordinator shared by every request.
///
/// Cheap to share behind an `Arc`; all state lives in the injected
/// collaborators.
pub struct UploadOrchestrator {
    validator: Arc<AssetValidator>,
    transformer: Arc<AssetTransformer>,
    limiter: UploadRateLimiter,
    scanner: Option<Arc<dyn ThreatScanner>>,
    storage: Arc<dyn Storage>,
    signer: UrlSigner,
    cache: Arc<dyn Cache>,
    media_ttl: Duration,
    document_ttl: Duration,
    pub(crate) batch: BatchConfig,
}

impl UploadOrchestrator {
    /// Orchestrator with default limits, an in-memory cache and no scanner.
    pub fn new(storage: Arc<dyn Storage>, signer: UrlSigner) -> Self {
        let cache = Arc::new(InMemoryCache::new());
        let defaults = SigningConfig {
            secret: String::new(),
            media_ttl_hours: 24,
            document_ttl_hours: 168,
        };
        Self {
            validator: Arc::new(AssetValidator::default()),
            transformer: Arc::new(AssetTransformer::default()),
            limiter: UploadRateLimiter::new(cache.clone(), Default::default()),
            scanner: None,
            storage,
            signer,
            cache,
            media_ttl: defaults.ttl_for(AssetCategory::Avatar),
            document_ttl: defaults.ttl_for(AssetCategory::KycDocument),
            batch: BatchConfig::default(),
        }
    }

    /// Build the whole pipeline from configuration.
    pub async fn from_config(config: &PipelineConfig) -> Result<Self, anyhow::Error> {
        config.validate()?;

        let storage = create_storage(&config.storage).await?;
        let cache = Arc::new(InMemoryCache::new());
        let limiter = UploadRateLimiter::new(cache.clone(), config.rate_limit);

        let mut orchestrator = Self::new(storage, UrlSigner::new(&config.signing.secret))
            .with_validator(AssetValidator::new(config.limits.clone()))
            .with_transformer(AssetTransformer::new(&config.watermark))
            .with_cache(cache)
            .with_rate_limiter(limiter)
            .with_signing_ttls(&config.signing)
            .with_batch(config.batch);

        if config.scanner.enabled {
            orchestrator = orchestrator.with_scanner(Self::build_scanner(config)?);
        } else {
            tracing::warn!("Antivirus scanning disabled, uploads will not be scanned");
        }

        tracing::info!(
            environment = %config.environment,
            provider = %orchestrator.storage.provider(),
            scanner = orchestrator.scanner.as_ref().map(|s| s.name()).unwrap_or("none"),
            per_hour = config.rate_limit.per_hour,
            per_day = config.rate_limit.per_day,
            "Upload pipeline ready"
        );
        Ok(orchestrator)
    }

    #[cfg(feature = "clamav")]
    fn build_scanner(config: &PipelineConfig) -> Result<Arc<dyn ThreatScanner>, anyhow::Error> {
        Ok(Arc::new(crate::scanner::ClamAvScanner::from_config(
            &config.scanner,
        )))
    }

    #[cfg(not(feature = "clamav"))]
    fn build_scanner(_config: &PipelineConfig) -> Result<Arc<dyn ThreatScanner>, anyhow::Error> {
        anyhow::bail!("AV_ENABLED is set but this build has no ClamAV support (feature `clamav`)")
    }

    pub fn with_validator(mut self, validator: AssetValidator) -> Self {
        self.validator = Arc::new(validator);
        self
    }

    pub fn with_transformer(mut self, transformer: AssetTransformer) -> Self {
        self.transformer = Arc::new(transformer);
        self
    }

    pub fn with_rate_limiter(mut self, limiter: UploadRateLimiter) -> Self {
        self.limiter = limiter;
        self
    }

    pub fn with_scanner(mut self, scanner: Arc<dyn ThreatScanner>) -> Self {
        self.scanner = Some(scanner);
        self
    }

    pub fn with_cache(mut self, cache: Arc<dyn Cache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_signing_ttls(mut self, signing: &SigningConfig) -> Self {
        self.media_ttl = signing.ttl_for(AssetCategory::Avatar);
        self.document_ttl = signing.ttl_for(AssetCategory::KycDocument);
        self
    }

    pub fn with_batch(mut self, batch: BatchConfig) -> Self {
        self.batch = batch;
        self
    }

    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }

    pub fn signer(&self) -> &UrlSigner {
        &self.signer
    }

    /// Signed URL lifetime for a category.
    pub fn ttl_for(&self, category: AssetCategory) -> Duration {
        match category {
            AssetCategory::KycDocument => self.document_ttl,
            _ => self.media_ttl,
        }
    }

    /// Run one upload to completion.
    pub async fn upload(&self, request: UploadRequest) -> Result<UploadResult, UploadError> {
        self.upload_with_cancellation(request, &CancellationToken::new())
            .await
    }

    /// Run one upload, abandoning it when `cancel` fires.
    ///
    /// Cancellation before the store stage leaves storage untouched.
    /// Cancellation during the store stage stops before the next variant
    /// write; variants already written are logged as orphans.
    #[tracing::instrument(
        skip(self, request, cancel),
        fields(category = %request.category, size_bytes = request.data.len())
    )]
    pub async fn upload_with_cancellation(
        &self,
        request: UploadRequest,
        cancel: &CancellationToken,
    ) -> Result<UploadResult, UploadError> {
        let mut tracker = StageTracker::new(Uuid::new_v4());
        match self.run(request, cancel, &mut tracker).await {
            Ok(result) => {
                tracker.advance(UploadStage::Done);
                Ok(result)
            }
            Err(err) => {
                tracker.fail(&err);
                Err(err)
            }
        }
    }

    async fn run(
        &self,
        request: UploadRequest,
        cancel: &CancellationToken,
        tracker: &mut StageTracker,
    ) -> Result<UploadResult, UploadError> {
        let upload_id = tracker.upload_id();
        if !is_valid_segment(&request.owner_id) {
            return Err(UploadError::InvalidRequest(format!(
                "Invalid owner id: {:?}",
                request.owner_id
            )));
        }
        tracing::info!(
            upload_id = %upload_id,
            owner_id = %request.owner_id,
            category = %request.category,
            filename = %request.filename,
            size_bytes = request.data.len(),
            "Upload started"
        );

        let asset = cancellable(cancel, self.validate(&request)).await?;
        tracker.advance(UploadStage::Validated);

        let decision = cancellable(cancel, async {
            self.limiter
                .decide(&request.owner_id)
                .await
                .map_err(UploadError::from)
        })
        .await?;
        decision.into_result()?;
        tracker.advance(UploadStage::RateChecked);

        let scanned = cancellable(cancel, self.scan(&asset, upload_id)).await?;
        tracker.advance(UploadStage::Scanned);

        let processed = cancellable(cancel, self.transform(asset.clone(), request.flags)).await?;
        tracker.advance(UploadStage::Transformed);

        if cancel.is_cancelled() {
            return Err(UploadError::Cancelled);
        }
        let stored = self
            .store(&request, &asset, &processed, upload_id, cancel)
            .await?;
        tracker.advance(UploadStage::Stored);

        let signed_url = match self.signed_url(&stored.primary_path, request.category).await {
            Ok(url) => Some(url),
            Err(e) => {
                tracing::warn!(upload_id = %upload_id, error = %e, "Could not sign upload URL");
                None
            }
        };
        tracker.advance(UploadStage::Signed);

        let result = self.build_result(
            upload_id, &request, &asset, &processed, stored, signed_url, scanned,
        );
        tracing::info!(
            upload_id = %upload_id,
            path = %result.path,
            content_hash = %result.content_hash,
            variants = result.variants.len(),
            "Upload stored"
        );
        Ok(result)
    }

    async fn validate(&self, request: &UploadRequest) -> Result<ValidatedAsset, UploadError> {
        let validator = self.validator.clone();
        let data = request.data.clone();
        let declared = request.declared_content_type.clone();
        let filename = request.filename.clone();
        let category = request.category;
        tokio::task::spawn_blocking(move || {
            validator.validate(data, &declared, &filename, category)
        })
        .await
        .map_err(|e| UploadError::Internal(format!("Validation task failed: {}", e)))?
    }

    /// Returns whether a scanner actually inspected the payload.
    async fn scan(&self, asset: &ValidatedAsset, upload_id: Uuid) -> Result<bool, UploadError> {
        let Some(scanner) = &self.scanner else {
            tracing::debug!(upload_id = %upload_id, "Scan skipped, antivirus disabled");
            return Ok(false);
        };
        match scanner.scan(asset.data.clone()).await {
            ScanResult::Clean => Ok(true),
            ScanResult::Infected(threat) => Err(UploadError::ThreatDetected(threat)),
            ScanResult::Unavailable(reason) => Err(UploadError::ServiceUnavailable(format!(
                "{} unavailable: {}",
                scanner.name(),
                reason
            ))),
        }
    }

    async fn transform(
        &self,
        asset: ValidatedAsset,
        flags: UploadFlags,
    ) -> Result<ProcessedAsset, UploadError> {
        let transformer = self.transformer.clone();
        tokio::task::spawn_blocking(move || transformer.process(&asset, &flags))
            .await
            .map_err(|e| UploadError::Internal(format!("Transform task failed: {}", e)))?
    }

    /// Write every variant, primary first. Any failure fails the upload.
    async fn store(
        &self,
        request: &UploadRequest,
        asset: &ValidatedAsset,
        processed: &ProcessedAsset,
        upload_id: Uuid,
        cancel: &CancellationToken,
    ) -> Result<StoredVariants, UploadError> {
        let primary = processed
            .primary()
            .ok_or_else(|| UploadError::Internal("Transformer produced no primary variant".into()))?;

        let timestamp = Utc::now();
        let prefix = match &request.subject {
            Some(subject) => format!(
                "{}_{}",
                request.category.filename_prefix(),
                sanitize_segment(subject)
            ),
            None => request.category.filename_prefix().to_string(),
        };
        let filename = secure_filename(
            &prefix,
            &request.owner_id,
            &asset.original_filename,
            &asset.content_hash,
            timestamp,
            primary.extension,
        );
        let dir = request.category.storage_dir();

        let mut stored = StoredVariants {
            primary_path: storage_path(dir, &request.owner_id, timestamp, &filename),
            primary_url: String::new(),
            variants: BTreeMap::new(),
        };

        for variant in &processed.variants {
            if cancel.is_cancelled() {
                log_orphans(upload_id, &stored.variants);
                return Err(UploadError::Cancelled);
            }

            let path = if variant.name == VariantName::Original {
                stored.primary_path.clone()
            } else {
                let name = variant_filename(variant.name.as_str(), &filename, variant.extension);
                storage_path(dir, &request.owner_id, timestamp, &name)
            };

            let url = match self
                .storage
                .save(variant.data.clone(), &path, variant.content_type)
                .await
            {
                Ok(url) => url,
                Err(e) => {
                    tracing::error!(
                        upload_id = %upload_id,
                        variant = %variant.name,
                        path = %path,
                        error = %e,
                        "Variant write failed"
                    );
                    log_orphans(upload_id, &stored.variants);
                    return Err(e.into());
                }
            };

            if variant.name == VariantName::Original {
                stored.primary_url = url.clone();
            }
            stored.variants.insert(
                variant.name.as_str().to_string(),
                VariantInfo {
                    url,
                    path,
                    width: variant.dimensions.map(|d| d.width),
                    height: variant.dimensions.map(|d| d.height),
                    bytes: variant.size_bytes(),
                    content_type: variant.content_type.to_string(),
                },
            );
        }

        Ok(stored)
    }

    #[allow(clippy::too_many_arguments)]
    fn build_result(
        &self,
        upload_id: Uuid,
        request: &UploadRequest,
        asset: &ValidatedAsset,
        processed: &ProcessedAsset,
        stored: StoredVariants,
        signed_url: Option<String>,
        scanned: bool,
    ) -> UploadResult {
        let primary = processed.primary();
        let thumbnails = processed
            .names()
            .into_iter()
            .filter(|name| {
                matches!(
                    name,
                    VariantName::Small | VariantName::Medium | VariantName::Large
                )
            })
            .map(|name| name.as_str().to_string())
            .collect();

        UploadResult {
            upload_id,
            url: stored.primary_url,
            signed_url,
            path: stored.primary_path,
            variants: stored.variants,
            content_hash: primary
                .map(|v| ContentHasher::digest(&v.data))
                .unwrap_or_default(),
            source_hash: asset.content_hash.clone(),
            content_type: primary
                .map(|v| v.content_type.to_string())
                .unwrap_or_else(|| asset.sniffed_mime.to_string()),
            dimensions: primary.and_then(|v| v.dimensions),
            original_dimensions: asset.dimensions,
            compression: processed.compression,
            processing: AppliedProcessing {
                exif_stripped: processed.exif_stripped,
                watermarked: processed.watermarked,
                alt_format: processed.get(VariantName::Webp).is_some(),
                scanned,
                is_primary: request.flags.is_primary,
                thumbnails,
            },
            category: request.category,
            provider: self.storage.provider(),
            uploaded_at: Utc::now(),
        }
    }

    /// Signed URL for a stored path, memoised for half its lifetime.
    pub async fn signed_url(
        &self,
        path: &str,
        category: AssetCategory,
    ) -> Result<String, UploadError> {
        let key = signed_url_key(category.ttl_class(), path);
        match self.cache.get(&key).await {
            Ok(Some(url)) => return Ok(url),
            Ok(None) => {}
            Err(e) => tracing::warn!(error = %e, "Signed URL cache read failed"),
        }

        let ttl = self.ttl_for(category);
        let url = self.signer.sign(path, ttl)?.to_string();
        if let Err(e) = self.cache.set(&key, url.clone(), Some(ttl / 2)).await {
            tracing::warn!(error = %e, "Signed URL cache write failed");
        }
        Ok(url)
    }

    /// Check a signed URL and return the path it grants access to.
    pub fn verify_signed_url(&self, url: &str) -> Result<String, UploadError> {
        self.signer.verify_url(url).map_err(UploadError::from)
    }

    /// Delete a stored object by URL or path and drop its cached signed URL.
    pub async fn delete(&self, url_or_path: &str) -> Result<bool, UploadError> {
        let path = self.storage.resolve_path(url_or_path);
        let deleted = self.storage.delete(url_or_path).await?;
        for class in TtlClass::ALL {
            if let Err(e) = self.cache.expire(&signed_url_key(class, &path)).await {
                tracing::warn!(error = %e, path = %path, "Signed URL cache eviction failed");
            }
        }
        tracing::info!(path = %path, deleted, "Stored object deleted");
        Ok(deleted)
    }
}

/// Paths and URLs written by the store stage
struct StoredVariants {
    primary_path: String,
    primary_url: String,
    variants: BTreeMap<String, VariantInfo>,
}

fn signed_url_key(class: TtlClass, path: &str) -> String {
    format!("{}:{}:{}", SIGNED_URL_KEY_PREFIX, class.as_str(), path)
}

fn log_orphans(upload_id: Uuid, written: &BTreeMap<String, VariantInfo>) {
    for (name, info) in written {
        tracing::warn!(
            upload_id = %upload_id,
            variant = %name,
            path = %info.path,
            "Orphaned variant left in storage"
        );
    }
}

/// Race `fut` against the cancellation token.
async fn cancellable<T>(
    cancel: &CancellationToken,
    fut: impl Future<Output = Result<T, UploadError>>,
) -> Result<T, UploadError> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(UploadError::Cancelled),
        result = fut => result,
    }
}
