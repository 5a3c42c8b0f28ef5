//! Assetgate Services Layer
//!
//! This crate is the **coordination layer**: it hosts the upload orchestrator
//! and the malware scanner, and re-exports a unified API from infrastructure,
//! processing, and storage so that callers depend on a single facade. Keep
//! pipeline ordering here; keep CPU-bound work in assetgate-processing and
//! I/O backends in assetgate-storage.

pub mod scanner;
pub mod upload;

pub use assetgate_core::{
    AssetCategory, PipelineConfig, UploadError, UploadFlags, UploadRequest, UploadResult,
};
pub use assetgate_infra::{
    init_tracing, Cache, CounterStore, InMemoryCache, RateDecision, UploadRateLimiter, UrlSigner,
};
pub use assetgate_processing::{AssetTransformer, AssetValidator, ContentHasher};
pub use assetgate_storage::{
    create_storage, LocalStorage, ObjectStoreStorage, Storage, StorageError, StorageResult,
};
#[cfg(feature = "clamav")]
pub use scanner::ClamAvScanner;
pub use scanner::{ScanResult, ScannerPolicy, ThreatScanner};
pub use upload::{BatchItemResult, UploadOrchestrator, UploadStage};
