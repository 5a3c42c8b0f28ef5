//! AssetGate Core Library
//!
//! This crate provides the domain models, error taxonomy and configuration
//! shared by every stage of the upload pipeline.

pub mod config;
pub mod error;
pub mod models;
pub mod storage_types;

// Re-export commonly used types
pub use config::{
    BatchConfig, PipelineConfig, RateLimitConfig, ScannerConfig, SigningConfig, StorageConfig,
    ValidationLimits, WatermarkSettings,
};
pub use error::{ErrorMetadata, ErrorResponse, LogLevel, UploadError};
pub use models::{
    AppliedProcessing, AssetCategory, CompressionReport, Dimensions, ProcessedAsset,
    TtlClass, UploadFlags, UploadRequest, UploadResult, ValidatedAsset, Variant, VariantInfo,
    VariantName,
};
pub use storage_types::StorageProvider;
