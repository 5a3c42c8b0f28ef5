//! Domain models of the upload pipeline

pub mod asset;
pub mod category;
pub mod upload;

pub use asset::{
    CompressionReport, Dimensions, ProcessedAsset, ValidatedAsset, Variant, VariantName,
};
pub use category::{AssetCategory, TtlClass};
pub use upload::{AppliedProcessing, UploadFlags, UploadRequest, UploadResult, VariantInfo};
