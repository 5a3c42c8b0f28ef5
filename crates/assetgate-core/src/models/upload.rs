use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use super::asset::{CompressionReport, Dimensions};
use super::category::AssetCategory;
use crate::storage_types::StorageProvider;

/// Category-specific switches supplied by the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadFlags {
    /// Overlay the brand watermark (vehicle photos only).
    pub add_watermark: bool,
    /// Also produce a WebP rendition.
    pub convert_alt_format: bool,
    /// Caller marks this as the primary photo of its subject. Echoed back.
    pub is_primary: bool,
}

impl UploadFlags {
    /// Defaults used by the vehicle photo flow: watermark and WebP on.
    pub fn vehicle_defaults() -> Self {
        Self {
            add_watermark: true,
            convert_alt_format: true,
            is_primary: false,
        }
    }
}

/// One inbound upload.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub data: Bytes,
    pub declared_content_type: String,
    pub filename: String,
    pub owner_id: String,
    pub category: AssetCategory,
    pub flags: UploadFlags,
    /// Vehicle id or KYC document type, folded into the filename prefix.
    pub subject: Option<String>,
}

impl UploadRequest {
    pub fn new(
        data: impl Into<Bytes>,
        declared_content_type: impl Into<String>,
        filename: impl Into<String>,
        owner_id: impl Into<String>,
        category: AssetCategory,
    ) -> Self {
        Self {
            data: data.into(),
            declared_content_type: declared_content_type.into(),
            filename: filename.into(),
            owner_id: owner_id.into(),
            category,
            flags: UploadFlags::default(),
            subject: None,
        }
    }

    pub fn with_flags(mut self, flags: UploadFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }
}

/// Location and shape of one stored variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantInfo {
    pub url: String,
    pub path: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub bytes: usize,
    pub content_type: String,
}

/// What the pipeline actually did to an upload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppliedProcessing {
    pub exif_stripped: bool,
    pub watermarked: bool,
    pub alt_format: bool,
    pub scanned: bool,
    pub is_primary: bool,
    pub thumbnails: Vec<String>,
}

/// Caller-facing result contract of a successful upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResult {
    pub upload_id: Uuid,
    pub url: String,
    pub signed_url: Option<String>,
    pub path: String,
    pub variants: BTreeMap<String, VariantInfo>,
    /// SHA-256 of the stored primary variant.
    pub content_hash: String,
    /// SHA-256 of the validated input.
    pub source_hash: String,
    pub content_type: String,
    pub dimensions: Option<Dimensions>,
    pub original_dimensions: Option<Dimensions>,
    pub compression: Option<CompressionReport>,
    pub processing: AppliedProcessing,
    pub category: AssetCategory,
    pub provider: StorageProvider,
    pub uploaded_at: DateTime<Utc>,
}
