//! In-memory assets flowing between the validation and transform stages.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::category::AssetCategory;

/// Pixel dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn long_edge(&self) -> u32 {
        self.width.max(self.height)
    }
}

/// Output of the validator: content whose type, structure and bounds have
/// been checked.
#[derive(Debug, Clone)]
pub struct ValidatedAsset {
    pub data: Bytes,
    pub sniffed_mime: &'static str,
    /// Present for image content, including KYC scans.
    pub dimensions: Option<Dimensions>,
    /// SHA-256 of `data`, lowercase hex.
    pub content_hash: String,
    pub category: AssetCategory,
    pub original_filename: String,
}

impl ValidatedAsset {
    pub fn is_image(&self) -> bool {
        self.sniffed_mime.starts_with("image/")
    }

    pub fn size_bytes(&self) -> usize {
        self.data.len()
    }
}

/// Name of a derived rendition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariantName {
    Original,
    Small,
    Medium,
    Large,
    Webp,
}

impl VariantName {
    pub fn as_str(&self) -> &'static str {
        match self {
            VariantName::Original => "original",
            VariantName::Small => "small",
            VariantName::Medium => "medium",
            VariantName::Large => "large",
            VariantName::Webp => "webp",
        }
    }
}

impl fmt::Display for VariantName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One encoded rendition of an upload.
#[derive(Debug, Clone)]
pub struct Variant {
    pub name: VariantName,
    pub data: Bytes,
    pub content_type: &'static str,
    /// File extension without the dot.
    pub extension: &'static str,
    pub dimensions: Option<Dimensions>,
}

impl Variant {
    pub fn size_bytes(&self) -> usize {
        self.data.len()
    }
}

/// Before/after byte counts of the compression stage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CompressionReport {
    pub original_bytes: usize,
    pub compressed_bytes: usize,
}

impl CompressionReport {
    /// Size reduction in percent; negative when the output grew.
    pub fn reduction_percent(&self) -> f64 {
        if self.original_bytes == 0 {
            return 0.0;
        }
        (self.original_bytes as f64 - self.compressed_bytes as f64) / self.original_bytes as f64
            * 100.0
    }
}

/// Output of the transformer. The first variant is always `Original`.
#[derive(Debug, Clone)]
pub struct ProcessedAsset {
    pub variants: Vec<Variant>,
    pub compression: Option<CompressionReport>,
    pub watermarked: bool,
    pub exif_stripped: bool,
}

impl ProcessedAsset {
    pub fn primary(&self) -> Option<&Variant> {
        self.get(VariantName::Original)
    }

    pub fn get(&self, name: VariantName) -> Option<&Variant> {
        self.variants.iter().find(|v| v.name == name)
    }

    pub fn names(&self) -> Vec<VariantName> {
        self.variants.iter().map(|v| v.name).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reduction_percent() {
        let report = CompressionReport {
            original_bytes: 4_000,
            compressed_bytes: 1_000,
        };
        assert!((report.reduction_percent() - 75.0).abs() < f64::EPSILON);

        let empty = CompressionReport {
            original_bytes: 0,
            compressed_bytes: 10,
        };
        assert_eq!(empty.reduction_percent(), 0.0);
    }

    #[test]
    fn test_processed_asset_lookup() {
        let variant = |name| Variant {
            name,
            data: Bytes::from_static(b"x"),
            content_type: "image/jpeg",
            extension: "jpg",
            dimensions: Some(Dimensions::new(1, 1)),
        };
        let asset = ProcessedAsset {
            variants: vec![variant(VariantName::Original), variant(VariantName::Small)],
            compression: None,
            watermarked: false,
            exif_stripped: true,
        };
        assert_eq!(asset.primary().map(|v| v.name), Some(VariantName::Original));
        assert!(asset.get(VariantName::Webp).is_none());
        assert_eq!(asset.names(), vec![VariantName::Original, VariantName::Small]);
    }
}
