use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const IMAGE_TYPES: &[&str] = &["image/jpeg", "image/png", "image/webp", "image/gif"];
const DOCUMENT_TYPES: &[&str] = &["application/pdf", "image/jpeg", "image/png"];

/// Kind of asset being uploaded. Drives limits, allow-lists, transforms and
/// the storage directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetCategory {
    Avatar,
    VehiclePhoto,
    KycDocument,
}

/// Which signed URL lifetime applies to a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TtlClass {
    Media,
    Document,
}

impl TtlClass {
    pub const ALL: [TtlClass; 2] = [TtlClass::Media, TtlClass::Document];

    pub fn as_str(&self) -> &'static str {
        match self {
            TtlClass::Media => "media",
            TtlClass::Document => "document",
        }
    }
}

impl AssetCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssetCategory::Avatar => "avatar",
            AssetCategory::VehiclePhoto => "vehicle_photo",
            AssetCategory::KycDocument => "kyc_document",
        }
    }

    /// Top-level storage directory.
    pub fn storage_dir(&self) -> &'static str {
        match self {
            AssetCategory::Avatar => "avatars",
            AssetCategory::VehiclePhoto => "vehicles",
            AssetCategory::KycDocument => "documents",
        }
    }

    /// Base prefix of generated filenames.
    pub fn filename_prefix(&self) -> &'static str {
        match self {
            AssetCategory::Avatar => "avatar",
            AssetCategory::VehiclePhoto => "vehicle",
            AssetCategory::KycDocument => "doc",
        }
    }

    /// Sniffed MIME types accepted for this category.
    pub fn allowed_mime_types(&self) -> &'static [&'static str] {
        match self {
            AssetCategory::Avatar | AssetCategory::VehiclePhoto => IMAGE_TYPES,
            AssetCategory::KycDocument => DOCUMENT_TYPES,
        }
    }

    pub fn allows(&self, mime: &str) -> bool {
        self.allowed_mime_types().contains(&mime)
    }

    /// Filename extensions (lowercase, no dot) accepted for content sniffed
    /// as `mime`. Empty when the category refuses `mime`.
    pub fn allowed_extensions(&self, mime: &str) -> &'static [&'static str] {
        if !self.allows(mime) {
            return &[];
        }
        match mime {
            "image/jpeg" => &["jpg", "jpeg"],
            "image/png" => &["png"],
            "image/webp" => &["webp"],
            "image/gif" => &["gif"],
            "application/pdf" => &["pdf"],
            _ => &[],
        }
    }

    /// Whether a file named with extension `ext` may hold `mime` content.
    /// A missing extension never matches.
    pub fn allows_extension(&self, mime: &str, ext: Option<&str>) -> bool {
        ext.is_some_and(|ext| {
            self.allowed_extensions(mime)
                .iter()
                .any(|allowed| allowed.eq_ignore_ascii_case(ext))
        })
    }

    /// Image categories get dimension bounds, thumbnails and compression.
    pub fn is_image_category(&self) -> bool {
        matches!(self, AssetCategory::Avatar | AssetCategory::VehiclePhoto)
    }

    pub fn ttl_class(&self) -> TtlClass {
        match self {
            AssetCategory::KycDocument => TtlClass::Document,
            _ => TtlClass::Media,
        }
    }
}

impl fmt::Display for AssetCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AssetCategory {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "avatar" => Ok(AssetCategory::Avatar),
            "vehicle_photo" | "vehicle" => Ok(AssetCategory::VehiclePhoto),
            "kyc_document" | "document" | "kyc" => Ok(AssetCategory::KycDocument),
            _ => Err(anyhow::anyhow!("Invalid asset category: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allow_lists() {
        assert!(AssetCategory::VehiclePhoto.allows("image/webp"));
        assert!(AssetCategory::Avatar.allows("image/gif"));
        assert!(!AssetCategory::Avatar.allows("application/pdf"));
        assert!(AssetCategory::KycDocument.allows("application/pdf"));
        assert!(!AssetCategory::KycDocument.allows("image/gif"));
    }

    #[test]
    fn test_extension_table() {
        let vehicle = AssetCategory::VehiclePhoto;
        assert!(vehicle.allows_extension("image/jpeg", Some("jpeg")));
        assert!(vehicle.allows_extension("image/jpeg", Some("JPG")));
        assert!(!vehicle.allows_extension("image/jpeg", Some("png")));
        assert!(!vehicle.allows_extension("image/jpeg", None));
        assert!(AssetCategory::KycDocument.allows_extension("application/pdf", Some("pdf")));
        assert!(AssetCategory::KycDocument.allowed_extensions("image/gif").is_empty());
    }

    #[test]
    fn test_parse_and_serde_names() {
        assert_eq!(
            "vehicle-photo".parse::<AssetCategory>().unwrap(),
            AssetCategory::VehiclePhoto
        );
        assert_eq!(
            serde_json::to_string(&AssetCategory::KycDocument).unwrap(),
            "\"kyc_document\""
        );
        assert!("video".parse::<AssetCategory>().is_err());
    }

    #[test]
    fn test_documents_use_document_ttl() {
        assert_eq!(AssetCategory::KycDocument.ttl_class(), TtlClass::Document);
        assert_eq!(AssetCategory::Avatar.ttl_class(), TtlClass::Media);
    }
}
