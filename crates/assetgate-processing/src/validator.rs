use assetgate_core::{AssetCategory, Dimensions, UploadError, ValidatedAsset, ValidationLimits};
use bytes::Bytes;
use image::GenericImageView;

use crate::hash::ContentHasher;
use crate::image::ImageProcessor;
use crate::sniff;

/// Extensions refused whatever their content claims to be.
const BLOCKED_EXTENSIONS: &[&str] = &[
    "exe", "bat", "cmd", "sh", "ps1", "vbs", "dll", "so", "dylib", "app", "deb", "rpm", "jar",
    "apk", "ipa", "msi", "dmg",
];

/// PDF trailers must appear within this many bytes of the end.
const PDF_TRAILER_WINDOW: usize = 1024;

/// Upload validator
///
/// Runs the checks in a fixed order and stops at the first failure:
/// extension blocklist, size, sniffed type against declared type, category
/// allow-list, filename extension against sniffed type, header pixel bounds,
/// structural decode, then hashing. Bounds are checked on the header so
/// oversized images are refused before any pixel is allocated. Pure; performs
/// no I/O.
#[derive(Debug, Clone, Default)]
pub struct AssetValidator {
    limits: ValidationLimits,
}

impl AssetValidator {
    pub fn new(limits: ValidationLimits) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> &ValidationLimits {
        &self.limits
    }

    pub fn validate(
        &self,
        data: Bytes,
        declared_content_type: &str,
        filename: &str,
        category: AssetCategory,
    ) -> Result<ValidatedAsset, UploadError> {
        Self::validate_extension(filename)?;
        self.validate_size(data.len(), category)?;

        let sniffed = sniff::sniff(&data);
        if !sniff::compatible(declared_content_type, sniffed) {
            return Err(UploadError::TypeMismatch {
                declared: sniff::normalize(declared_content_type),
                sniffed: sniffed.to_string(),
            });
        }

        if !category.allows(sniffed) {
            return Err(UploadError::UnsupportedType(format!(
                "{} is not accepted for {}",
                sniffed, category
            )));
        }

        let ext = sniff::extension(filename);
        if !category.allows_extension(sniffed, ext.as_deref()) {
            return Err(UploadError::UnsupportedType(format!(
                "Extension {} does not match {} content",
                ext.map_or_else(|| "(none)".to_string(), |e| format!(".{}", e)),
                sniffed
            )));
        }

        let dimensions = if sniffed == "application/pdf" {
            Self::validate_pdf(&data)?;
            None
        } else {
            let (width, height) = ImageProcessor::read_dimensions(&data)?;
            let header_dims = Dimensions::new(width, height);
            if category.is_image_category() {
                self.validate_dimensions(header_dims)?;
            }
            Some(Self::decode_dimensions(&data)?)
        };

        let content_hash = ContentHasher::digest(&data);

        tracing::debug!(
            category = %category,
            mime = sniffed,
            size_bytes = data.len(),
            hash = %content_hash,
            "Upload validated"
        );

        Ok(ValidatedAsset {
            data,
            sniffed_mime: sniffed,
            dimensions,
            content_hash,
            category,
            original_filename: filename.to_string(),
        })
    }

    /// Refuse executable and script extensions, case-insensitively, on the
    /// last extension of the name.
    pub fn validate_extension(filename: &str) -> Result<(), UploadError> {
        if let Some(ext) = sniff::extension(filename) {
            if BLOCKED_EXTENSIONS.contains(&ext.as_str()) {
                return Err(UploadError::UnsupportedType(format!(
                    "Files with extension .{} are not allowed",
                    ext
                )));
            }
        }
        Ok(())
    }

    pub fn validate_size(&self, size: usize, category: AssetCategory) -> Result<(), UploadError> {
        if size == 0 {
            return Err(UploadError::EmptyFile);
        }

        let max = self.limits.max_bytes(category);
        if size > max {
            return Err(UploadError::FileTooLarge { size, max });
        }

        Ok(())
    }

    pub fn validate_dimensions(&self, dims: Dimensions) -> Result<(), UploadError> {
        let min = self.limits.min_dimension;
        let max = self.limits.max_dimension;

        for (side, value) in [("width", dims.width), ("height", dims.height)] {
            if value < min || value > max {
                return Err(UploadError::DimensionOutOfRange(format!(
                    "Image {} {}px is outside {}..={}px",
                    side, value, min, max
                )));
            }
        }

        let long = dims.width.max(dims.height) as u64;
        let short = dims.width.min(dims.height) as u64;
        if long > short * self.limits.max_aspect_ratio as u64 {
            return Err(UploadError::DimensionOutOfRange(format!(
                "Aspect ratio {}x{} exceeds {}:1",
                dims.width, dims.height, self.limits.max_aspect_ratio
            )));
        }

        Ok(())
    }

    /// Fully decode the image; a decode failure means the content is not
    /// what it claims to be.
    fn decode_dimensions(data: &[u8]) -> Result<Dimensions, UploadError> {
        let img = ImageProcessor::decode(data)?;
        let (width, height) = img.dimensions();
        Ok(Dimensions::new(width, height))
    }

    fn validate_pdf(data: &[u8]) -> Result<(), UploadError> {
        if !data.starts_with(b"%PDF-") {
            return Err(UploadError::CorruptedContent(
                "PDF header is missing".to_string(),
            ));
        }

        let tail_start = data.len().saturating_sub(PDF_TRAILER_WINDOW);
        let tail = &data[tail_start..];
        if !tail.windows(5).any(|w| w == b"%%EOF") {
            return Err(UploadError::CorruptedContent(
                "PDF trailer is missing".to_string(),
            ));
        }

        Ok(())
    }
}
