//! Asset transformer - turns a validated upload into its stored variants
//!
//! Every image variant derives from one EXIF-stripped pixel buffer:
//! 1. EXIF orientation is applied to the decoded pixels
//! 2. Pixels are copied into a fresh buffer (privacy stage)
//! 3. Watermark (vehicle photos, on request)
//! 4. Compression of the primary variant
//! 5. Alternate format (WebP) and thumbnails
//! 6. Every encoded variant is audited for surviving EXIF

use assetgate_core::{
    AssetCategory, CompressionReport, Dimensions, ProcessedAsset, UploadError, UploadFlags,
    ValidatedAsset, Variant, VariantName, WatermarkSettings,
};
use bytes::Bytes;
use image::{DynamicImage, GenericImageView};

use crate::compression::{ImageCompressor, QualityPreset};
use crate::image::{ImageOrientation, ImageProcessor, ImageResize, TextWatermark};

/// Long edge of a stored vehicle photo
pub const VEHICLE_MAX_EDGE: u32 = 1920;
/// Side of the square avatar
pub const AVATAR_SIZE: u32 = 400;
/// Side of the square `small` thumbnail
pub const SMALL_SIZE: u32 = 150;
/// Bounding box of the `medium` thumbnail
pub const MEDIUM_SIZE: u32 = 400;
/// Bounding box of the `large` thumbnail
pub const LARGE_SIZE: u32 = 800;

/// Encoding of one variant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Encoding {
    Jpeg(QualityPreset),
    Png,
    Webp(QualityPreset),
}

impl Encoding {
    fn content_type(self) -> &'static str {
        match self {
            Encoding::Jpeg(_) => "image/jpeg",
            Encoding::Png => "image/png",
            Encoding::Webp(_) => "image/webp",
        }
    }

    fn extension(self) -> &'static str {
        match self {
            Encoding::Jpeg(_) => "jpg",
            Encoding::Png => "png",
            Encoding::Webp(_) => "webp",
        }
    }
}

/// Category-specific image transformer
#[derive(Debug, Clone)]
pub struct AssetTransformer {
    watermark: TextWatermark,
}

impl Default for AssetTransformer {
    fn default() -> Self {
        Self::new(&WatermarkSettings::default())
    }
}

impl AssetTransformer {
    pub fn new(watermark: &WatermarkSettings) -> Self {
        Self {
            watermark: TextWatermark::from_settings(watermark),
        }
    }

    /// Produce the variants of `asset`. Same input and flags always give
    /// byte-identical variants.
    #[tracing::instrument(skip(self, asset), fields(category = %asset.category, size_bytes = asset.size_bytes()))]
    pub fn process(
        &self,
        asset: &ValidatedAsset,
        flags: &UploadFlags,
    ) -> Result<ProcessedAsset, UploadError> {
        if !asset.is_image() {
            return Ok(Self::pass_through(asset));
        }

        let start = std::time::Instant::now();
        let pixels = Self::prepare(&asset.data)?;

        let processed = match asset.category {
            AssetCategory::VehiclePhoto => self.process_vehicle(asset, pixels, flags)?,
            AssetCategory::Avatar => Self::process_avatar(asset, pixels, flags)?,
            AssetCategory::KycDocument => Self::process_document_image(asset, pixels)?,
        };

        for variant in &processed.variants {
            ImageProcessor::audit_metadata(&variant.data)?;
        }

        tracing::info!(
            variants = ?processed.names(),
            watermarked = processed.watermarked,
            compressed_bytes = processed.primary().map(|v| v.size_bytes()).unwrap_or_default(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Asset transformed"
        );

        Ok(processed)
    }

    /// Decode, orient upright and copy into a fresh buffer.
    fn prepare(data: &[u8]) -> Result<DynamicImage, UploadError> {
        let decoded = ImageProcessor::decode(data)?;
        let upright = ImageOrientation::apply_exif_orientation(decoded, data);
        ImageProcessor::strip_metadata(&upright)
    }

    fn process_vehicle(
        &self,
        asset: &ValidatedAsset,
        pixels: DynamicImage,
        flags: &UploadFlags,
    ) -> Result<ProcessedAsset, UploadError> {
        let pixels = if flags.add_watermark {
            self.watermark.apply(&pixels)
        } else {
            pixels
        };

        let primary = ImageResize::fit_within(&pixels, VEHICLE_MAX_EDGE, VEHICLE_MAX_EDGE);
        let original = encode(
            VariantName::Original,
            &primary,
            Encoding::Jpeg(QualityPreset::High),
        )?;
        let compression = CompressionReport {
            original_bytes: asset.size_bytes(),
            compressed_bytes: original.size_bytes(),
        };

        let mut variants = vec![
            original,
            encode(
                VariantName::Small,
                &ImageResize::center_crop(&primary, SMALL_SIZE, SMALL_SIZE),
                Encoding::Jpeg(QualityPreset::Standard),
            )?,
            encode(
                VariantName::Medium,
                &ImageResize::fit_within(&primary, MEDIUM_SIZE, MEDIUM_SIZE),
                Encoding::Jpeg(QualityPreset::Standard),
            )?,
            encode(
                VariantName::Large,
                &ImageResize::fit_within(&primary, LARGE_SIZE, LARGE_SIZE),
                Encoding::Jpeg(QualityPreset::Standard),
            )?,
        ];

        if flags.convert_alt_format {
            variants.push(encode(
                VariantName::Webp,
                &primary,
                Encoding::Webp(QualityPreset::Standard),
            )?);
        }

        Ok(ProcessedAsset {
            variants,
            compression: Some(compression),
            watermarked: flags.add_watermark,
            exif_stripped: true,
        })
    }

    fn process_avatar(
        asset: &ValidatedAsset,
        pixels: DynamicImage,
        flags: &UploadFlags,
    ) -> Result<ProcessedAsset, UploadError> {
        let square = ImageResize::center_crop(&pixels, AVATAR_SIZE, AVATAR_SIZE);
        let original = encode(
            VariantName::Original,
            &square,
            Encoding::Jpeg(QualityPreset::High),
        )?;
        let compression = CompressionReport {
            original_bytes: asset.size_bytes(),
            compressed_bytes: original.size_bytes(),
        };

        let mut variants = vec![
            original,
            encode(
                VariantName::Small,
                &ImageResize::center_crop(&square, SMALL_SIZE, SMALL_SIZE),
                Encoding::Jpeg(QualityPreset::Standard),
            )?,
        ];

        if flags.convert_alt_format {
            variants.push(encode(
                VariantName::Webp,
                &square,
                Encoding::Webp(QualityPreset::Standard),
            )?);
        }

        Ok(ProcessedAsset {
            variants,
            compression: Some(compression),
            watermarked: false,
            exif_stripped: true,
        })
    }

    /// Identity document scans keep their native size; PNG stays lossless.
    fn process_document_image(
        asset: &ValidatedAsset,
        pixels: DynamicImage,
    ) -> Result<ProcessedAsset, UploadError> {
        let encoding = if asset.sniffed_mime == "image/png" {
            Encoding::Png
        } else {
            Encoding::Jpeg(QualityPreset::Document)
        };

        let original = encode(VariantName::Original, &pixels, encoding)?;
        let compression = CompressionReport {
            original_bytes: asset.size_bytes(),
            compressed_bytes: original.size_bytes(),
        };

        Ok(ProcessedAsset {
            variants: vec![original],
            compression: Some(compression),
            watermarked: false,
            exif_stripped: true,
        })
    }

    fn pass_through(asset: &ValidatedAsset) -> ProcessedAsset {
        ProcessedAsset {
            variants: vec![Variant {
                name: VariantName::Original,
                data: asset.data.clone(),
                content_type: asset.sniffed_mime,
                extension: "pdf",
                dimensions: None,
            }],
            compression: None,
            watermarked: false,
            exif_stripped: false,
        }
    }
}

fn encode(name: VariantName, img: &DynamicImage, encoding: Encoding) -> Result<Variant, UploadError> {
    let data: anyhow::Result<Bytes> = match encoding {
        Encoding::Jpeg(quality) => ImageCompressor::encode_jpeg(img, quality),
        Encoding::Png => ImageCompressor::encode_png(img),
        Encoding::Webp(quality) => ImageCompressor::encode_webp(img, quality),
    };
    let data = data.map_err(|e| {
        UploadError::Processing(format!("Failed to encode {} variant: {}", name, e))
    })?;

    let (width, height) = img.dimensions();
    Ok(Variant {
        name,
        data,
        content_type: encoding.content_type(),
        extension: encoding.extension(),
        dimensions: Some(Dimensions::new(width, height)),
    })
}
