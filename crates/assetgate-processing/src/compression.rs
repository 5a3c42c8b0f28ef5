use anyhow::Result;
use bytes::Bytes;
use image::{DynamicImage, GenericImageView, ImageFormat, Rgb, RgbImage};
use std::io::Cursor;

/// Quality presets for the encoded variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QualityPreset {
    /// Primary photos and avatars
    #[default]
    High,
    /// Thumbnails and alternate formats
    Standard,
    /// Identity document scans
    Document,
}

impl QualityPreset {
    /// Get quality value for JPEG (0-100)
    pub fn jpeg_quality(self) -> u8 {
        match self {
            QualityPreset::High => 90,
            QualityPreset::Standard => 85,
            QualityPreset::Document => 95,
        }
    }

    /// Get quality value for WebP (0-100)
    pub fn webp_quality(self) -> f32 {
        match self {
            QualityPreset::High => 90.0,
            QualityPreset::Standard => 85.0,
            QualityPreset::Document => 95.0,
        }
    }
}

/// Encoders for the stored variants. Output depends only on the pixels and
/// the preset.
pub struct ImageCompressor;

impl ImageCompressor {
    /// Compress to JPEG using mozjpeg
    pub fn encode_jpeg(img: &DynamicImage, quality: QualityPreset) -> Result<Bytes> {
        let rgb_img = Self::flatten_alpha(img);
        let (width, height) = rgb_img.dimensions();

        let mut comp = mozjpeg::Compress::new(mozjpeg::ColorSpace::JCS_RGB);
        comp.set_size(width as usize, height as usize);
        comp.set_quality(quality.jpeg_quality() as f32);
        comp.set_progressive_mode();
        comp.set_optimize_coding(true);

        let mut comp = comp.start_compress(Vec::new())?;
        comp.write_scanlines(&rgb_img)?;
        let jpeg_data = comp.finish()?;

        Ok(Bytes::from(jpeg_data))
    }

    /// Compress to PNG
    pub fn encode_png(img: &DynamicImage) -> Result<Bytes> {
        let mut buffer = Vec::new();
        let mut cursor = Cursor::new(&mut buffer);

        img.write_to(&mut cursor, ImageFormat::Png)?;

        Ok(Bytes::from(buffer))
    }

    /// Compress to lossy WebP, alpha flattened onto white
    pub fn encode_webp(img: &DynamicImage, quality: QualityPreset) -> Result<Bytes> {
        let rgb_img = Self::flatten_alpha(img);
        let (width, height) = rgb_img.dimensions();

        let encoder = webp::Encoder::from_rgb(&rgb_img, width, height);
        let webp_data = encoder.encode(quality.webp_quality());

        Ok(Bytes::copy_from_slice(&webp_data))
    }

    /// Composite any alpha channel over a white background.
    pub fn flatten_alpha(img: &DynamicImage) -> RgbImage {
        if !img.color().has_alpha() {
            return img.to_rgb8();
        }

        let (width, height) = img.dimensions();
        let rgba = img.to_rgba8();
        RgbImage::from_fn(width, height, |x, y| {
            let px = rgba.get_pixel(x, y);
            let alpha = px[3] as u32;
            let blend = |c: u8| ((c as u32 * alpha + 255 * (255 - alpha) + 127) / 255) as u8;
            Rgb([blend(px[0]), blend(px[1]), blend(px[2])])
        })
    }
}
