//! Image processor - decoding, privacy scrubbing and metadata audit

use assetgate_core::UploadError;
use image::{DynamicImage, GenericImageView, ImageReader, RgbImage, RgbaImage};
use img_parts::{jpeg::Jpeg, png::Png, webp::WebP, ImageEXIF};
use std::io::Cursor;

pub struct ImageProcessor;

impl ImageProcessor {
    /// Decode an image of any supported format.
    pub fn decode(data: &[u8]) -> Result<DynamicImage, UploadError> {
        let reader = ImageReader::new(Cursor::new(data))
            .with_guessed_format()
            .map_err(|e| UploadError::CorruptedContent(format!("Unreadable image: {}", e)))?;
        reader
            .decode()
            .map_err(|e| UploadError::CorruptedContent(format!("Failed to decode image: {}", e)))
    }

    /// Width and height from the image header, without decoding pixels.
    pub fn read_dimensions(data: &[u8]) -> Result<(u32, u32), UploadError> {
        ImageReader::new(Cursor::new(data))
            .with_guessed_format()
            .map_err(|e| UploadError::CorruptedContent(format!("Unreadable image: {}", e)))?
            .into_dimensions()
            .map_err(|e| UploadError::CorruptedContent(format!("Unreadable image header: {}", e)))
    }

    /// Copy the pixels into a freshly allocated buffer.
    ///
    /// Nothing of the source container (EXIF, XMP, ICC, comments) can survive:
    /// only the pixel samples are carried over. Images with an alpha channel
    /// become RGBA8, everything else RGB8.
    pub fn strip_metadata(img: &DynamicImage) -> Result<DynamicImage, UploadError> {
        let (width, height) = img.dimensions();

        let stripped = if img.color().has_alpha() {
            RgbaImage::from_raw(width, height, img.to_rgba8().into_raw())
                .map(DynamicImage::ImageRgba8)
        } else {
            RgbImage::from_raw(width, height, img.to_rgb8().into_raw())
                .map(DynamicImage::ImageRgb8)
        };

        stripped.ok_or_else(|| {
            UploadError::Internal(format!(
                "Pixel buffer does not match {}x{} image",
                width, height
            ))
        })
    }

    /// Whether an encoded JPEG, PNG or WebP still carries an EXIF segment.
    pub fn has_exif(data: &[u8]) -> bool {
        if let Ok(jpeg) = Jpeg::from_bytes(data.to_vec().into()) {
            return jpeg.exif().is_some();
        }
        if let Ok(png) = Png::from_bytes(data.to_vec().into()) {
            return png.exif().is_some();
        }
        if let Ok(webp) = WebP::from_bytes(data.to_vec().into()) {
            return webp.exif().is_some();
        }
        false
    }

    /// Names of privacy-sensitive EXIF tags (location, timestamps, device
    /// identity) present in `data`.
    pub fn sensitive_exif_tags(data: &[u8]) -> Vec<String> {
        let mut cursor = Cursor::new(data);
        let Ok(exif) = exif::Reader::new().read_from_container(&mut cursor) else {
            return Vec::new();
        };

        exif.fields()
            .filter(|field| {
                field.tag.context() == exif::Context::Gps
                    || matches!(
                        field.tag,
                        exif::Tag::DateTime
                            | exif::Tag::DateTimeOriginal
                            | exif::Tag::DateTimeDigitized
                            | exif::Tag::Make
                            | exif::Tag::Model
                            | exif::Tag::BodySerialNumber
                            | exif::Tag::CameraOwnerName
                    )
            })
            .map(|field| field.tag.to_string())
            .collect()
    }

    /// Fail if an encoded variant still carries EXIF.
    pub fn audit_metadata(data: &[u8]) -> Result<(), UploadError> {
        if Self::has_exif(data) {
            let tags = Self::sensitive_exif_tags(data);
            tracing::error!(tags = ?tags, "EXIF metadata survived the privacy stage");
            return Err(UploadError::Internal(
                "Encoded variant still carries EXIF metadata".to_string(),
            ));
        }
        Ok(())
    }

    /// Read EXIF orientation tag from image data.
    ///
    /// Returns orientation value (1-8) or 1 (normal) if absent or invalid.
    pub fn read_exif_orientation(data: &[u8]) -> u8 {
        let mut cursor = Cursor::new(data);
        let Ok(exif) = exif::Reader::new().read_from_container(&mut cursor) else {
            return 1;
        };

        exif.get_field(exif::Tag::Orientation, exif::In::PRIMARY)
            .and_then(|field| field.value.get_uint(0))
            .filter(|value| (1..=8).contains(value))
            .map(|value| value as u8)
            .unwrap_or(1)
    }

    /// Get rotation and flip operations needed for a given EXIF orientation
    /// Returns (rotate_angle, flip_horizontal, flip_vertical), applied in that order
    pub fn get_orientation_transforms(orientation: u8) -> (Option<u16>, bool, bool) {
        match orientation {
            1 => (None, false, false),      // Normal
            2 => (None, true, false),       // Mirror horizontal
            3 => (Some(180), false, false), // Rotate 180
            4 => (None, false, true),       // Mirror vertical
            5 => (Some(90), true, false),   // Transpose
            6 => (Some(90), false, false),  // Rotate 90 CW
            7 => (Some(270), true, false),  // Transverse
            8 => (Some(270), false, false), // Rotate 270 CW
            _ => (None, false, false),      // Invalid, treat as normal
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgb, Rgba};

    fn jpeg_bytes() -> Vec<u8> {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(32, 16, Rgb([10, 20, 30])));
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Jpeg)
            .unwrap();
        buf
    }

    /// Little-endian TIFF with Orientation=6 and a DateTime tag.
    fn tiff_with_orientation() -> Vec<u8> {
        let mut tiff = vec![b'I', b'I', 0x2A, 0x00, 0x08, 0x00, 0x00, 0x00, 0x02, 0x00];
        tiff.extend_from_slice(&[0x12, 0x01, 0x03, 0x00, 0x01, 0, 0, 0, 0x06, 0, 0, 0]);
        tiff.extend_from_slice(&[0x32, 0x01, 0x02, 0x00, 0x14, 0, 0, 0, 0x26, 0, 0, 0]);
        tiff.extend_from_slice(&[0, 0, 0, 0]);
        tiff.extend_from_slice(b"2024:01:01 12:00:00\0");
        tiff
    }

    fn jpeg_with_exif() -> Vec<u8> {
        let mut jpeg = Jpeg::from_bytes(jpeg_bytes().into()).unwrap();
        jpeg.set_exif(Some(tiff_with_orientation().into()));
        jpeg.encoder().bytes().to_vec()
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(ImageProcessor::decode(b"not an image").is_err());
        assert!(ImageProcessor::decode(&jpeg_bytes()).is_ok());
    }

    #[test]
    fn test_strip_keeps_pixels_and_channel_layout() {
        let rgba = DynamicImage::ImageRgba8(RgbaImage::from_pixel(4, 3, Rgba([1, 2, 3, 4])));
        let stripped = ImageProcessor::strip_metadata(&rgba).unwrap();
        assert!(matches!(stripped, DynamicImage::ImageRgba8(_)));
        assert_eq!(stripped.to_rgba8().get_pixel(2, 1), &Rgba([1, 2, 3, 4]));

        let rgb = DynamicImage::ImageRgb8(RgbImage::from_pixel(4, 3, Rgb([9, 8, 7])));
        let stripped = ImageProcessor::strip_metadata(&rgb).unwrap();
        assert!(matches!(stripped, DynamicImage::ImageRgb8(_)));
        assert_eq!(stripped.dimensions(), (4, 3));
    }

    #[test]
    fn test_exif_detection_and_audit() {
        let tagged = jpeg_with_exif();
        assert!(ImageProcessor::has_exif(&tagged));
        assert!(ImageProcessor::sensitive_exif_tags(&tagged).contains(&"DateTime".to_string()));
        assert!(ImageProcessor::audit_metadata(&tagged).is_err());

        let clean = jpeg_bytes();
        assert!(!ImageProcessor::has_exif(&clean));
        assert!(ImageProcessor::audit_metadata(&clean).is_ok());
    }

    #[test]
    fn test_read_exif_orientation() {
        assert_eq!(ImageProcessor::read_exif_orientation(&jpeg_with_exif()), 6);
        assert_eq!(ImageProcessor::read_exif_orientation(&jpeg_bytes()), 1);
        assert_eq!(ImageProcessor::read_exif_orientation(b""), 1);
    }

    #[test]
    fn test_get_orientation_transforms_all_values() {
        assert_eq!(ImageProcessor::get_orientation_transforms(1), (None, false, false));
        assert_eq!(ImageProcessor::get_orientation_transforms(3), (Some(180), false, false));
        assert_eq!(ImageProcessor::get_orientation_transforms(5), (Some(90), true, false));
        assert_eq!(ImageProcessor::get_orientation_transforms(6), (Some(90), false, false));
        assert_eq!(ImageProcessor::get_orientation_transforms(7), (Some(270), true, false));
        assert_eq!(ImageProcessor::get_orientation_transforms(9), (None, false, false));
    }
}
