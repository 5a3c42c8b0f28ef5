//! Test fixtures: generated images, a PDF and a disguised executable.

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use img_parts::{jpeg::Jpeg, ImageEXIF};
use std::io::Cursor;

/// Photo-like RGB image: smooth gradients with a low-frequency ripple.
pub fn gradient_image(width: u32, height: u32) -> DynamicImage {
    let img = RgbImage::from_fn(width, height, |x, y| {
        let fx = x as f32 / width as f32;
        let fy = y as f32 / height as f32;
        let ripple = ((fx * 12.0).sin() * (fy * 9.0).cos() * 40.0) as i32;
        Rgb([
            (fx * 200.0) as u8 + 20,
            (fy * 180.0) as u8 + 30,
            (120 + ripple).clamp(0, 255) as u8,
        ])
    });
    DynamicImage::ImageRgb8(img)
}

pub fn encode(img: &DynamicImage, format: ImageFormat) -> Vec<u8> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), format)
        .expect("encode fixture");
    buf
}

pub fn gradient_jpeg(width: u32, height: u32) -> Vec<u8> {
    encode(&gradient_image(width, height), ImageFormat::Jpeg)
}

pub fn gradient_png(width: u32, height: u32) -> Vec<u8> {
    encode(&gradient_image(width, height), ImageFormat::Png)
}

/// Deterministic per-pixel grain in -amplitude..=amplitude.
fn grain(x: u32, y: u32, amplitude: i32) -> i32 {
    let mut h = (x as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15)
        ^ (y as u64).wrapping_mul(0xC2B2_AE3D_27D4_EB4F);
    h ^= h >> 31;
    h = h.wrapping_mul(0xBF58_476D_1CE4_E5B9);
    h ^= h >> 29;
    (h % (2 * amplitude as u64 + 1)) as i32 - amplitude
}

/// Camera-like image: the gradient scene plus luminance sensor grain.
pub fn noisy_photo(width: u32, height: u32) -> DynamicImage {
    let base = gradient_image(width, height).to_rgb8();
    let img = RgbImage::from_fn(width, height, |x, y| {
        let n = grain(x, y, 28);
        let Rgb(p) = *base.get_pixel(x, y);
        Rgb(p.map(|c| (c as i32 + n).clamp(0, 255) as u8))
    });
    DynamicImage::ImageRgb8(img)
}

/// High-quality JPEG of [`noisy_photo`], sized like a phone camera upload.
pub fn noisy_photo_jpeg(width: u32, height: u32) -> Vec<u8> {
    let mut buf = Vec::new();
    JpegEncoder::new_with_quality(&mut buf, 95)
        .encode_image(&noisy_photo(width, height))
        .expect("encode fixture");
    buf
}

/// Little-endian TIFF with Orientation=6 and a DateTime tag.
pub fn exif_block() -> Vec<u8> {
    let mut tiff = vec![b'I', b'I', 0x2A, 0x00, 0x08, 0x00, 0x00, 0x00, 0x02, 0x00];
    tiff.extend_from_slice(&[0x12, 0x01, 0x03, 0x00, 0x01, 0, 0, 0, 0x06, 0, 0, 0]);
    tiff.extend_from_slice(&[0x32, 0x01, 0x02, 0x00, 0x14, 0, 0, 0, 0x26, 0, 0, 0]);
    tiff.extend_from_slice(&[0, 0, 0, 0]);
    tiff.extend_from_slice(b"2024:01:01 12:00:00\0");
    tiff
}

/// JPEG carrying the EXIF block above.
pub fn jpeg_with_exif(width: u32, height: u32) -> Vec<u8> {
    let mut jpeg = Jpeg::from_bytes(gradient_jpeg(width, height).into()).expect("parse jpeg");
    jpeg.set_exif(Some(exif_block().into()));
    jpeg.encoder().bytes().to_vec()
}

/// Minimal valid PDF.
pub fn test_pdf() -> Vec<u8> {
    b"%PDF-1.4
1 0 obj
<< /Type /Catalog /Pages 2 0 R >>
endobj
2 0 obj
<< /Type /Pages /Kids [3 0 R] /Count 1 >>
endobj
3 0 obj
<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] >>
endobj
trailer
<< /Size 4 /Root 1 0 R >>
%%EOF
"
    .to_vec()
}

/// A DOS/PE header followed by padding, as found in any Windows executable.
pub fn disguised_executable() -> Vec<u8> {
    let mut exe = vec![0u8; 512];
    exe[0] = b'M';
    exe[1] = b'Z';
    exe[0x3C] = 0x80;
    exe[0x80..0x84].copy_from_slice(b"PE\0\0");
    exe
}

/// Lowercase hex SHA-256 shape check.
pub fn is_sha256_hex(value: &str) -> bool {
    value.len() == 64 && value.chars().all(|c| matches!(c, '0'..='9' | 'a'..='f'))
}
