use super::processor::ImageProcessor;
use image::DynamicImage;

/// Image orientation operations (rotation and flipping)
pub struct ImageOrientation;

impl ImageOrientation {
    /// Apply the EXIF orientation of `data` to the decoded pixels, so the
    /// image stays upright once its metadata is discarded.
    pub fn apply_exif_orientation(mut img: DynamicImage, data: &[u8]) -> DynamicImage {
        let orientation = ImageProcessor::read_exif_orientation(data);
        if orientation == 1 {
            return img;
        }
        let (rotate, flip_h, flip_v) = ImageProcessor::get_orientation_transforms(orientation);

        tracing::debug!(
            orientation = orientation,
            rotate = ?rotate,
            flip_horizontal = flip_h,
            flip_vertical = flip_v,
            "Applying EXIF orientation"
        );

        // Apply rotation first
        if let Some(angle) = rotate {
            img = Self::rotate_by_angle(img, angle);
        }

        // Then apply flips
        if flip_h {
            img = img.fliph();
        }
        if flip_v {
            img = img.flipv();
        }

        img
    }

    /// Rotate image by specified angle (90, 180, or 270 degrees clockwise)
    pub fn rotate_by_angle(img: DynamicImage, angle: u16) -> DynamicImage {
        match angle {
            90 => img.rotate90(),
            180 => img.rotate180(),
            270 => img.rotate270(),
            _ => img,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GenericImageView, Rgb, RgbImage};

    #[test]
    fn test_rotation_dimension_changes() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(4, 2, Rgb([0, 0, 255])));

        assert_eq!(ImageOrientation::rotate_by_angle(img.clone(), 90).dimensions(), (2, 4));
        assert_eq!(ImageOrientation::rotate_by_angle(img.clone(), 180).dimensions(), (4, 2));
        assert_eq!(ImageOrientation::rotate_by_angle(img.clone(), 270).dimensions(), (2, 4));
        assert_eq!(ImageOrientation::rotate_by_angle(img, 45).dimensions(), (4, 2));
    }

    #[test]
    fn test_rotation_keeps_color_type() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(4, 2, Rgb([0, 0, 255])));
        assert!(matches!(
            ImageOrientation::rotate_by_angle(img, 90),
            DynamicImage::ImageRgb8(_)
        ));
    }

    #[test]
    fn test_no_exif_is_untouched() {
        let mut img = RgbImage::new(3, 2);
        img.put_pixel(0, 0, Rgb([255, 0, 0]));
        let img = DynamicImage::ImageRgb8(img);
        let oriented = ImageOrientation::apply_exif_orientation(img.clone(), b"");
        assert_eq!(oriented, img);
    }
}
