use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView};

pub struct ImageResize;

impl ImageResize {
    /// Crop the centre of `img` to the target aspect ratio, then scale to
    /// exactly `width` x `height`.
    pub fn center_crop(img: &DynamicImage, width: u32, height: u32) -> DynamicImage {
        let (src_w, src_h) = img.dimensions();
        let (sw, sh, tw, th) = (src_w as u64, src_h as u64, width as u64, height as u64);

        let (crop_w, crop_h) = if sw * th > sh * tw {
            // Source is wider than the target
            (((sh * tw) / th).max(1) as u32, src_h)
        } else {
            (src_w, ((sw * th) / tw).max(1) as u32)
        };

        let x = (src_w - crop_w) / 2;
        let y = (src_h - crop_h) / 2;

        img.crop_imm(x, y, crop_w, crop_h)
            .resize_exact(width, height, FilterType::Lanczos3)
    }

    /// Scale `img` down to fit within `max_width` x `max_height`, keeping the
    /// aspect ratio. Images already inside the box are returned unchanged.
    pub fn fit_within(img: &DynamicImage, max_width: u32, max_height: u32) -> DynamicImage {
        let (w, h) = img.dimensions();
        if w <= max_width && h <= max_height {
            return img.clone();
        }
        img.resize(max_width, max_height, FilterType::Lanczos3)
    }
}
