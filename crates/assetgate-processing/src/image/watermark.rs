use assetgate_core::WatermarkSettings;
use image::{imageops, DynamicImage, GenericImageView, Rgba, RgbaImage};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;
use std::str::FromStr;

use super::glyphs::{self, GLYPH_ADVANCE, GLYPH_HEIGHT, GLYPH_WIDTH};

/// Distance between the text box and the image edge
const MARGIN: i64 = 20;
/// Shadow offset in pixels, both axes
const SHADOW_OFFSET: u32 = 2;
const MIN_FONT_SIZE: u32 = 20;

/// Watermark position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WatermarkPosition {
    TopLeft,
    TopRight,
    BottomLeft,
    #[default]
    BottomRight,
    Center,
}

impl FromStr for WatermarkPosition {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "top-left" => Ok(WatermarkPosition::TopLeft),
            "top-right" => Ok(WatermarkPosition::TopRight),
            "bottom-left" => Ok(WatermarkPosition::BottomLeft),
            "bottom-right" => Ok(WatermarkPosition::BottomRight),
            "center" | "centre" => Ok(WatermarkPosition::Center),
            _ => Err(anyhow::anyhow!("Invalid watermark position: {}", s)),
        }
    }
}

/// Where and how large the text lands on a given image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextLayout {
    pub x: i64,
    pub y: i64,
    /// Pixels per font unit
    pub scale: u32,
    pub width: u32,
    pub height: u32,
}

/// Brand text watermark
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextWatermark {
    pub text: String,
    pub position: WatermarkPosition,
    /// Fill alpha; the shadow uses half of it
    pub opacity: u8,
}

impl TextWatermark {
    pub fn from_settings(settings: &WatermarkSettings) -> Self {
        let position = settings.position.parse().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Falling back to bottom-right watermark position");
            WatermarkPosition::BottomRight
        });

        Self {
            text: settings.text.clone(),
            position,
            opacity: settings.opacity,
        }
    }

    /// Glyph height for an image of the given width
    pub fn font_size(image_width: u32) -> u32 {
        MIN_FONT_SIZE.max(image_width / 30)
    }

    pub fn layout(&self, image_width: u32, image_height: u32) -> TextLayout {
        let scale = Self::font_size(image_width).div_ceil(GLYPH_HEIGHT);
        let chars = self.text.chars().count() as u32;
        let width = (chars * GLYPH_ADVANCE * scale).saturating_sub(scale);
        let height = GLYPH_HEIGHT * scale;

        let (w, h) = (image_width as i64, image_height as i64);
        let (tw, th) = (width as i64, height as i64);

        let (x, y) = match self.position {
            WatermarkPosition::TopLeft => (MARGIN, MARGIN),
            WatermarkPosition::TopRight => (w - MARGIN - tw, MARGIN),
            WatermarkPosition::BottomLeft => (MARGIN, h - MARGIN - th),
            WatermarkPosition::BottomRight => (w - MARGIN - tw, h - MARGIN - th),
            WatermarkPosition::Center => ((w - tw) / 2, (h - th) / 2),
        };

        TextLayout {
            x: x.max(0),
            y: y.max(0),
            scale,
            width,
            height,
        }
    }

    /// Draw the text over `img`. The color layout of the input is kept.
    pub fn apply(&self, img: &DynamicImage) -> DynamicImage {
        if self.text.trim().is_empty() || self.opacity == 0 {
            return img.clone();
        }

        let (img_width, img_height) = img.dimensions();
        let layout = self.layout(img_width, img_height);

        let mut layer = RgbaImage::new(layout.width + SHADOW_OFFSET, layout.height + SHADOW_OFFSET);
        let shadow = Rgba([0, 0, 0, self.opacity / 2]);
        let fill = Rgba([255, 255, 255, self.opacity]);
        self.draw_text(&mut layer, SHADOW_OFFSET, layout.scale, shadow);
        self.draw_text(&mut layer, 0, layout.scale, fill);

        let mut base = img.to_rgba8();
        imageops::overlay(&mut base, &layer, layout.x, layout.y);

        tracing::debug!(
            text = %self.text,
            position = ?self.position,
            x = layout.x,
            y = layout.y,
            scale = layout.scale,
            "Watermark applied"
        );

        let blended = DynamicImage::ImageRgba8(base);
        if img.color().has_alpha() {
            blended
        } else {
            DynamicImage::ImageRgb8(blended.to_rgb8())
        }
    }

    fn draw_text(&self, layer: &mut RgbaImage, offset: u32, scale: u32, color: Rgba<u8>) {
        for (index, c) in self.text.chars().enumerate() {
            let rows = glyphs::glyph(c);
            let origin_x = offset + index as u32 * GLYPH_ADVANCE * scale;
            for row in 0..GLYPH_HEIGHT {
                for col in 0..GLYPH_WIDTH {
                    if glyphs::is_set(&rows, col, row) {
                        let rect = Rect::at(
                            (origin_x + col * scale) as i32,
                            (offset + row * scale) as i32,
                        )
                        .of_size(scale, scale);
                        draw_filled_rect_mut(layer, rect, color);
                    }
                }
            }
        }
    }
}
