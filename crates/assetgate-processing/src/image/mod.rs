//! Image processing module
//!
//! - Decoding, privacy scrubbing and metadata audit (processor)
//! - EXIF orientation (orientation)
//! - Cropping and bounded resizing (resize)
//! - Text watermarks over a built-in bitmap font (watermark, glyphs)

pub mod glyphs;
pub mod orientation;
pub mod processor;
pub mod resize;
pub mod watermark;

pub use orientation::ImageOrientation;
pub use processor::ImageProcessor;
pub use resize::ImageResize;
pub use watermark::{TextLayout, TextWatermark, WatermarkPosition};
