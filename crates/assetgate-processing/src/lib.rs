//! Assetgate Processing Library
//!
//! CPU-bound stages of the upload pipeline: content sniffing, validation,
//! hashing and the image transforms that turn a validated upload into its
//! stored variants. Nothing in this crate performs network or disk I/O.

pub mod compression;
pub mod hash;
pub mod image;
pub mod sniff;
pub mod transformer;
pub mod validator;

pub use compression::{ImageCompressor, QualityPreset};
pub use hash::ContentHasher;
pub use transformer::AssetTransformer;
pub use validator::AssetValidator;
