//! Assetgate Storage Library
//!
//! This crate provides the storage abstraction used by the upload pipeline
//! and its implementations for the local filesystem and for object stores
//! (S3-compatible and Azure Blob).
//!
//! # Storage path format
//!
//! All backends use the same relative path layout:
//!
//! `{category_dir}/{owner_id}/{YYYY}/{MM}/{secure_filename}`
//!
//! Paths must not contain `..` or a leading `/`. Path generation is
//! centralized in the `keys` module so all backends stay consistent.

pub mod factory;
pub mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(any(feature = "storage-s3", feature = "storage-azure"))]
pub mod object;
pub mod traits;

// Re-export commonly used types
pub use assetgate_core::StorageProvider;
pub use factory::create_storage;
pub use keys::{secure_filename, storage_path, variant_filename};
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
#[cfg(any(feature = "storage-s3", feature = "storage-azure"))]
pub use object::ObjectStoreStorage;
pub use traits::{Storage, StorageError, StorageResult};
