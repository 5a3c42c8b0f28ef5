//! Assetgate Infrastructure Library
//!
//! Shared infrastructure used by the upload pipeline:
//! - Cache and counter store abstractions with an in-memory implementation
//! - Per-user upload rate limiting
//! - Signed URL issuing and verification
//! - Tracing initialization

pub mod cache;

#[cfg(feature = "rate-limit")]
pub mod rate_limit;

#[cfg(feature = "signing")]
pub mod signing;

#[cfg(feature = "observability-basic")]
pub mod telemetry;

// Re-export commonly used types
pub use cache::{Admission, Cache, CacheError, CounterStore, InMemoryCache, WindowLimit};

#[cfg(feature = "rate-limit")]
pub use rate_limit::{RateDecision, RateWindow, UploadRateLimiter};

#[cfg(feature = "signing")]
pub use signing::{SignedUrl, SigningError, UrlSigner};

#[cfg(feature = "observability-basic")]
pub use telemetry::init_tracing;
