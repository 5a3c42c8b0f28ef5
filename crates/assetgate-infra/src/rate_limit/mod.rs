//! Upload rate limiting
//!
//! Per-user rolling hour and day windows over a sliding event log kept in
//! an injected `CounterStore`.

pub use limiter::{RateDecision, RateWindow, UploadRateLimiter};

mod limiter;
