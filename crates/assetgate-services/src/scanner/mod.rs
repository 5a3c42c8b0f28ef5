//! Malware scanning
//!
//! A scanner inspects the raw bytes of an upload before anything is written
//! to storage. Outcomes are three-valued: an unreachable or timed-out daemon
//! is reported as `Unavailable`, never folded into `Clean`, unless the
//! configured [`ScannerPolicy`] explicitly fails open.

#[cfg(feature = "clamav")]
pub mod clamav;

use async_trait::async_trait;
use bytes::Bytes;
use std::fmt;

#[cfg(feature = "clamav")]
pub use clamav::ClamAvScanner;

/// Outcome of scanning one payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanResult {
    Clean,
    /// Threat name as reported by the engine
    Infected(String),
    /// The engine could not give a verdict
    Unavailable(String),
}

impl ScanResult {
    pub fn is_clean(&self) -> bool {
        matches!(self, ScanResult::Clean)
    }
}

impl fmt::Display for ScanResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanResult::Clean => f.write_str("clean"),
            ScanResult::Infected(name) => write!(f, "infected ({})", name),
            ScanResult::Unavailable(reason) => write!(f, "unavailable ({})", reason),
        }
    }
}

/// What to do when the engine cannot give a verdict
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScannerPolicy {
    /// Treat `Unavailable` as `Clean`. Refused in production by config validation.
    pub fail_open: bool,
}

impl ScannerPolicy {
    pub fn fail_closed() -> Self {
        Self { fail_open: false }
    }

    pub fn fail_open() -> Self {
        Self { fail_open: true }
    }

    /// Apply the policy to a raw engine outcome.
    pub fn resolve(&self, result: ScanResult) -> ScanResult {
        match result {
            ScanResult::Unavailable(reason) if self.fail_open => {
                tracing::warn!(reason = %reason, "Scanner unavailable, continuing (fail-open)");
                ScanResult::Clean
            }
            other => other,
        }
    }
}

/// Antivirus engine seam
#[async_trait]
pub trait ThreatScanner: Send + Sync {
    /// Scan an in-memory payload. Never errors; failures are `Unavailable`.
    async fn scan(&self, data: Bytes) -> ScanResult;

    /// Engine name for logs
    fn name(&self) -> &'static str;
}
