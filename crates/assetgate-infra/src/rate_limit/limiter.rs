use assetgate_core::{RateLimitConfig, UploadError};
use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::cache::{Admission, CacheError, CounterStore, WindowLimit};

/// Counting window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateWindow {
    Hour,
    Day,
}

impl RateWindow {
    pub fn as_str(&self) -> &'static str {
        match self {
            RateWindow::Hour => "hour",
            RateWindow::Day => "day",
        }
    }

    pub fn duration(&self) -> Duration {
        match self {
            RateWindow::Hour => Duration::from_secs(3600),
            RateWindow::Day => Duration::from_secs(86_400),
        }
    }
}

impl fmt::Display for RateWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one rate check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    Allowed,
    Exceeded {
        window: RateWindow,
        limit: u32,
        /// Seconds until the exhausted window has room again
        retry_after_secs: u64,
    },
}

impl RateDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateDecision::Allowed)
    }

    pub fn into_result(self) -> Result<(), UploadError> {
        match self {
            RateDecision::Allowed => Ok(()),
            RateDecision::Exceeded {
                window,
                limit,
                retry_after_secs,
            } => Err(UploadError::RateLimitExceeded {
                window: window.as_str(),
                limit,
                retry_after_secs,
            }),
        }
    }
}

/// Per-user upload rate limiter.
///
/// Hour and day windows roll continuously: each user has one event log
/// (`upload_rate:{user}`) and an upload is admitted only while both windows
/// ending now hold fewer events than their ceilings. Denied attempts are not
/// recorded.
#[derive(Clone)]
pub struct UploadRateLimiter {
    store: Arc<dyn CounterStore>,
    config: RateLimitConfig,
}

impl UploadRateLimiter {
    pub fn new(store: Arc<dyn CounterStore>, config: RateLimitConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> RateLimitConfig {
        self.config
    }

    /// Record one upload for `user_id` if it is under both ceilings.
    pub async fn decide(&self, user_id: &str) -> Result<RateDecision, CacheError> {
        self.decide_at(user_id, Utc::now()).await
    }

    /// `true` when `user_id` is still under both ceilings.
    pub async fn allow(&self, user_id: &str) -> Result<bool, CacheError> {
        Ok(self.decide(user_id).await?.is_allowed())
    }

    /// Uploads recorded for `user_id` in `window` ending at `now`.
    pub async fn used_at(
        &self,
        user_id: &str,
        window: RateWindow,
        now: DateTime<Utc>,
    ) -> Result<u64, CacheError> {
        self.store
            .count(&Self::key(user_id), now.timestamp_millis(), window.duration())
            .await
    }

    #[tracing::instrument(skip(self))]
    pub async fn decide_at(
        &self,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> Result<RateDecision, CacheError> {
        const WINDOWS: [RateWindow; 2] = [RateWindow::Hour, RateWindow::Day];
        let ceilings = [self.config.per_hour, self.config.per_day];
        let limits = [
            WindowLimit {
                window: RateWindow::Hour.duration(),
                limit: ceilings[0] as u64,
            },
            WindowLimit {
                window: RateWindow::Day.duration(),
                limit: ceilings[1] as u64,
            },
        ];

        let now_ms = now.timestamp_millis();
        match self.store.admit(&Self::key(user_id), now_ms, &limits).await? {
            Admission::Recorded => {
                tracing::trace!(user_id = %user_id, "Upload counted");
                Ok(RateDecision::Allowed)
            }
            Admission::Rejected { index, retry_at_ms } => {
                let window = WINDOWS[index.min(1)];
                let limit = ceilings[index.min(1)];
                let retry_after_secs = ((retry_at_ms - now_ms).max(0) as u64).div_ceil(1000);
                tracing::info!(
                    user_id = %user_id,
                    window = %window,
                    limit = limit,
                    retry_after_secs = retry_after_secs,
                    "Upload rate limit exceeded"
                );
                Ok(RateDecision::Exceeded {
                    window,
                    limit,
                    retry_after_secs,
                })
            }
        }
    }

    fn key(user_id: &str) -> String {
        format!("upload_rate:{}", user_id)
    }
}
