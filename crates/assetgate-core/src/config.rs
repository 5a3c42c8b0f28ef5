//! Configuration module
//!
//! Pipeline configuration is read from the environment once at startup
//! (after loading `.env` through dotenvy) and then handed to the components
//! that need it. Numeric settings that fail to parse fall back to their
//! defaults; settings without a sensible default are required.

use std::env;
use std::time::Duration;

use crate::models::{AssetCategory, TtlClass};
use crate::storage_types::StorageProvider;

const MB: usize = 1024 * 1024;
const MAX_AVATAR_SIZE_MB: usize = 5;
const MAX_VEHICLE_PHOTO_SIZE_MB: usize = 10;
const MAX_DOCUMENT_SIZE_MB: usize = 15;
const MIN_IMAGE_DIMENSION: u32 = 200;
const MAX_IMAGE_DIMENSION: u32 = 4096;
const MAX_ASPECT_RATIO: u32 = 10;
const CLAMAV_PORT: u16 = 3310;
const CLAMAV_TIMEOUT_SECS: u64 = 30;
const SIGNED_URL_TTL_HOURS: u64 = 24;
const DOCUMENT_SIGNED_URL_TTL_HOURS: u64 = 168;
const RATE_LIMIT_PER_HOUR: u32 = 50;
const RATE_LIMIT_PER_DAY: u32 = 200;
const WATERMARK_OPACITY: u8 = 100;
const BATCH_MAX_FILES: usize = 10;
const BATCH_CONCURRENCY: usize = 4;
const MIN_SIGNING_SECRET_LEN: usize = 32;

/// Storage backend settings
#[derive(Clone, Debug)]
pub struct StorageConfig {
    pub provider: StorageProvider,
    pub local_path: String,
    pub local_base_url: String,
    pub s3_bucket: Option<String>,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>,
    pub azure_account: Option<String>,
    pub azure_access_key: Option<String>,
    pub azure_container: Option<String>,
}

impl StorageConfig {
    /// Local filesystem storage rooted at `path`, served under `/storage`.
    pub fn local(path: impl Into<String>) -> Self {
        Self {
            provider: StorageProvider::Local,
            local_path: path.into(),
            local_base_url: "/storage".to_string(),
            s3_bucket: None,
            s3_region: None,
            s3_endpoint: None,
            azure_account: None,
            azure_access_key: None,
            azure_container: None,
        }
    }
}

/// Byte ceilings and pixel bounds enforced by the validator
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidationLimits {
    pub avatar_max_bytes: usize,
    pub vehicle_photo_max_bytes: usize,
    pub kyc_document_max_bytes: usize,
    pub min_dimension: u32,
    pub max_dimension: u32,
    /// Longest side may be at most this many times the shortest.
    pub max_aspect_ratio: u32,
}

impl ValidationLimits {
    pub fn max_bytes(&self, category: AssetCategory) -> usize {
        match category {
            AssetCategory::Avatar => self.avatar_max_bytes,
            AssetCategory::VehiclePhoto => self.vehicle_photo_max_bytes,
            AssetCategory::KycDocument => self.kyc_document_max_bytes,
        }
    }
}

impl Default for ValidationLimits {
    fn default() -> Self {
        Self {
            avatar_max_bytes: MAX_AVATAR_SIZE_MB * MB,
            vehicle_photo_max_bytes: MAX_VEHICLE_PHOTO_SIZE_MB * MB,
            kyc_document_max_bytes: MAX_DOCUMENT_SIZE_MB * MB,
            min_dimension: MIN_IMAGE_DIMENSION,
            max_dimension: MAX_IMAGE_DIMENSION,
            max_aspect_ratio: MAX_ASPECT_RATIO,
        }
    }
}

/// Antivirus settings
#[derive(Clone, Debug)]
pub struct ScannerConfig {
    pub enabled: bool,
    pub host: String,
    pub port: u16,
    /// Treat an unreachable daemon as a clean scan. Forbidden in production.
    pub fail_open: bool,
    pub timeout_secs: u64,
}

/// Signed URL settings
#[derive(Clone, Debug)]
pub struct SigningConfig {
    pub secret: String,
    pub media_ttl_hours: u64,
    pub document_ttl_hours: u64,
}

impl SigningConfig {
    pub fn ttl_for(&self, category: AssetCategory) -> Duration {
        let hours = match category.ttl_class() {
            TtlClass::Media => self.media_ttl_hours,
            TtlClass::Document => self.document_ttl_hours,
        };
        Duration::from_secs(hours * 3600)
    }
}

/// Per-user upload ceilings
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub per_hour: u32,
    pub per_day: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            per_hour: RATE_LIMIT_PER_HOUR,
            per_day: RATE_LIMIT_PER_DAY,
        }
    }
}

/// Vehicle photo watermark settings
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WatermarkSettings {
    pub text: String,
    /// One of top-left, top-right, bottom-left, bottom-right, center.
    pub position: String,
    /// Fill alpha, 0-255. The shadow uses half of it.
    pub opacity: u8,
}

impl Default for WatermarkSettings {
    fn default() -> Self {
        Self {
            text: "AUTOLOCO".to_string(),
            position: "bottom-right".to_string(),
            opacity: WATERMARK_OPACITY,
        }
    }
}

/// Batch upload bounds
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BatchConfig {
    pub max_files: usize,
    pub concurrency: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_files: BATCH_MAX_FILES,
            concurrency: BATCH_CONCURRENCY,
        }
    }
}

/// Complete pipeline configuration
#[derive(Clone, Debug)]
pub struct PipelineConfig {
    pub environment: String,
    pub storage: StorageConfig,
    pub limits: ValidationLimits,
    pub scanner: ScannerConfig,
    pub signing: SigningConfig,
    pub rate_limit: RateLimitConfig,
    pub watermark: WatermarkSettings,
    pub batch: BatchConfig,
}

fn parse_or<T: std::str::FromStr>(value: Option<String>, default: T) -> T {
    value
        .and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(default)
}

fn parse_bool(value: Option<String>, default: bool) -> bool {
    match value.map(|v| v.trim().to_lowercase()) {
        Some(v) if matches!(v.as_str(), "1" | "true" | "yes" | "on") => true,
        Some(v) if matches!(v.as_str(), "0" | "false" | "no" | "off") => false,
        _ => default,
    }
}

impl PipelineConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = lookup("ENVIRONMENT")
            .or_else(|| lookup("APP_ENV"))
            .unwrap_or_else(|| "development".to_string());
        let is_production = is_production_env(&environment);

        let provider = match lookup("STORAGE_PROVIDER") {
            Some(value) => value.parse::<StorageProvider>()?,
            None => StorageProvider::Local,
        };

        let storage = StorageConfig {
            provider,
            local_path: lookup("LOCAL_STORAGE_PATH").unwrap_or_else(|| "./uploads".to_string()),
            local_base_url: lookup("LOCAL_STORAGE_BASE_URL")
                .unwrap_or_else(|| "/storage".to_string()),
            s3_bucket: lookup("S3_BUCKET"),
            s3_region: lookup("S3_REGION").or_else(|| lookup("AWS_REGION")),
            s3_endpoint: lookup("S3_ENDPOINT"),
            azure_account: lookup("AZURE_STORAGE_ACCOUNT"),
            azure_access_key: lookup("AZURE_STORAGE_KEY"),
            azure_container: lookup("AZURE_STORAGE_CONTAINER"),
        };

        let limits = ValidationLimits {
            avatar_max_bytes: parse_or(lookup("MAX_AVATAR_SIZE_MB"), MAX_AVATAR_SIZE_MB) * MB,
            vehicle_photo_max_bytes: parse_or(
                lookup("MAX_VEHICLE_PHOTO_SIZE_MB"),
                MAX_VEHICLE_PHOTO_SIZE_MB,
            ) * MB,
            kyc_document_max_bytes: parse_or(lookup("MAX_DOCUMENT_SIZE_MB"), MAX_DOCUMENT_SIZE_MB)
                * MB,
            min_dimension: parse_or(lookup("MIN_IMAGE_DIMENSION"), MIN_IMAGE_DIMENSION),
            max_dimension: parse_or(lookup("MAX_IMAGE_DIMENSION"), MAX_IMAGE_DIMENSION),
            max_aspect_ratio: parse_or(lookup("MAX_ASPECT_RATIO"), MAX_ASPECT_RATIO),
        };

        let scanner = ScannerConfig {
            enabled: parse_bool(lookup("AV_ENABLED"), false),
            host: lookup("CLAMAV_HOST").unwrap_or_else(|| "localhost".to_string()),
            port: parse_or(lookup("CLAMAV_PORT"), CLAMAV_PORT),
            // Fail-closed unless explicitly opened, and never by default in production.
            fail_open: parse_bool(lookup("AV_FAIL_OPEN"), !is_production),
            timeout_secs: parse_or(lookup("CLAMAV_TIMEOUT_SECS"), CLAMAV_TIMEOUT_SECS),
        };

        let signing = SigningConfig {
            secret: lookup("URL_SIGNING_SECRET")
                .ok_or_else(|| anyhow::anyhow!("URL_SIGNING_SECRET must be set"))?,
            media_ttl_hours: parse_or(lookup("SIGNED_URL_TTL_HOURS"), SIGNED_URL_TTL_HOURS),
            document_ttl_hours: parse_or(
                lookup("DOCUMENT_SIGNED_URL_TTL_HOURS"),
                DOCUMENT_SIGNED_URL_TTL_HOURS,
            ),
        };

        let rate_limit = RateLimitConfig {
            per_hour: parse_or(lookup("RATE_LIMIT_PER_HOUR"), RATE_LIMIT_PER_HOUR),
            per_day: parse_or(lookup("RATE_LIMIT_PER_DAY"), RATE_LIMIT_PER_DAY),
        };

        let defaults = WatermarkSettings::default();
        let watermark = WatermarkSettings {
            text: lookup("WATERMARK_TEXT").unwrap_or(defaults.text),
            position: lookup("WATERMARK_POSITION").unwrap_or(defaults.position),
            opacity: parse_or(lookup("WATERMARK_OPACITY"), defaults.opacity),
        };

        let batch = BatchConfig {
            max_files: parse_or(lookup("BATCH_MAX_FILES"), BATCH_MAX_FILES),
            concurrency: parse_or(lookup("BATCH_CONCURRENCY"), BATCH_CONCURRENCY),
        };

        Ok(PipelineConfig {
            environment,
            storage,
            limits,
            scanner,
            signing,
            rate_limit,
            watermark,
            batch,
        })
    }

    pub fn is_production(&self) -> bool {
        is_production_env(&self.environment)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.signing.secret.len() < MIN_SIGNING_SECRET_LEN {
            return Err(anyhow::anyhow!(
                "URL_SIGNING_SECRET must be at least {} characters long",
                MIN_SIGNING_SECRET_LEN
            ));
        }

        if self.is_production() && self.scanner.fail_open {
            return Err(anyhow::anyhow!(
                "AV_FAIL_OPEN cannot be enabled in production; antivirus outages must reject uploads"
            ));
        }

        if self.limits.min_dimension == 0 || self.limits.min_dimension > self.limits.max_dimension
        {
            return Err(anyhow::anyhow!(
                "MIN_IMAGE_DIMENSION must be between 1 and MAX_IMAGE_DIMENSION"
            ));
        }

        if self.limits.max_aspect_ratio == 0 {
            return Err(anyhow::anyhow!("MAX_ASPECT_RATIO must be at least 1"));
        }

        if self.rate_limit.per_hour == 0 || self.rate_limit.per_day == 0 {
            return Err(anyhow::anyhow!(
                "RATE_LIMIT_PER_HOUR and RATE_LIMIT_PER_DAY must be positive"
            ));
        }

        if self.batch.max_files == 0 || self.batch.concurrency == 0 {
            return Err(anyhow::anyhow!(
                "BATCH_MAX_FILES and BATCH_CONCURRENCY must be positive"
            ));
        }

        // Validate storage provider configuration
        match self.storage.provider {
            StorageProvider::Local => {
                if self.storage.local_path.trim().is_empty() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_PATH must be set when using local storage"
                    ));
                }
            }
            StorageProvider::BlobA => {
                if self.storage.s3_bucket.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_BUCKET must be set when STORAGE_PROVIDER=blobA"
                    ));
                }
                if self.storage.s3_region.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_REGION or AWS_REGION must be set when STORAGE_PROVIDER=blobA"
                    ));
                }
            }
            StorageProvider::BlobB => {
                if self.storage.azure_account.is_none()
                    || self.storage.azure_access_key.is_none()
                    || self.storage.azure_container.is_none()
                {
                    return Err(anyhow::anyhow!(
                        "AZURE_STORAGE_ACCOUNT, AZURE_STORAGE_KEY and AZURE_STORAGE_CONTAINER must be set when STORAGE_PROVIDER=blobB"
                    ));
                }
            }
        }

        Ok(())
    }
}

fn is_production_env(environment: &str) -> bool {
    let env = environment.to_lowercase();
    env == "production" || env == "prod"
}
