//! Error types module
//!
//! Every failure the upload pipeline can surface is a variant of `UploadError`.
//! Variants map onto a small, stable set of caller-visible kinds
//! (`UnsupportedTypeError`, `RateLimitExceededError`, ...) through `kind()`,
//! and self-describe their HTTP presentation through `ErrorMetadata`.

use serde::Serialize;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for recoverable issues like resource limits
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata for error responses - defines how an error should be presented
pub trait ErrorMetadata {
    /// HTTP status code to return
    fn http_status_code(&self) -> u16;

    /// Machine-readable error kind (e.g., "TypeMismatchError")
    fn error_code(&self) -> &'static str;

    /// Whether this error is recoverable (can be retried)
    fn is_recoverable(&self) -> bool;

    /// Suggested action for the client
    fn suggested_action(&self) -> Option<&'static str>;

    /// Client-facing message (may differ from internal error message)
    fn client_message(&self) -> String;

    /// Whether details should be hidden from callers
    fn is_sensitive(&self) -> bool;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum UploadError {
    #[error("Unsupported file type: {0}")]
    UnsupportedType(String),

    #[error("Empty file")]
    EmptyFile,

    #[error("File too large: {size} bytes (max: {max} bytes)")]
    FileTooLarge { size: usize, max: usize },

    #[error("Declared type {declared} does not match detected type {sniffed}")]
    TypeMismatch { declared: String, sniffed: String },

    #[error("Corrupted content: {0}")]
    CorruptedContent(String),

    #[error("Dimensions out of range: {0}")]
    DimensionOutOfRange(String),

    #[error("Upload rate limit exceeded: {limit} uploads per {window}")]
    RateLimitExceeded {
        window: &'static str,
        limit: u32,
        retry_after_secs: u64,
    },

    #[error("Threat detected: {0}")]
    ThreatDetected(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Signature invalid")]
    SignatureInvalid,

    #[error("Signed URL expired")]
    UrlExpired,

    #[error("Storage backend error: {0}")]
    StorageBackend(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Upload cancelled")]
    Cancelled,

    #[error("Processing error: {0}")]
    Processing(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl UploadError {
    /// Caller-visible error kind. Several variants share one kind
    /// (an empty file is reported as `FileTooLargeError`).
    pub fn kind(&self) -> &'static str {
        upload_error_static_metadata(self).1
    }

    /// True for errors raised by the validation stage.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            UploadError::UnsupportedType(_)
                | UploadError::EmptyFile
                | UploadError::FileTooLarge { .. }
                | UploadError::TypeMismatch { .. }
                | UploadError::CorruptedContent(_)
                | UploadError::DimensionOutOfRange(_)
        )
    }
}

/// (status, kind, recoverable, suggested action, sensitive, log level)
fn upload_error_static_metadata(
    err: &UploadError,
) -> (
    u16,
    &'static str,
    bool,
    Option<&'static str>,
    bool,
    LogLevel,
) {
    match err {
        UploadError::UnsupportedType(_) => (
            400,
            "UnsupportedTypeError",
            false,
            Some("Upload a supported image or document format"),
            false,
            LogLevel::Debug,
        ),
        UploadError::EmptyFile | UploadError::FileTooLarge { .. } => (
            400,
            "FileTooLargeError",
            false,
            Some("Upload a non-empty file within the size limit"),
            false,
            LogLevel::Debug,
        ),
        UploadError::TypeMismatch { .. } => (
            400,
            "TypeMismatchError",
            false,
            Some("Make sure the file content matches its declared type"),
            false,
            LogLevel::Warn,
        ),
        UploadError::CorruptedContent(_) => (
            400,
            "CorruptedContentError",
            false,
            Some("Check the file is not damaged and try again"),
            false,
            LogLevel::Debug,
        ),
        UploadError::DimensionOutOfRange(_) => (
            400,
            "DimensionOutOfRangeError",
            false,
            Some("Resize the image within the accepted dimensions"),
            false,
            LogLevel::Debug,
        ),
        UploadError::RateLimitExceeded { .. } => (
            429,
            "RateLimitExceededError",
            true,
            Some("Wait for the rate limit window to reset"),
            false,
            LogLevel::Warn,
        ),
        UploadError::ThreatDetected(_) => (
            400,
            "ThreatDetectedError",
            false,
            None,
            false,
            LogLevel::Warn,
        ),
        UploadError::ServiceUnavailable(_) => (
            503,
            "ServiceUnavailableError",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
        UploadError::SignatureInvalid => (
            403,
            "SignatureInvalidError",
            false,
            None,
            false,
            LogLevel::Warn,
        ),
        UploadError::UrlExpired => (
            403,
            "UrlExpiredError",
            false,
            Some("Request a fresh link"),
            false,
            LogLevel::Debug,
        ),
        UploadError::StorageBackend(_) => (
            502,
            "StorageBackendError",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
        UploadError::InvalidRequest(_) => (
            400,
            "InvalidRequestError",
            false,
            None,
            false,
            LogLevel::Debug,
        ),
        UploadError::Cancelled => (
            499,
            "CancelledError",
            true,
            None,
            false,
            LogLevel::Debug,
        ),
        UploadError::Processing(_) => (
            500,
            "ProcessingError",
            false,
            Some("Contact support if this error persists"),
            true,
            LogLevel::Error,
        ),
        UploadError::Internal(_) => (
            500,
            "InternalError",
            false,
            Some("Contact support if this error persists"),
            true,
            LogLevel::Error,
        ),
    }
}

impl ErrorMetadata for UploadError {
    fn http_status_code(&self) -> u16 {
        upload_error_static_metadata(self).0
    }

    fn error_code(&self) -> &'static str {
        upload_error_static_metadata(self).1
    }

    fn is_recoverable(&self) -> bool {
        upload_error_static_metadata(self).2
    }

    fn suggested_action(&self) -> Option<&'static str> {
        upload_error_static_metadata(self).3
    }

    fn is_sensitive(&self) -> bool {
        upload_error_static_metadata(self).4
    }

    fn log_level(&self) -> LogLevel {
        upload_error_static_metadata(self).5
    }

    fn client_message(&self) -> String {
        match self {
            UploadError::StorageBackend(_) => "Failed to store file".to_string(),
            UploadError::ServiceUnavailable(_) => {
                "File scanning is temporarily unavailable".to_string()
            }
            UploadError::Processing(_) | UploadError::Internal(_) => {
                "Internal server error".to_string()
            }
            other => other.to_string(),
        }
    }
}

/// Wire shape of a pipeline error: `{ kind, message }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorResponse {
    pub kind: String,
    pub message: String,
}

impl From<&UploadError> for ErrorResponse {
    fn from(err: &UploadError) -> Self {
        ErrorResponse {
            kind: err.kind().to_string(),
            message: err.client_message(),
        }
    }
}
