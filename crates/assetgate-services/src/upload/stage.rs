use assetgate_core::{ErrorMetadata, LogLevel, UploadError};
use std::fmt;
use std::time::Instant;
use uuid::Uuid;

/// Where an upload currently is in the pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadStage {
    Received,
    Validated,
    RateChecked,
    Scanned,
    Transformed,
    Stored,
    Signed,
    Done,
    Failed(String),
}

impl UploadStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            UploadStage::Received => "received",
            UploadStage::Validated => "validated",
            UploadStage::RateChecked => "rate_checked",
            UploadStage::Scanned => "scanned",
            UploadStage::Transformed => "transformed",
            UploadStage::Stored => "stored",
            UploadStage::Signed => "signed",
            UploadStage::Done => "done",
            UploadStage::Failed(_) => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, UploadStage::Done | UploadStage::Failed(_))
    }
}

impl fmt::Display for UploadStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Follows one upload through its stages and logs each transition.
#[derive(Debug)]
pub struct StageTracker {
    upload_id: Uuid,
    stage: UploadStage,
    started: Instant,
}

impl StageTracker {
    pub fn new(upload_id: Uuid) -> Self {
        tracing::debug!(upload_id = %upload_id, stage = "received", "Upload received");
        Self {
            upload_id,
            stage: UploadStage::Received,
            started: Instant::now(),
        }
    }

    pub fn upload_id(&self) -> Uuid {
        self.upload_id
    }

    pub fn stage(&self) -> &UploadStage {
        &self.stage
    }

    pub fn advance(&mut self, next: UploadStage) {
        tracing::debug!(
            upload_id = %self.upload_id,
            from = %self.stage,
            to = %next,
            elapsed_ms = self.started.elapsed().as_millis(),
            "Upload stage transition"
        );
        self.stage = next;
    }

    /// Move to `Failed`, logging at the level the error asks for.
    pub fn fail(&mut self, err: &UploadError) {
        let from = self.stage.as_str();
        let elapsed_ms = self.started.elapsed().as_millis();
        match err.log_level() {
            LogLevel::Debug => tracing::debug!(
                upload_id = %self.upload_id,
                from,
                kind = err.kind(),
                error = %err,
                elapsed_ms,
                "Upload failed"
            ),
            LogLevel::Warn => tracing::warn!(
                upload_id = %self.upload_id,
                from,
                kind = err.kind(),
                error = %err,
                elapsed_ms,
                "Upload failed"
            ),
            LogLevel::Error => tracing::error!(
                upload_id = %self.upload_id,
                from,
                kind = err.kind(),
                error = %err,
                elapsed_ms,
                "Upload failed"
            ),
        }
        self.stage = UploadStage::Failed(err.kind().to_string());
    }
}
