use assetgate_core::{UploadError, UploadRequest, UploadResult};
use futures::stream::{self, StreamExt};

use super::orchestrator::UploadOrchestrator;

/// Outcome of one file in a batch, in input order.
#[derive(Debug)]
pub struct BatchItemResult {
    pub index: usize,
    pub filename: String,
    pub outcome: Result<UploadResult, UploadError>,
}

impl BatchItemResult {
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }
}

impl UploadOrchestrator {
    /// Upload several files with bounded concurrency.
    ///
    /// Each item succeeds or fails on its own; a rejected file never aborts
    /// its siblings. Results come back in the order the requests were given.
    pub async fn upload_batch(
        &self,
        requests: Vec<UploadRequest>,
    ) -> Result<Vec<BatchItemResult>, UploadError> {
        if requests.is_empty() {
            return Err(UploadError::InvalidRequest("Batch contains no files".into()));
        }
        if requests.len() > self.batch.max_files {
            return Err(UploadError::InvalidRequest(format!(
                "Batch of {} files exceeds the limit of {}",
                requests.len(),
                self.batch.max_files
            )));
        }

        let total = requests.len();
        let results: Vec<BatchItemResult> = stream::iter(requests.into_iter().enumerate())
            .map(|(index, request)| async move {
                let filename = request.filename.clone();
                let outcome = self.upload(request).await;
                BatchItemResult {
                    index,
                    filename,
                    outcome,
                }
            })
            .buffered(self.batch.concurrency.max(1))
            .collect()
            .await;

        let succeeded = results.iter().filter(|r| r.is_success()).count();
        tracing::info!(
            total,
            succeeded,
            failed = total - succeeded,
            "Batch upload finished"
        );
        Ok(results)
    }
}
