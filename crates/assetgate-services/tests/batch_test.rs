mod helpers;

use assetgate_core::{AssetCategory, BatchConfig, UploadError, UploadRequest};
use helpers::fixtures::{disguised_executable, gradient_jpeg, test_pdf};
use helpers::storage::CountingStorage;
use helpers::{local_storage, pipeline_with_storage, setup_pipeline, stored_file_count};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

fn avatar(name: &str) -> UploadRequest {
    UploadRequest::new(
        gradient_jpeg(300, 300),
        "image/jpeg",
        name,
        "42",
        AssetCategory::Avatar,
    )
}

#[tokio::test]
async fn test_batch_keeps_order_and_isolates_failures() {
    let pipeline = setup_pipeline().await;
    let requests = vec![
        avatar("a.jpg"),
        UploadRequest::new(
            disguised_executable(),
            "image/jpeg",
            "b.jpg",
            "42",
            AssetCategory::Avatar,
        ),
        UploadRequest::new(
            test_pdf(),
            "application/pdf",
            "c.pdf",
            "42",
            AssetCategory::KycDocument,
        ),
        avatar("d.jpg"),
    ];

    let results = pipeline.orchestrator.upload_batch(requests).await.unwrap();

    let names: Vec<_> = results.iter().map(|r| r.filename.as_str()).collect();
    assert_eq!(names, vec!["a.jpg", "b.jpg", "c.pdf", "d.jpg"]);
    assert_eq!(
        results.iter().map(|r| r.index).collect::<Vec<_>>(),
        vec![0, 1, 2, 3]
    );
    assert!(results[0].is_success());
    assert!(matches!(
        results[1].outcome,
        Err(UploadError::TypeMismatch { .. })
    ));
    assert!(results[2].is_success());
    assert!(results[3].is_success());
}

#[tokio::test]
async fn test_batch_bounds() {
    let pipeline = setup_pipeline().await;
    let orchestrator = pipeline.orchestrator.with_batch(BatchConfig {
        max_files: 2,
        concurrency: 2,
    });

    let err = orchestrator.upload_batch(Vec::new()).await.unwrap_err();
    assert!(matches!(err, UploadError::InvalidRequest(_)));

    let err = orchestrator
        .upload_batch(vec![avatar("a.jpg"), avatar("b.jpg"), avatar("c.jpg")])
        .await
        .unwrap_err();
    assert!(matches!(err, UploadError::InvalidRequest(_)));
    assert_eq!(stored_file_count(&pipeline.dir), 0);
}

#[tokio::test]
async fn test_cancellation_stops_further_variant_writes() {
    let dir = tempfile::tempdir().unwrap();
    let cancel = CancellationToken::new();
    let counting = Arc::new(CountingStorage::cancelling_after(
        local_storage(&dir).await,
        1,
        cancel.clone(),
    ));
    let pipeline = pipeline_with_storage(counting.clone(), dir);

    let err = pipeline
        .orchestrator
        .upload_with_cancellation(avatar("me.jpg"), &cancel)
        .await
        .unwrap_err();

    assert_eq!(err, UploadError::Cancelled);
    assert_eq!(counting.saves(), 1);
    assert_eq!(stored_file_count(&pipeline.dir), 1);
}
