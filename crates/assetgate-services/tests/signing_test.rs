mod helpers;

use assetgate_core::{AssetCategory, UploadError, UploadRequest};
use assetgate_infra::{Cache, InMemoryCache, SignedUrl};
use helpers::fixtures::gradient_jpeg;
use helpers::setup_pipeline;
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn test_one_second_url_expires() {
    let pipeline = setup_pipeline().await;
    let url = pipeline
        .orchestrator
        .signer()
        .sign("avatars/42/2024/01/a.jpg", Duration::from_secs(1))
        .unwrap()
        .to_string();

    assert!(pipeline.orchestrator.verify_signed_url(&url).is_ok());
    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(
        pipeline.orchestrator.verify_signed_url(&url).unwrap_err(),
        UploadError::UrlExpired
    );
}

#[tokio::test]
async fn test_tampered_path_is_rejected() {
    let pipeline = setup_pipeline().await;
    let url = pipeline
        .orchestrator
        .signed_url("documents/42/2024/01/id.pdf", AssetCategory::KycDocument)
        .await
        .unwrap();

    let forged = url.replace("documents/42/", "documents/43/");
    assert_eq!(
        pipeline.orchestrator.verify_signed_url(&forged).unwrap_err(),
        UploadError::SignatureInvalid
    );
    assert_eq!(
        pipeline
            .orchestrator
            .verify_signed_url("/files/x.jpg?expires=abc")
            .unwrap_err(),
        UploadError::SignatureInvalid
    );
}

#[tokio::test]
async fn test_document_urls_use_document_lifetime() {
    let pipeline = setup_pipeline().await;
    let media = pipeline
        .orchestrator
        .signed_url("avatars/42/2024/01/a.jpg", AssetCategory::Avatar)
        .await
        .unwrap();
    let document = pipeline
        .orchestrator
        .signed_url("documents/42/2024/01/id.pdf", AssetCategory::KycDocument)
        .await
        .unwrap();

    let now = chrono::Utc::now().timestamp();
    let media_expires = SignedUrl::parse(&media).unwrap().expires;
    let document_expires = SignedUrl::parse(&document).unwrap().expires;
    assert!((media_expires - now - 24 * 3600).abs() <= 5);
    assert!((document_expires - now - 168 * 3600).abs() <= 5);
}

#[tokio::test]
async fn test_delete_evicts_cached_signed_url() {
    let pipeline = setup_pipeline().await;
    let cache = Arc::new(InMemoryCache::new());
    let orchestrator = pipeline.orchestrator.with_cache(cache.clone());

    let request = UploadRequest::new(
        gradient_jpeg(300, 300),
        "image/jpeg",
        "me.jpg",
        "42",
        AssetCategory::Avatar,
    );
    let result = orchestrator.upload(request).await.unwrap();
    let key = format!("signed_url:media:{}", result.path);
    assert_eq!(cache.get(&key).await.unwrap(), result.signed_url);

    assert!(orchestrator.delete(&result.url).await.unwrap());
    assert_eq!(cache.get(&key).await.unwrap(), None);
}

#[tokio::test]
async fn test_signature_letter_case_is_significant() {
    let pipeline = setup_pipeline().await;
    let url = pipeline
        .orchestrator
        .signed_url("avatars/42/2024/01/a.jpg", AssetCategory::Avatar)
        .await
        .unwrap();

    let mut signed = SignedUrl::parse(&url).unwrap();
    let at = signed
        .signature
        .find(|c: char| c.is_ascii_alphabetic())
        .expect("hex signature with a letter");
    signed.signature = format!(
        "{}{}{}",
        &signed.signature[..at],
        signed.signature[at..at + 1].to_ascii_uppercase(),
        &signed.signature[at + 1..]
    );

    assert_eq!(
        pipeline
            .orchestrator
            .verify_signed_url(&signed.to_string())
            .unwrap_err(),
        UploadError::SignatureInvalid
    );
}
