//! Test helpers: build an orchestrator over a temporary local store.
//!
//! Run from workspace root: `cargo test -p assetgate-services`.

#![allow(dead_code)]

pub mod fixtures;
pub mod scanner;
pub mod storage;

use assetgate_core::RateLimitConfig;
use assetgate_infra::{InMemoryCache, UploadRateLimiter, UrlSigner};
use assetgate_services::{LocalStorage, Storage, ThreatScanner, UploadOrchestrator};
use std::sync::Arc;
use tempfile::TempDir;

pub const TEST_SECRET: &str = "test-secret-0123456789abcdef-0123456789";
pub const TEST_BASE_URL: &str = "/storage";

/// Orchestrator plus the directory backing its storage.
pub struct TestPipeline {
    pub orchestrator: UploadOrchestrator,
    pub storage: Arc<dyn Storage>,
    pub dir: TempDir,
}

pub async fn local_storage(dir: &TempDir) -> Arc<dyn Storage> {
    Arc::new(
        LocalStorage::new(dir.path().to_path_buf(), TEST_BASE_URL.to_string())
            .await
            .expect("local storage"),
    )
}

/// Pipeline over local storage with default limits and no scanner.
pub async fn setup_pipeline() -> TestPipeline {
    let dir = tempfile::tempdir().expect("tempdir");
    let storage = local_storage(&dir).await;
    TestPipeline {
        orchestrator: UploadOrchestrator::new(storage.clone(), UrlSigner::new(TEST_SECRET)),
        storage,
        dir,
    }
}

/// Pipeline over a caller-provided store.
pub fn pipeline_with_storage(storage: Arc<dyn Storage>, dir: TempDir) -> TestPipeline {
    TestPipeline {
        orchestrator: UploadOrchestrator::new(storage.clone(), UrlSigner::new(TEST_SECRET)),
        storage,
        dir,
    }
}

/// Pipeline with the given hourly/daily ceilings.
pub async fn setup_rate_limited_pipeline(per_hour: u32, per_day: u32) -> TestPipeline {
    let pipeline = setup_pipeline().await;
    let limiter = UploadRateLimiter::new(
        Arc::new(InMemoryCache::new()),
        RateLimitConfig { per_hour, per_day },
    );
    TestPipeline {
        orchestrator: pipeline.orchestrator.with_rate_limiter(limiter),
        ..pipeline
    }
}

/// Pipeline that scans every upload with `scanner`.
pub async fn setup_scanned_pipeline(scanner: Arc<dyn ThreatScanner>) -> TestPipeline {
    let pipeline = setup_pipeline().await;
    TestPipeline {
        orchestrator: pipeline.orchestrator.with_scanner(scanner),
        ..pipeline
    }
}

/// Number of regular files under the storage root.
pub fn stored_file_count(dir: &TempDir) -> usize {
    fn walk(path: &std::path::Path) -> usize {
        std::fs::read_dir(path)
            .map(|entries| {
                entries
                    .flatten()
                    .map(|entry| {
                        let path = entry.path();
                        if path.is_dir() {
                            walk(&path)
                        } else {
                            1
                        }
                    })
                    .sum()
            })
            .unwrap_or(0)
    }
    walk(dir.path())
}
