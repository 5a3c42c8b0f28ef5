use assetgate_services::{ScanResult, ScannerPolicy, ThreatScanner};
use async_trait::async_trait;
use bytes::Bytes;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Scanner that always answers with a fixed verdict.
pub struct ScriptedScanner {
    verdict: ScanResult,
    policy: ScannerPolicy,
    calls: AtomicUsize,
}

impl ScriptedScanner {
    pub fn new(verdict: ScanResult) -> Self {
        Self::with_policy(verdict, ScannerPolicy::fail_closed())
    }

    pub fn with_policy(verdict: ScanResult, policy: ScannerPolicy) -> Self {
        Self {
            verdict,
            policy,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ThreatScanner for ScriptedScanner {
    async fn scan(&self, _data: Bytes) -> ScanResult {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.policy.resolve(self.verdict.clone())
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}
