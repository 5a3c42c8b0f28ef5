use assetgate_core::ScannerConfig;
use async_trait::async_trait;
use bytes::Bytes;
use clamav_client::{clean, Tcp};
use std::str;
use std::time::{Duration, Instant};

use super::{ScanResult, ScannerPolicy, ThreatScanner};

/// ClamAV daemon client over TCP
#[derive(Debug, Clone)]
pub struct ClamAvScanner {
    host: String,
    port: u16,
    policy: ScannerPolicy,
    /// Timeout for each scan, including the connection attempt
    timeout: Duration,
}

impl ClamAvScanner {
    pub fn new(host: impl Into<String>, port: u16, policy: ScannerPolicy) -> Self {
        Self::with_timeout(host, port, policy, Duration::from_secs(30))
    }

    pub fn with_timeout(
        host: impl Into<String>,
        port: u16,
        policy: ScannerPolicy,
        timeout: Duration,
    ) -> Self {
        Self {
            host: host.into(),
            port,
            policy,
            timeout,
        }
    }

    pub fn from_config(config: &ScannerConfig) -> Self {
        Self::with_timeout(
            config.host.clone(),
            config.port,
            ScannerPolicy {
                fail_open: config.fail_open,
            },
            Duration::from_secs(config.timeout_secs),
        )
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Run the blocking client on the blocking pool, bounded by the timeout.
    async fn scan_raw(&self, data: Bytes) -> ScanResult {
        let start = Instant::now();
        let address = self.address();
        tracing::debug!(address = %address, size_bytes = data.len(), "Starting ClamAV scan");

        let result = tokio::time::timeout(
            self.timeout,
            tokio::task::spawn_blocking(move || {
                let connection = Tcp {
                    host_address: address.as_str(),
                };
                match clamav_client::scan_buffer(&data, connection, None) {
                    Ok(response) => interpret_response(&response),
                    Err(e) => ScanResult::Unavailable(format!("ClamAV scan error: {}", e)),
                }
            }),
        )
        .await;

        let outcome = match result {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(e)) => ScanResult::Unavailable(format!("ClamAV scan task join error: {}", e)),
            Err(_) => ScanResult::Unavailable(format!(
                "ClamAV scan timeout (exceeded {} seconds)",
                self.timeout.as_secs()
            )),
        };

        let duration_ms = start.elapsed().as_millis();
        match &outcome {
            ScanResult::Clean => tracing::info!(duration_ms, "File scan completed: clean"),
            ScanResult::Infected(virus) => {
                tracing::warn!(duration_ms, virus = %virus, "File scan detected virus")
            }
            ScanResult::Unavailable(reason) => {
                tracing::error!(duration_ms, error = %reason, "ClamAV scan failed")
            }
        }
        outcome
    }
}

#[async_trait]
impl ThreatScanner for ClamAvScanner {
    async fn scan(&self, data: Bytes) -> ScanResult {
        let raw = self.scan_raw(data).await;
        self.policy.resolve(raw)
    }

    fn name(&self) -> &'static str {
        "clamav"
    }
}

fn interpret_response(response: &[u8]) -> ScanResult {
    match clean(response) {
        Ok(true) => ScanResult::Clean,
        Ok(false) => ScanResult::Infected(virus_name(response)),
        Err(e) => ScanResult::Unavailable(format!("Failed to parse ClamAV response: {}", e)),
    }
}

/// Extract the signature name from `stream: Eicar-Signature FOUND`.
fn virus_name(response: &[u8]) -> String {
    let text = str::from_utf8(response)
        .unwrap_or_default()
        .trim_end_matches('\0')
        .trim();
    if !text.contains("FOUND") {
        return "unknown".to_string();
    }
    text.split(':')
        .nth(1)
        .and_then(|rest| rest.split_whitespace().next())
        .unwrap_or("unknown")
        .to_string()
}
