//! Assetgate CLI helpers shared by the operator binaries.
//!
//! Configuration comes from the environment (and `.env`), exactly as for a
//! long-running service. Results go to stdout as JSON; logs go to stderr.

use anyhow::Context;
use assetgate_core::AssetCategory;
use serde::Serialize;
use std::path::Path;

/// Initialize tracing for CLI binaries. Set `LOG_FORMAT=json` for JSON lines.
pub fn init_tracing() -> anyhow::Result<()> {
    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    assetgate_services::init_tracing(json, "info")
}

pub fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize output")?;
    println!("{}", out);
    Ok(())
}

/// MIME type a client would declare for `path`, judged by extension only.
pub fn declared_content_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        Some("pdf") => "application/pdf",
        _ => "application/octet-stream",
    }
}

pub fn parse_category(value: &str) -> anyhow::Result<AssetCategory> {
    value.parse::<AssetCategory>()
}

/// File name component of `path`, falling back to the whole path.
pub fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}
