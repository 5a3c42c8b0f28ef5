use anyhow::{Context, Result};
use assetgate_cli::{init_tracing, parse_category, print_json};
use assetgate_core::{AssetCategory, ErrorResponse, PipelineConfig, UploadError};
use assetgate_services::UrlSigner;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "signed_url", about = "Sign or verify storage paths with URL_SIGNING_SECRET")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Issue a signed URL for a stored path
    Sign {
        /// Relative storage path, e.g. vehicles/42/2024/05/vehicle_....jpg
        path: String,
        /// Category deciding the default lifetime
        #[arg(long, default_value = "vehicle_photo", value_parser = parse_category)]
        category: AssetCategory,
        /// Override the lifetime in seconds
        #[arg(long)]
        ttl_secs: Option<u64>,
    },
    /// Check a signed URL and print the path it grants
    Verify {
        /// URL in the form /files/{path}?expires=..&signature=..
        url: String,
    },
}

#[derive(Serialize)]
struct Signed {
    url: String,
    path: String,
    expires: i64,
}

#[derive(Serialize)]
struct Verified {
    valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<ErrorResponse>,
}

fn main() -> Result<()> {
    init_tracing()?;
    let cli = Cli::parse();

    let config = PipelineConfig::from_env().context("Failed to load configuration")?;
    let signer = UrlSigner::new(&config.signing.secret);

    match cli.command {
        Commands::Sign {
            path,
            category,
            ttl_secs,
        } => {
            let ttl = ttl_secs
                .map(Duration::from_secs)
                .unwrap_or_else(|| config.signing.ttl_for(category));
            let signed = signer.sign(&path, ttl).map_err(UploadError::from)?;
            print_json(&Signed {
                url: signed.to_string(),
                path: signed.path,
                expires: signed.expires,
            })?;
        }
        Commands::Verify { url } => match signer.verify_url(&url) {
            Ok(path) => print_json(&Verified {
                valid: true,
                path: Some(path),
                error: None,
            })?,
            Err(err) => {
                let err = UploadError::from(err);
                print_json(&Verified {
                    valid: false,
                    path: None,
                    error: Some(ErrorResponse::from(&err)),
                })?;
                anyhow::bail!("Signed URL rejected: {}", err.kind());
            }
        },
    }

    Ok(())
}
