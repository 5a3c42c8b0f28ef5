use anyhow::{Context, Result};
use assetgate_cli::{declared_content_type, file_name, init_tracing, parse_category, print_json};
use assetgate_core::{ErrorResponse, PipelineConfig, UploadFlags, UploadRequest, UploadResult};
use assetgate_services::UploadOrchestrator;
use clap::Parser;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "ingest")]
#[command(about = "Run files through the upload pipeline using environment configuration")]
struct Args {
    /// Files to upload; more than one runs as a batch
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Asset category: avatar, vehicle_photo or kyc_document
    #[arg(long, value_parser = parse_category)]
    category: assetgate_core::AssetCategory,

    /// Owning user id
    #[arg(long)]
    owner: String,

    /// Vehicle id or document type, folded into the filename
    #[arg(long)]
    subject: Option<String>,

    /// Declared content type (default: guessed from the extension)
    #[arg(long)]
    content_type: Option<String>,

    /// Overlay the brand watermark (vehicle photos only)
    #[arg(long)]
    watermark: bool,

    /// Also produce a WebP rendition
    #[arg(long)]
    webp: bool,

    /// Mark the upload as the primary photo of its subject
    #[arg(long)]
    primary: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BatchLine {
    index: usize,
    filename: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<UploadResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<ErrorResponse>,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing()?;
    let args = Args::parse();

    let config = PipelineConfig::from_env().context("Failed to load configuration")?;
    let orchestrator = UploadOrchestrator::from_config(&config).await?;
    tracing::info!(
        files = args.files.len(),
        category = %args.category,
        provider = %config.storage.provider,
        "Starting ingest"
    );

    let flags = UploadFlags {
        add_watermark: args.watermark,
        convert_alt_format: args.webp,
        is_primary: args.primary,
    };

    let mut requests = Vec::with_capacity(args.files.len());
    for path in &args.files {
        let data = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let declared = args
            .content_type
            .clone()
            .unwrap_or_else(|| declared_content_type(path).to_string());
        let mut request =
            UploadRequest::new(data, declared, file_name(path), args.owner.clone(), args.category)
                .with_flags(flags);
        if let Some(subject) = &args.subject {
            request = request.with_subject(subject.clone());
        }
        requests.push(request);
    }

    if requests.len() == 1 {
        let request = requests.remove(0);
        match orchestrator.upload(request).await {
            Ok(result) => print_json(&result)?,
            Err(err) => {
                print_json(&ErrorResponse::from(&err))?;
                anyhow::bail!("Upload failed: {}", err.kind());
            }
        }
        return Ok(());
    }

    let results = orchestrator.upload_batch(requests).await?;
    let failed = results.iter().filter(|r| !r.is_success()).count();
    let lines: Vec<BatchLine> = results
        .into_iter()
        .map(|item| {
            let (result, error) = match item.outcome {
                Ok(result) => (Some(result), None),
                Err(err) => (None, Some(ErrorResponse::from(&err))),
            };
            BatchLine {
                index: item.index,
                filename: item.filename,
                result,
                error,
            }
        })
        .collect();
    print_json(&lines)?;

    if failed > 0 {
        anyhow::bail!("{} of {} uploads failed", failed, lines.len());
    }
    Ok(())
}
