mod args;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tokio::io::AsyncWriteExt;
use tokio::signal;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use weaver_core::{
    load_config, load_config_from_env, validate_config, AthenaConverter, Config,
    ConversionOutput, ConversionRequest, ConversionSource, Converter, ErrorKind, JobError, S3Store,
    SanitizedConfig, StagedUpload, UploadingConverter, WorkerPool,
};

use args::Cli;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_json);

    if let Err(e) = run(cli).await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

fn init_logging(json: bool) {
    // stdout may carry the PDF, so logs go to stderr.
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info".into());
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

async fn run(cli: Cli) -> Result<()> {
    // Load configuration
    let config = match &cli.config {
        Some(path) => {
            info!("Loading configuration from {:?}", path);
            load_config(path).with_context(|| format!("Failed to load config from {:?}", path))?
        }
        None => load_config_from_env().context("Failed to load config from environment")?,
    };

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;
    debug!(
        "Configuration: {}",
        serde_json::to_string(&SanitizedConfig::from(&config)).unwrap_or_default()
    );

    let converter = build_converter(&config).await?;
    converter
        .validate()
        .await
        .context("Renderer is not usable")?;

    let request = build_request(&cli, &config).await?;
    let timeout = cli
        .timeout_secs
        .map(Duration::from_secs)
        .unwrap_or_else(|| config.pool.worker_timeout());

    let pool = WorkerPool::start(config.pool.clone(), converter);
    let handle = match pool.submit(request, timeout) {
        Ok(handle) => handle,
        Err(e) => {
            pool.shutdown().await;
            return Err(job_failure(e));
        }
    };
    info!("Submitted {} (timeout {}s)", handle.id(), timeout.as_secs());

    let wait = handle.wait();
    tokio::pin!(wait);
    let outcome = tokio::select! {
        outcome = &mut wait => outcome,
        _ = shutdown_signal() => {
            warn!("Interrupted, cancelling conversion");
            pool.shutdown_within(Duration::ZERO).await;
            wait.await
        }
    };
    pool.shutdown().await;

    match outcome {
        Ok(output) => write_output(output, cli.output.as_deref()).await,
        Err(e) => match (e.kind(), cli.output.as_deref()) {
            // The render succeeded; keep the bytes since a file was asked for.
            (ErrorKind::UploadFailed, Some(path)) => {
                error!("Conversion failed (upload_failed): {}", e.diagnostics());
                if let Some(pdf) = e.into_rendered_pdf() {
                    write_pdf(&pdf, Some(path)).await?;
                    warn!("Upload failed, PDF kept at {:?}", path);
                }
                bail!("{}", ErrorKind::UploadFailed.public_message())
            }
            _ => Err(job_failure(e)),
        },
    }
}

/// Renderer, wrapped in the upload step when an upload section is configured.
async fn build_converter(config: &Config) -> Result<UploadingConverter<AthenaConverter>> {
    let athena = AthenaConverter::new(config.renderer.clone());
    info!("Renderer command: {}", config.renderer.command);

    let Some(upload) = &config.upload else {
        return Ok(UploadingConverter::passthrough(athena));
    };

    let store = S3Store::new(upload.clone())
        .await
        .context("Failed to create S3 store")?;
    info!("Uploading results to bucket {}", upload.bucket);
    Ok(UploadingConverter::new(athena, Arc::new(store)).with_key_prefix(upload.key_prefix.clone()))
}

async fn build_request(cli: &Cli, config: &Config) -> Result<ConversionRequest> {
    let source = if cli.is_remote_source() {
        ConversionSource::remote(cli.source.clone())
    } else {
        let path = Path::new(&cli.source);
        let data = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read {:?}", path))?;
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_string();
        let staging_dir = config.renderer.staging_dir.clone();

        let upload = tokio::task::spawn_blocking(move || {
            StagedUpload::stage(&staging_dir, &data, &extension)
        })
        .await
        .context("Staging task failed")?
        .context("Failed to stage upload")?;
        debug!("Staged {:?} at {:?}", path, upload.path());
        ConversionSource::staged(upload)
    };

    let mut request = ConversionRequest::new(source).with_options(cli.render_options());
    if let Some(key) = &cli.upload_key {
        request = request.with_upload_key(key.clone());
    }
    Ok(request)
}

async fn write_output(output: ConversionOutput, path: Option<&Path>) -> Result<()> {
    match output {
        ConversionOutput::Pdf(pdf) => write_pdf(&pdf, path).await,
        ConversionOutput::Stored(object) => {
            info!("Stored {} bytes at {}", object.size_bytes, object.location);
            let json = serde_json::to_string(&object).context("Failed to encode result")?;
            println!("{}", json);
            Ok(())
        }
    }
}

async fn write_pdf(pdf: &[u8], path: Option<&Path>) -> Result<()> {
    match path {
        Some(path) => {
            tokio::fs::write(path, pdf)
                .await
                .with_context(|| format!("Failed to write {:?}", path))?;
            info!("Wrote {} bytes to {:?}", pdf.len(), path);
        }
        None => {
            let mut stdout = tokio::io::stdout();
            stdout.write_all(pdf).await.context("Failed to write PDF")?;
            stdout.flush().await.context("Failed to write PDF")?;
        }
    }
    Ok(())
}

fn job_failure(e: JobError) -> anyhow::Error {
    let kind = e.kind();
    if e.is_reportable() {
        error!("Conversion failed ({}): {}", kind, e.diagnostics());
    } else {
        warn!("Conversion failed ({}): {}", kind, e);
    }
    anyhow::anyhow!("{}", kind.public_message())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
