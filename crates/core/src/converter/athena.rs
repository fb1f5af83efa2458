//! athenapdf-backed converter.

use async_trait::async_trait;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::process::{CommandRunner, ProcessRunner};

use super::config::RendererConfig;
use super::error::ConverterError;
use super::traits::Converter;
use super::types::{ConversionOutput, ConversionRequest, Orientation, RenderOptions};

/// Builds the renderer command line.
///
/// The base command is split on whitespace, the source locator is appended,
/// then one flag per enabled option in a fixed order.
pub fn build_command(base: &str, locator: &str, options: &RenderOptions) -> Vec<String> {
    let mut args: Vec<String> = base.split_whitespace().map(str::to_string).collect();
    args.push(locator.to_string());

    if options.aggressive {
        args.push("-A".to_string());
    }
    if options.wait_for_status {
        args.push("--wait-for-status".to_string());
    }
    if options.orientation == Orientation::Landscape {
        args.push("--no-portrait".to_string());
    }
    if let Some(page_size) = options.page_size.as_deref().filter(|s| !s.is_empty()) {
        args.push("-P".to_string());
        args.push(page_size.to_string());
    }

    args
}

/// Converter that shells out to athenapdf and reads the PDF from its stdout.
pub struct AthenaConverter<R: ProcessRunner = CommandRunner> {
    config: RendererConfig,
    runner: R,
}

impl AthenaConverter<CommandRunner> {
    /// Creates a converter that runs the configured command locally.
    pub fn new(config: RendererConfig) -> Self {
        let mut runner = CommandRunner::new(config.kill_grace());
        if let Some(display) = &config.display {
            runner = runner.with_display(display.clone());
        }
        Self { config, runner }
    }
}

impl<R: ProcessRunner> AthenaConverter<R> {
    /// Creates a converter with a custom process runner.
    pub fn with_runner(config: RendererConfig, runner: R) -> Self {
        Self { config, runner }
    }

    /// Get the renderer configuration.
    pub fn config(&self) -> &RendererConfig {
        &self.config
    }
}

#[async_trait]
impl<R: ProcessRunner> Converter for AthenaConverter<R> {
    fn name(&self) -> &str {
        "athenapdf"
    }

    async fn convert(
        &self,
        request: &ConversionRequest,
        cancel: &CancellationToken,
    ) -> Result<ConversionOutput, ConverterError> {
        let args = build_command(
            &self.config.command,
            &request.source.locator(),
            &request.options,
        );
        debug!("Renderer command: {:?}", args);

        let start = Instant::now();
        let pdf = match self.runner.execute(&args, cancel).await {
            Ok(pdf) => pdf,
            Err(e) => {
                if let Some(stderr) = e.stderr() {
                    warn!("Renderer failed for {}: {}: {}", request.source, e, stderr);
                } else {
                    warn!("Renderer failed for {}: {}", request.source, e);
                }
                return Err(e.into());
            }
        };

        if pdf.is_empty() {
            warn!("Renderer produced no output for {}", request.source);
            return Err(ConverterError::EmptyOutput);
        }

        info!(
            "Rendered {} ({} bytes) in {} ms",
            request.source,
            pdf.len(),
            start.elapsed().as_millis()
        );
        Ok(ConversionOutput::Pdf(pdf))
    }

    async fn validate(&self) -> Result<(), ConverterError> {
        if self.config.command.split_whitespace().next().is_none() {
            return Err(ConverterError::invalid_command("command is empty"));
        }
        Ok(())
    }
}
