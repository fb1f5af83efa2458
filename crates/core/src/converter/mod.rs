//! Converter module for rendering documents to PDF.
//!
//! This module provides the `Converter` trait and its implementations:
//!
//! - `AthenaConverter` runs the athenapdf command line for a request and
//!   returns the PDF it writes to stdout.
//! - `UploadingConverter` wraps any converter and stores the PDF in an
//!   `ObjectStore`, returning a reference instead of the bytes.
//!
//! # Example
//!
//! ```ignore
//! use tokio_util::sync::CancellationToken;
//! use weaver_core::converter::{
//!     AthenaConverter, ConversionRequest, Converter, RenderOptions, RendererConfig,
//! };
//!
//! let converter = AthenaConverter::new(RendererConfig::default());
//! let request = ConversionRequest::from_url("https://example.com")
//!     .with_options(RenderOptions::default().with_page_size("A4"));
//!
//! let output = converter.convert(&request, &CancellationToken::new()).await?;
//! println!("Rendered {} bytes", output.size_bytes());
//! ```

mod athena;
mod config;
mod error;
mod source;
mod traits;
mod types;
mod upload;

pub use athena::{build_command, AthenaConverter};
pub use config::RendererConfig;
pub use error::{ConverterError, RenderedPdf};
pub use source::{ConversionSource, StagedUpload};
pub use traits::Converter;
pub use types::{ConversionOutput, ConversionRequest, Orientation, RenderOptions};
pub use upload::{UploadingConverter, PDF_CONTENT_TYPE};
