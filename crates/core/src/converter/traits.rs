//! Trait definitions for the converter module.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::error::ConverterError;
use super::types::{ConversionOutput, ConversionRequest};

/// A converter that turns a request into a PDF.
///
/// Implementations must return promptly once `cancel` fires, after releasing
/// any external process they started.
#[async_trait]
pub trait Converter: Send + Sync {
    /// Returns the name of this converter implementation.
    fn name(&self) -> &str;

    /// Converts the request's source to a PDF.
    async fn convert(
        &self,
        request: &ConversionRequest,
        cancel: &CancellationToken,
    ) -> Result<ConversionOutput, ConverterError>;

    /// Validates that the converter is properly configured and ready.
    async fn validate(&self) -> Result<(), ConverterError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoConverter;

    #[async_trait]
    impl Converter for EchoConverter {
        fn name(&self) -> &str {
            "echo"
        }

        async fn convert(
            &self,
            request: &ConversionRequest,
            _cancel: &CancellationToken,
        ) -> Result<ConversionOutput, ConverterError> {
            Ok(ConversionOutput::Pdf(request.source.locator().into_bytes()))
        }
    }

    #[tokio::test]
    async fn test_converter_object_safe() {
        let converter: Box<dyn Converter> = Box::new(EchoConverter);
        let request = ConversionRequest::from_url("https://example.com");
        let output = converter
            .convert(&request, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(output.as_pdf(), Some(&b"https://example.com"[..]));
        assert!(converter.validate().await.is_ok());
        assert_eq!(converter.name(), "echo");
    }
}
