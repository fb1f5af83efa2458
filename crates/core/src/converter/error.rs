//! Error types for the converter module.

use std::fmt;
use thiserror::Error;

use crate::process::ProcessError;

/// PDF bytes rendered before a later step failed.
#[derive(Clone, PartialEq, Eq)]
pub struct RenderedPdf(pub Vec<u8>);

impl fmt::Debug for RenderedPdf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RenderedPdf({} bytes)", self.0.len())
    }
}

/// Errors that can occur during conversion.
#[derive(Debug, Error)]
pub enum ConverterError {
    /// The renderer could not be run or did not succeed.
    #[error(transparent)]
    Process(#[from] ProcessError),

    /// The renderer exited successfully but produced nothing.
    #[error("Renderer produced no output")]
    EmptyOutput,

    /// The renderer command template is unusable.
    #[error("Invalid renderer command: {reason}")]
    InvalidCommand { reason: String },

    /// Rendering succeeded but storing the result failed.
    #[error("Failed to upload {key}: {reason}")]
    UploadFailed {
        key: String,
        reason: String,
        pdf: RenderedPdf,
    },
}

impl ConverterError {
    /// Creates a new upload failed error that keeps the rendered bytes.
    pub fn upload_failed(key: impl Into<String>, reason: impl Into<String>, pdf: Vec<u8>) -> Self {
        Self::UploadFailed {
            key: key.into(),
            reason: reason.into(),
            pdf: RenderedPdf(pdf),
        }
    }

    /// Creates a new invalid command error.
    pub fn invalid_command(reason: impl Into<String>) -> Self {
        Self::InvalidCommand {
            reason: reason.into(),
        }
    }

    /// Whether the conversion was cancelled.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Process(ProcessError::Cancelled))
    }

    /// Takes back the rendered PDF from an upload failure.
    pub fn into_rendered_pdf(self) -> Option<Vec<u8>> {
        match self {
            Self::UploadFailed { pdf, .. } => Some(pdf.0),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_failed_keeps_pdf() {
        let err = ConverterError::upload_failed("a.pdf", "connection refused", b"%PDF".to_vec());
        assert_eq!(err.to_string(), "Failed to upload a.pdf: connection refused");
        assert!(format!("{:?}", err).contains("RenderedPdf(4 bytes)"));
        assert_eq!(err.into_rendered_pdf(), Some(b"%PDF".to_vec()));
    }

    #[test]
    fn test_process_error_is_transparent() {
        let err = ConverterError::from(ProcessError::Cancelled);
        assert_eq!(err.to_string(), "Process cancelled");
        assert!(err.is_cancelled());
        assert!(err.into_rendered_pdf().is_none());
    }
}
