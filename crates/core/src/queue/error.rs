//! Error types for the queue module.

use serde::Serialize;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

use crate::converter::ConverterError;
use crate::process::ProcessError;

/// Errors a job can end with, or that reject it at submission.
#[derive(Debug, Error)]
pub enum JobError {
    /// Every worker is busy and the backlog is full.
    #[error("Queue is full")]
    QueueFull,

    /// The pool has stopped accepting or running jobs.
    #[error("Worker pool is shutting down")]
    ShuttingDown,

    /// The job did not finish before its deadline.
    #[error("Job timed out after {}s", timeout.as_secs_f64())]
    TimedOut { timeout: Duration },

    /// The conversion itself failed.
    #[error(transparent)]
    Conversion(#[from] ConverterError),
}

/// Flat failure classification used at the service boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    QueueFull,
    ShuttingDown,
    TimedOut,
    Cancelled,
    LaunchFailed,
    ProcessFailed,
    UploadFailed,
    Internal,
}

impl ErrorKind {
    /// HTTP status code a transport layer should answer with.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::QueueFull | Self::ShuttingDown | Self::Cancelled => 503,
            Self::TimedOut => 504,
            Self::UploadFailed => 502,
            Self::LaunchFailed | Self::ProcessFailed | Self::Internal => 500,
        }
    }

    /// Message safe to show to clients. Never includes renderer diagnostics.
    pub fn public_message(&self) -> &'static str {
        match self {
            Self::QueueFull => "server is busy, try again later",
            Self::ShuttingDown => "server is shutting down",
            Self::TimedOut => "conversion timed out",
            Self::Cancelled => "conversion was cancelled",
            Self::LaunchFailed => "renderer could not be started",
            Self::ProcessFailed => "conversion failed",
            Self::UploadFailed => "failed to upload converted document",
            Self::Internal => "internal error",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::QueueFull => "queue_full",
            Self::ShuttingDown => "shutting_down",
            Self::TimedOut => "timed_out",
            Self::Cancelled => "cancelled",
            Self::LaunchFailed => "launch_failed",
            Self::ProcessFailed => "process_failed",
            Self::UploadFailed => "upload_failed",
            Self::Internal => "internal",
        };
        f.write_str(name)
    }
}

impl JobError {
    /// Classifies the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::QueueFull => ErrorKind::QueueFull,
            Self::ShuttingDown => ErrorKind::ShuttingDown,
            Self::TimedOut { .. } => ErrorKind::TimedOut,
            Self::Conversion(e) => match e {
                ConverterError::Process(p) => match p {
                    ProcessError::Cancelled => ErrorKind::Cancelled,
                    ProcessError::EmptyCommand | ProcessError::LaunchFailed { .. } => {
                        ErrorKind::LaunchFailed
                    }
                    ProcessError::ProcessFailed { .. } => ErrorKind::ProcessFailed,
                    ProcessError::Io(_) => ErrorKind::Internal,
                },
                ConverterError::EmptyOutput => ErrorKind::ProcessFailed,
                ConverterError::InvalidCommand { .. } => ErrorKind::LaunchFailed,
                ConverterError::UploadFailed { .. } => ErrorKind::UploadFailed,
            },
        }
    }

    /// Whether this failure is unexpected and worth forwarding to an error
    /// tracker. Backpressure, shutdown and deadlines are normal operation.
    pub fn is_reportable(&self) -> bool {
        !matches!(
            self.kind(),
            ErrorKind::QueueFull
                | ErrorKind::ShuttingDown
                | ErrorKind::TimedOut
                | ErrorKind::Cancelled
        )
    }

    /// Full detail for logs and error trackers, including renderer stderr.
    pub fn diagnostics(&self) -> String {
        let mut out = self.to_string();
        let mut source = std::error::Error::source(self);
        while let Some(e) = source {
            // Transparent variants forward Display, so the cause may already be in the text.
            let cause = e.to_string();
            if !out.contains(&cause) {
                out.push_str(": ");
                out.push_str(&cause);
            }
            source = e.source();
        }
        if let Self::Conversion(ConverterError::Process(p)) = self {
            if let Some(stderr) = p.stderr() {
                out.push('\n');
                out.push_str(stderr);
            }
        }
        out
    }

    /// Takes back the rendered PDF when only the upload failed.
    pub fn into_rendered_pdf(self) -> Option<Vec<u8>> {
        match self {
            Self::Conversion(e) => e.into_rendered_pdf(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn process(err: ProcessError) -> JobError {
        JobError::Conversion(ConverterError::Process(err))
    }

    #[test]
    fn test_kind_mapping() {
        assert_eq!(JobError::QueueFull.kind(), ErrorKind::QueueFull);
        assert_eq!(JobError::ShuttingDown.kind(), ErrorKind::ShuttingDown);
        assert_eq!(
            JobError::TimedOut { timeout: Duration::from_secs(1) }.kind(),
            ErrorKind::TimedOut
        );
        assert_eq!(process(ProcessError::Cancelled).kind(), ErrorKind::Cancelled);
        assert_eq!(process(ProcessError::EmptyCommand).kind(), ErrorKind::LaunchFailed);
        assert_eq!(
            process(ProcessError::process_failed(Some(1), "")).kind(),
            ErrorKind::ProcessFailed
        );
        assert_eq!(
            JobError::Conversion(ConverterError::EmptyOutput).kind(),
            ErrorKind::ProcessFailed
        );
        assert_eq!(
            JobError::Conversion(ConverterError::upload_failed("k", "r", vec![])).kind(),
            ErrorKind::UploadFailed
        );
        assert_eq!(
            process(ProcessError::Io(std::io::Error::other("x"))).kind(),
            ErrorKind::Internal
        );
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(ErrorKind::QueueFull.status_code(), 503);
        assert_eq!(ErrorKind::ShuttingDown.status_code(), 503);
        assert_eq!(ErrorKind::TimedOut.status_code(), 504);
        assert_eq!(ErrorKind::Cancelled.status_code(), 503);
        assert_eq!(ErrorKind::LaunchFailed.status_code(), 500);
        assert_eq!(ErrorKind::ProcessFailed.status_code(), 500);
        assert_eq!(ErrorKind::UploadFailed.status_code(), 502);
        assert_eq!(ErrorKind::Internal.status_code(), 500);
    }

    #[test]
    fn test_diagnostics_names_launch_cause_once() {
        let err = process(ProcessError::LaunchFailed {
            program: "athenapdf".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "No such file or directory"),
        });
        let diagnostics = err.diagnostics();
        assert_eq!(
            diagnostics,
            "Failed to launch athenapdf: No such file or directory"
        );
        assert_eq!(diagnostics.matches("No such file").count(), 1);
    }

    #[test]
    fn test_public_message_hides_stderr() {
        let err = process(ProcessError::process_failed(Some(1), "secret path /srv/x"));
        assert!(!err.kind().public_message().contains("/srv/x"));
        assert!(err.diagnostics().contains("/srv/x"));
        assert!(err.is_reportable());
    }

    #[test]
    fn test_expected_failures_not_reportable() {
        assert!(!JobError::QueueFull.is_reportable());
        assert!(!JobError::TimedOut { timeout: Duration::from_secs(90) }.is_reportable());
        assert!(!process(ProcessError::Cancelled).is_reportable());
    }

    #[test]
    fn test_timed_out_message() {
        let err = JobError::TimedOut { timeout: Duration::from_millis(1500) };
        assert_eq!(err.to_string(), "Job timed out after 1.5s");
    }
}
