//! Error types for the process module.

use thiserror::Error;

/// Errors that can occur while running an external process.
#[derive(Debug, Error)]
pub enum ProcessError {
    /// The command line had no program to run.
    #[error("Empty command line")]
    EmptyCommand,

    /// The program could not be started.
    #[error("Failed to launch {program}: {source}")]
    LaunchFailed {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The program ran but exited unsuccessfully.
    #[error("Process exited with code {code:?}")]
    ProcessFailed { code: Option<i32>, stderr: String },

    /// Execution was cancelled before or while the program ran.
    #[error("Process cancelled")]
    Cancelled,

    /// I/O error while waiting on the program.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ProcessError {
    /// Creates a new process failed error.
    pub fn process_failed(code: Option<i32>, stderr: impl Into<String>) -> Self {
        Self::ProcessFailed {
            code,
            stderr: stderr.into(),
        }
    }

    /// Captured stderr, if the process got far enough to produce any.
    pub fn stderr(&self) -> Option<&str> {
        match self {
            Self::ProcessFailed { stderr, .. } if !stderr.is_empty() => Some(stderr),
            _ => None,
        }
    }
}
