//! Mock process runner for testing.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::process::{ProcessError, ProcessRunner};

/// Mock implementation of the ProcessRunner trait.
///
/// Records every command line instead of launching it and returns a
/// configurable stdout payload.
#[derive(Debug, Clone)]
pub struct MockRunner {
    commands: Arc<RwLock<Vec<Vec<String>>>>,
    output: Arc<RwLock<Vec<u8>>>,
    next_error: Arc<RwLock<Option<ProcessError>>>,
}

impl Default for MockRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl MockRunner {
    /// Create a new mock runner that outputs a small PDF header.
    pub fn new() -> Self {
        Self {
            commands: Arc::new(RwLock::new(Vec::new())),
            output: Arc::new(RwLock::new(b"%PDF-1.4\n".to_vec())),
            next_error: Arc::new(RwLock::new(None)),
        }
    }

    /// Sets what the process writes to stdout.
    pub fn set_output(&self, output: Vec<u8>) {
        *self.output.write() = output;
    }

    /// Configure the next execution to fail with the given error.
    pub fn set_next_error(&self, error: ProcessError) {
        *self.next_error.write() = Some(error);
    }

    /// Get all recorded command lines.
    pub fn recorded_commands(&self) -> Vec<Vec<String>> {
        self.commands.read().clone()
    }
}

#[async_trait]
impl ProcessRunner for MockRunner {
    async fn execute(
        &self,
        args: &[String],
        cancel: &CancellationToken,
    ) -> Result<Vec<u8>, ProcessError> {
        if args.is_empty() {
            return Err(ProcessError::EmptyCommand);
        }
        if cancel.is_cancelled() {
            return Err(ProcessError::Cancelled);
        }

        self.commands.write().push(args.to_vec());

        if let Some(err) = self.next_error.write().take() {
            return Err(err);
        }
        Ok(self.output.read().clone())
    }
}
