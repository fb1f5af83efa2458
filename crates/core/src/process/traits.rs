//! Trait definitions for the process module.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::error::ProcessError;

/// Runs a command line and returns what it wrote to stdout.
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    /// Executes `args[0]` with the remaining arguments.
    ///
    /// When `cancel` fires before the process exits, the process and every
    /// helper it spawned are terminated and `ProcessError::Cancelled` is
    /// returned.
    async fn execute(
        &self,
        args: &[String],
        cancel: &CancellationToken,
    ) -> Result<Vec<u8>, ProcessError>;
}
