//! Process runner for external renderers.
//!
//! This module provides the `ProcessRunner` trait and `CommandRunner`, which
//! launches a command line in its own process group, collects its stdout, and
//! tears the whole group down when the caller's cancellation token fires.
//!
//! # Example
//!
//! ```ignore
//! use tokio_util::sync::CancellationToken;
//! use weaver_core::process::{CommandRunner, ProcessRunner};
//!
//! let runner = CommandRunner::with_defaults();
//! let cancel = CancellationToken::new();
//!
//! let args = vec!["athenapdf".to_string(), "-S".to_string(), "https://example.com".to_string()];
//! let pdf = runner.execute(&args, &cancel).await?;
//! println!("Rendered {} bytes", pdf.len());
//! ```

mod command;
mod error;
mod traits;

pub use command::CommandRunner;
pub use error::ProcessError;
pub use traits::ProcessRunner;
