//! Conversion job queue and worker pool.
//!
//! `WorkerPool` runs a fixed number of workers over a bounded FIFO backlog.
//! Submission is synchronous and never waits for a worker: a job is either
//! admitted and handed back as a `JobHandle`, or rejected with `QueueFull`.
//! Each admitted job gets a deadline measured from submission and exactly one
//! outcome on its private channel.
//!
//! # Example
//!
//! ```ignore
//! use weaver_core::converter::{AthenaConverter, ConversionRequest, RendererConfig};
//! use weaver_core::queue::{PoolConfig, WorkerPool};
//!
//! let converter = AthenaConverter::new(RendererConfig::default());
//! let pool = WorkerPool::start(PoolConfig::default(), converter);
//!
//! let request = ConversionRequest::from_url("https://example.com");
//! let handle = pool.submit_with_default_timeout(request)?;
//! let pdf = handle.wait().await?;
//!
//! pool.shutdown().await;
//! ```

mod config;
mod error;
mod pool;
mod types;

pub use config::PoolConfig;
pub use error::{ErrorKind, JobError};
pub use pool::WorkerPool;
pub use types::{JobHandle, JobId, JobOutcome, JobState, PoolStatus};
