//! Configuration for the queue module.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the worker pool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Number of conversions that may run at once.
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,

    /// Jobs that may wait for a worker before submissions are rejected.
    #[serde(default = "default_max_queue_depth")]
    pub max_queue_depth: usize,

    /// Default per-job timeout in seconds, measured from submission.
    #[serde(default = "default_worker_timeout")]
    pub worker_timeout_secs: u64,

    /// How long shutdown lets workers drain before cancelling them.
    #[serde(default = "default_shutdown_grace")]
    pub shutdown_grace_secs: u64,
}

fn default_max_workers() -> usize {
    10
}

fn default_max_queue_depth() -> usize {
    50
}

fn default_worker_timeout() -> u64 {
    90
}

fn default_shutdown_grace() -> u64 {
    120
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_workers: default_max_workers(),
            max_queue_depth: default_max_queue_depth(),
            worker_timeout_secs: default_worker_timeout(),
            shutdown_grace_secs: default_shutdown_grace(),
        }
    }
}

impl PoolConfig {
    /// Creates a config with the given capacity.
    pub fn new(max_workers: usize, max_queue_depth: usize) -> Self {
        Self {
            max_workers,
            max_queue_depth,
            ..Default::default()
        }
    }

    /// Sets the default per-job timeout.
    pub fn with_worker_timeout_secs(mut self, secs: u64) -> Self {
        self.worker_timeout_secs = secs;
        self
    }

    /// Sets the shutdown grace period.
    pub fn with_shutdown_grace_secs(mut self, secs: u64) -> Self {
        self.shutdown_grace_secs = secs;
        self
    }

    /// Default per-job timeout.
    pub fn worker_timeout(&self) -> Duration {
        Duration::from_secs(self.worker_timeout_secs)
    }

    /// Shutdown grace period.
    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }

    /// Jobs that may be admitted at once (running plus queued).
    pub fn capacity(&self) -> usize {
        self.max_workers + self.max_queue_depth
    }
}
