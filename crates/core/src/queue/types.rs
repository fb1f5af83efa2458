//! Types for the queue module.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use tokio::sync::oneshot;

use crate::converter::ConversionOutput;

use super::error::JobError;

/// Result delivered for every admitted job.
pub type JobOutcome = Result<ConversionOutput, JobError>;

/// Identifier assigned to a job at submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct JobId(pub u64);

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "job-{}", self.0)
    }
}

/// Lifecycle of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Queued,
    Running,
    Completed,
    Failed,
    TimedOut,
    Rejected,
}

impl JobState {
    /// State a job ends in for the given outcome.
    pub fn for_outcome(outcome: &JobOutcome) -> Self {
        match outcome {
            Ok(_) => Self::Completed,
            Err(JobError::TimedOut { .. }) => Self::TimedOut,
            Err(JobError::QueueFull) => Self::Rejected,
            Err(_) => Self::Failed,
        }
    }

    /// Whether the job can no longer change state.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Queued | Self::Running)
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Queued => "queued",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::TimedOut => "timed_out",
            Self::Rejected => "rejected",
        };
        f.write_str(name)
    }
}

/// The submitter's side of a job: waits for its single outcome.
///
/// Dropping the handle does not cancel the job; its outcome is discarded.
#[derive(Debug)]
pub struct JobHandle {
    id: JobId,
    rx: oneshot::Receiver<JobOutcome>,
}

impl JobHandle {
    pub(crate) fn new(id: JobId, rx: oneshot::Receiver<JobOutcome>) -> Self {
        Self { id, rx }
    }

    /// The job's identifier.
    pub fn id(&self) -> JobId {
        self.id
    }

    /// Waits for the job's outcome.
    pub async fn wait(self) -> JobOutcome {
        // The sender only disappears without a value if the pool was torn down.
        self.rx.await.unwrap_or(Err(JobError::ShuttingDown))
    }
}

/// Point-in-time view of the pool for samplers and stats endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PoolStatus {
    pub max_workers: usize,
    pub max_queue_depth: usize,
    pub started_at: DateTime<Utc>,
    /// Jobs waiting for a worker.
    pub queued: usize,
    /// Jobs currently being converted.
    pub running: usize,
    /// Whether new submissions are admitted.
    pub accepting: bool,
    pub completed: u64,
    pub failed: u64,
    pub timed_out: u64,
    pub rejected: u64,
}
