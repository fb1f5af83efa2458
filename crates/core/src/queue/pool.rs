//! Fixed-size worker pool over a bounded FIFO backlog.

use chrono::{DateTime, Utc};
use futures::future::join_all;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{self, sleep_until, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::converter::{ConversionRequest, Converter};

use super::config::PoolConfig;
use super::error::JobError;
use super::types::{JobHandle, JobId, JobOutcome, JobState, PoolStatus};

/// Deadline used when `submitted_at + timeout` does not fit in an `Instant`.
const FAR_FUTURE: Duration = Duration::from_secs(86400 * 365 * 30);

/// A job admitted to the backlog.
struct QueuedJob {
    id: JobId,
    request: ConversionRequest,
    timeout: Duration,
    deadline: Instant,
    reply: oneshot::Sender<JobOutcome>,
}

#[derive(Default)]
struct PoolStats {
    /// Admitted jobs that have not had their outcome sent yet.
    in_flight: AtomicUsize,
    queued: AtomicUsize,
    running: AtomicUsize,
    completed: AtomicU64,
    failed: AtomicU64,
    timed_out: AtomicU64,
    rejected: AtomicU64,
}

struct Shared<C> {
    config: PoolConfig,
    converter: C,
    /// `None` once shutdown has begun.
    sender: Mutex<Option<mpsc::UnboundedSender<QueuedJob>>>,
    /// Workers take jobs one at a time in submission order.
    receiver: tokio::sync::Mutex<mpsc::UnboundedReceiver<QueuedJob>>,
    stats: PoolStats,
    /// Cancels running jobs once the shutdown grace period is over.
    abort: CancellationToken,
    next_id: AtomicU64,
    started_at: DateTime<Utc>,
}

/// Runs conversions on a fixed number of workers.
///
/// At most `max_workers` jobs run and at most `max_queue_depth` wait; further
/// submissions are rejected with [`JobError::QueueFull`].
pub struct WorkerPool<C: Converter + 'static> {
    shared: Arc<Shared<C>>,
    workers: tokio::sync::Mutex<Vec<JoinHandle<()>>>,
}

impl<C: Converter + 'static> WorkerPool<C> {
    /// Creates the pool and spawns its workers. Must be called within a tokio runtime.
    ///
    /// A `max_workers` of zero is raised to one, and capacity and status
    /// report the worker count actually running.
    pub fn start(mut config: PoolConfig, converter: C) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        if config.max_workers == 0 {
            warn!("Worker pool configured with 0 workers, starting 1");
            config.max_workers = 1;
        }
        let worker_count = config.max_workers;

        let shared = Arc::new(Shared {
            config,
            converter,
            sender: Mutex::new(Some(sender)),
            receiver: tokio::sync::Mutex::new(receiver),
            stats: PoolStats::default(),
            abort: CancellationToken::new(),
            next_id: AtomicU64::new(1),
            started_at: Utc::now(),
        });

        let workers = (0..worker_count)
            .map(|worker| tokio::spawn(Self::worker_loop(Arc::clone(&shared), worker)))
            .collect();

        info!(
            "Worker pool started: {} workers, queue depth {}, converter {}",
            worker_count,
            shared.config.max_queue_depth,
            shared.converter.name()
        );

        Self {
            shared,
            workers: tokio::sync::Mutex::new(workers),
        }
    }

    /// Submits a job with the configured default timeout.
    pub fn submit_with_default_timeout(
        &self,
        request: ConversionRequest,
    ) -> Result<JobHandle, JobError> {
        self.submit(request, self.shared.config.worker_timeout())
    }

    /// Submits a job. Never waits for a worker.
    ///
    /// The job's deadline is `timeout` from now, whether it spends that time
    /// queued or running.
    pub fn submit(
        &self,
        request: ConversionRequest,
        timeout: Duration,
    ) -> Result<JobHandle, JobError> {
        let stats = &self.shared.stats;
        let sender = self.shared.sender.lock();
        let Some(tx) = sender.as_ref() else {
            stats.rejected.fetch_add(1, Ordering::Relaxed);
            debug!("Rejected {}: pool is shutting down", request.source);
            return Err(JobError::ShuttingDown);
        };

        let deadline = deadline_after(timeout);
        let capacity = self.shared.config.capacity();
        let admitted = stats
            .in_flight
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| {
                (n < capacity).then_some(n + 1)
            })
            .is_ok();
        if !admitted {
            stats.rejected.fetch_add(1, Ordering::Relaxed);
            warn!(
                "Rejected {}: queue full ({} running, {} queued)",
                request.source,
                stats.running.load(Ordering::Relaxed),
                stats.queued.load(Ordering::Relaxed)
            );
            return Err(JobError::QueueFull);
        }

        let id = JobId(self.shared.next_id.fetch_add(1, Ordering::Relaxed));
        let (reply, rx) = oneshot::channel();
        let job = QueuedJob {
            id,
            request,
            timeout,
            deadline,
            reply,
        };

        stats.queued.fetch_add(1, Ordering::SeqCst);
        if tx.send(job).is_err() {
            stats.queued.fetch_sub(1, Ordering::SeqCst);
            stats.in_flight.fetch_sub(1, Ordering::SeqCst);
            error!("Backlog closed while pool was accepting");
            return Err(JobError::ShuttingDown);
        }

        debug!("{}: {}", id, JobState::Queued);
        Ok(JobHandle::new(id, rx))
    }

    /// Stops admitting jobs and waits for the workers to exit.
    ///
    /// Queued jobs keep running for up to `shutdown_grace`. After that, running
    /// jobs are cancelled and jobs still queued end with
    /// [`JobError::ShuttingDown`].
    pub async fn shutdown(&self) {
        self.shutdown_within(self.shared.config.shutdown_grace()).await
    }

    /// Like [`shutdown`](Self::shutdown) with an explicit grace period.
    /// A zero grace cancels running jobs right away.
    ///
    /// Concurrent callers all return only once every worker has exited.
    pub async fn shutdown_within(&self, grace: Duration) {
        if self.shared.sender.lock().take().is_none() {
            debug!("Worker pool already shutting down");
        }
        if grace.is_zero() {
            self.shared.abort.cancel();
        }

        // Held until the workers are joined; later callers wait here.
        let mut workers = self.workers.lock().await;
        // Handles a dropped earlier call already drove to completion.
        workers.retain(|handle| !handle.is_finished());
        if workers.is_empty() {
            return;
        }

        info!(
            "Shutting down worker pool: {} running, {} queued",
            self.running(),
            self.queue_depth()
        );

        {
            let all = join_all(workers.iter_mut());
            tokio::pin!(all);
            if time::timeout(grace, &mut all).await.is_err() {
                warn!(
                    "Workers still busy after {}s, cancelling remaining jobs",
                    grace.as_secs_f64()
                );
                self.shared.abort.cancel();
                all.await;
            }
        }
        workers.clear();

        info!("Worker pool stopped");
    }

    /// Snapshot of queue occupancy and lifetime counters.
    pub fn status(&self) -> PoolStatus {
        let stats = &self.shared.stats;
        PoolStatus {
            max_workers: self.shared.config.max_workers,
            max_queue_depth: self.shared.config.max_queue_depth,
            started_at: self.shared.started_at,
            queued: stats.queued.load(Ordering::SeqCst),
            running: stats.running.load(Ordering::SeqCst),
            accepting: self.shared.sender.lock().is_some(),
            completed: stats.completed.load(Ordering::Relaxed),
            failed: stats.failed.load(Ordering::Relaxed),
            timed_out: stats.timed_out.load(Ordering::Relaxed),
            rejected: stats.rejected.load(Ordering::Relaxed),
        }
    }

    /// Jobs waiting for a worker.
    pub fn queue_depth(&self) -> usize {
        self.shared.stats.queued.load(Ordering::SeqCst)
    }

    /// Jobs currently being converted.
    pub fn running(&self) -> usize {
        self.shared.stats.running.load(Ordering::SeqCst)
    }

    async fn worker_loop(shared: Arc<Shared<C>>, worker: usize) {
        debug!("Worker {} started", worker);
        loop {
            let job = {
                let mut receiver = shared.receiver.lock().await;
                receiver.recv().await
            };
            let Some(job) = job else {
                break;
            };

            let stats = &shared.stats;
            stats.queued.fetch_sub(1, Ordering::SeqCst);
            stats.running.fetch_add(1, Ordering::SeqCst);
            debug!("{}: {} on worker {}", job.id, JobState::Running, worker);

            let QueuedJob {
                id,
                request,
                timeout,
                deadline,
                reply,
            } = job;
            let outcome = Self::run_job(&shared, id, &request, timeout, deadline).await;

            let state = JobState::for_outcome(&outcome);
            match state {
                JobState::Completed => stats.completed.fetch_add(1, Ordering::Relaxed),
                JobState::TimedOut => stats.timed_out.fetch_add(1, Ordering::Relaxed),
                _ => stats.failed.fetch_add(1, Ordering::Relaxed),
            };
            if let Err(e) = &outcome {
                if e.is_reportable() {
                    error!("{} failed: {}", id, e.diagnostics());
                }
            }

            // Free the slot before delivering so a submitter that reacts to
            // the outcome can be admitted again.
            stats.running.fetch_sub(1, Ordering::SeqCst);
            stats.in_flight.fetch_sub(1, Ordering::SeqCst);
            debug!("{}: {}", id, state);

            if reply.send(outcome).is_err() {
                debug!("{}: submitter went away, outcome discarded", id);
            }
            // Staged sources are removed here, after delivery.
            drop(request);
        }
        debug!("Worker {} stopped", worker);
    }

    async fn run_job(
        shared: &Shared<C>,
        id: JobId,
        request: &ConversionRequest,
        timeout: Duration,
        deadline: Instant,
    ) -> JobOutcome {
        if shared.abort.is_cancelled() {
            return Err(JobError::ShuttingDown);
        }
        if Instant::now() >= deadline {
            warn!("{} expired in the queue after {}s", id, timeout.as_secs_f64());
            return Err(JobError::TimedOut { timeout });
        }

        let cancel = shared.abort.child_token();
        let convert = shared.converter.convert(request, &cancel);
        tokio::pin!(convert);

        tokio::select! {
            biased;
            result = &mut convert => result.map_err(JobError::from),
            _ = sleep_until(deadline) => {
                warn!("{} timed out after {}s, cancelling", id, timeout.as_secs_f64());
                cancel.cancel();
                // Wait for the renderer to be torn down before reporting.
                let _ = convert.await;
                Err(JobError::TimedOut { timeout })
            }
        }
    }
}

fn deadline_after(timeout: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(timeout).unwrap_or_else(|| now + FAR_FUTURE)
}

impl<C: Converter + 'static> Drop for WorkerPool<C> {
    fn drop(&mut self) {
        // Without this the workers would wait on the backlog forever.
        self.shared.sender.lock().take();
        self.shared.abort.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures::url_request;
    use crate::testing::MockConverter;

    #[tokio::test]
    async fn test_submit_and_wait() {
        let converter = MockConverter::new();
        let pool = WorkerPool::start(PoolConfig::new(2, 2), converter.clone());

        let handle = pool.submit_with_default_timeout(url_request("a")).unwrap();
        assert_eq!(handle.id(), JobId(1));
        let output = handle.wait().await.unwrap();
        assert_eq!(output.as_pdf(), Some(&b"%PDF-mock https://example.com/a"[..]));

        pool.shutdown().await;
        assert_eq!(pool.status().completed, 1);
    }

    #[tokio::test]
    async fn test_submit_after_shutdown_rejected() {
        let pool = WorkerPool::start(PoolConfig::new(1, 1), MockConverter::new());
        pool.shutdown().await;

        let result = pool.submit_with_default_timeout(url_request("late"));
        assert!(matches!(result, Err(JobError::ShuttingDown)));
        let status = pool.status();
        assert!(!status.accepting);
        assert_eq!(status.rejected, 1);
    }

    #[tokio::test]
    async fn test_shutdown_within_zero_cancels_running() {
        let converter = MockConverter::new().hanging();
        let pool = WorkerPool::start(PoolConfig::new(1, 1), converter.clone());

        let running = pool.submit_with_default_timeout(url_request("a")).unwrap();
        let queued = pool.submit_with_default_timeout(url_request("b")).unwrap();
        while converter.started_count() == 0 {
            tokio::task::yield_now().await;
        }

        pool.shutdown_within(Duration::ZERO).await;

        let err = running.wait().await.unwrap_err();
        assert!(matches!(err, JobError::Conversion(ref e) if e.is_cancelled()));
        assert!(matches!(queued.wait().await, Err(JobError::ShuttingDown)));
        assert_eq!(converter.started_count(), 1);
    }

    #[tokio::test]
    async fn test_shutdown_twice_is_noop() {
        let pool = WorkerPool::start(PoolConfig::new(1, 0), MockConverter::new());
        pool.shutdown().await;
        pool.shutdown().await;
    }

    #[tokio::test]
    async fn test_grace_expiry_cancels_running_and_drops_queued() {
        let converter = MockConverter::new().hanging();
        let pool = WorkerPool::start(PoolConfig::new(1, 1), converter.clone());

        let running = pool.submit_with_default_timeout(url_request("a")).unwrap();
        let queued = pool.submit_with_default_timeout(url_request("b")).unwrap();
        while converter.started_count() == 0 {
            tokio::task::yield_now().await;
        }

        pool.shutdown_within(Duration::from_millis(50)).await;

        let err = running.wait().await.unwrap_err();
        assert_eq!(err.kind(), crate::queue::ErrorKind::Cancelled);
        assert!(matches!(queued.wait().await, Err(JobError::ShuttingDown)));
        assert_eq!(converter.started_count(), 1);
        assert_eq!(pool.running(), 0);
    }

    #[tokio::test]
    async fn test_concurrent_shutdown_waits_for_workers() {
        let converter = MockConverter::new().with_delay(Duration::from_millis(300));
        let pool = Arc::new(WorkerPool::start(PoolConfig::new(1, 0), converter.clone()));

        let handle = pool.submit_with_default_timeout(url_request("slow")).unwrap();
        while converter.started_count() == 0 {
            tokio::task::yield_now().await;
        }

        let first = tokio::spawn({
            let pool = Arc::clone(&pool);
            async move { pool.shutdown().await }
        });
        tokio::time::sleep(Duration::from_millis(20)).await;
        pool.shutdown().await;

        assert_eq!(pool.running(), 0);
        assert_eq!(converter.completed_count(), 1);
        first.await.unwrap();
        assert!(handle.wait().await.is_ok());
    }

    #[tokio::test]
    async fn test_zero_workers_runs_one_and_reports_it() {
        let converter = MockConverter::new().hanging();
        let pool = WorkerPool::start(PoolConfig::new(0, 2), converter.clone());

        let status = pool.status();
        assert_eq!(status.max_workers, 1);
        assert_eq!(status.max_queue_depth, 2);

        let _handles: Vec<_> = (0..3)
            .map(|i| {
                pool.submit_with_default_timeout(url_request(&format!("job{}", i)))
                    .unwrap()
            })
            .collect();
        assert!(matches!(
            pool.submit_with_default_timeout(url_request("over")),
            Err(JobError::QueueFull)
        ));
        while converter.started_count() == 0 {
            tokio::task::yield_now().await;
        }
        assert_eq!(pool.running(), 1);

        pool.shutdown_within(Duration::ZERO).await;
    }

    #[tokio::test]
    async fn test_huge_timeout_is_accepted() {
        let converter = MockConverter::new();
        let pool = WorkerPool::start(PoolConfig::new(1, 0), converter.clone());

        let handle = pool
            .submit(url_request("patient"), Duration::from_secs(u64::MAX))
            .unwrap();
        assert!(handle.wait().await.is_ok());

        // The slot was released, so the pool keeps admitting.
        let handle = pool.submit(url_request("again"), Duration::MAX).unwrap();
        assert!(handle.wait().await.is_ok());

        pool.shutdown().await;
        assert_eq!(pool.status().completed, 2);
    }

    #[test]
    fn test_deadline_after_clamps_overflow() {
        let now = Instant::now();
        assert!(deadline_after(Duration::MAX) > now + Duration::from_secs(86400 * 365));
        let short = deadline_after(Duration::from_secs(5));
        assert!(short >= now + Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_expired_job_never_starts() {
        let converter = MockConverter::new();
        let pool = WorkerPool::start(PoolConfig::new(1, 1), converter.clone());

        let handle = pool.submit(url_request("expired"), Duration::ZERO).unwrap();
        let result = handle.wait().await;
        assert!(matches!(result, Err(JobError::TimedOut { .. })));
        assert_eq!(converter.started_count(), 0);

        pool.shutdown().await;
        assert_eq!(pool.status().timed_out, 1);
    }

    #[tokio::test]
    async fn test_conversion_error_delivered() {
        let converter = MockConverter::new();
        converter.set_next_error(crate::converter::ConverterError::EmptyOutput);
        let pool = WorkerPool::start(PoolConfig::new(1, 0), converter);

        let result = pool
            .submit_with_default_timeout(url_request("empty"))
            .unwrap()
            .wait()
            .await;
        let err = result.unwrap_err();
        assert_eq!(err.kind(), crate::queue::ErrorKind::ProcessFailed);

        pool.shutdown().await;
        assert_eq!(pool.status().failed, 1);
    }
}
