//! Mock converter for testing.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::converter::{ConversionOutput, ConversionRequest, Converter, ConverterError};
use crate::process::ProcessError;

/// How long a mock conversion takes.
#[derive(Debug, Clone, Copy)]
enum Pace {
    Immediate,
    Delay(Duration),
    /// Runs until cancelled.
    Hang,
}

/// Mock implementation of the Converter trait.
///
/// Provides controllable behavior for testing:
/// - Record the order in which conversions start
/// - Simulate slow or never-ending renders
/// - Honour the cancellation token like a real renderer
/// - Simulate failures
///
/// Clones share state, so a test can keep a handle after giving one to a pool.
///
/// # Example
///
/// ```rust,ignore
/// use weaver_core::testing::MockConverter;
///
/// let converter = MockConverter::new().with_delay(Duration::from_millis(50));
/// let pool = WorkerPool::start(PoolConfig::default(), converter.clone());
///
/// // ... submit jobs ...
///
/// assert_eq!(converter.started_sources(), vec!["https://a", "https://b"]);
/// ```
#[derive(Debug, Clone)]
pub struct MockConverter {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    pace: RwLock<Pace>,
    output: RwLock<Option<Vec<u8>>>,
    next_error: RwLock<Option<ConverterError>>,
    started: RwLock<Vec<String>>,
    active: AtomicUsize,
    max_active: AtomicUsize,
    completed: AtomicUsize,
    cancelled: AtomicUsize,
}

impl Default for MockConverter {
    fn default() -> Self {
        Self::new()
    }
}

impl MockConverter {
    /// Create a new mock converter that finishes immediately.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                pace: RwLock::new(Pace::Immediate),
                output: RwLock::new(None),
                next_error: RwLock::new(None),
                started: RwLock::new(Vec::new()),
                active: AtomicUsize::new(0),
                max_active: AtomicUsize::new(0),
                completed: AtomicUsize::new(0),
                cancelled: AtomicUsize::new(0),
            }),
        }
    }

    /// Makes every conversion take `delay`.
    pub fn with_delay(self, delay: Duration) -> Self {
        *self.inner.pace.write() = Pace::Delay(delay);
        self
    }

    /// Makes every conversion run until it is cancelled.
    pub fn hanging(self) -> Self {
        *self.inner.pace.write() = Pace::Hang;
        self
    }

    /// Returns `output` from every conversion instead of a per-source PDF.
    pub fn with_output(self, output: Vec<u8>) -> Self {
        *self.inner.output.write() = Some(output);
        self
    }

    /// Configure the next conversion to fail with the given error.
    pub fn set_next_error(&self, error: ConverterError) {
        *self.inner.next_error.write() = Some(error);
    }

    /// Source locators in the order conversions started.
    pub fn started_sources(&self) -> Vec<String> {
        self.inner.started.read().clone()
    }

    /// Number of conversions started.
    pub fn started_count(&self) -> usize {
        self.inner.started.read().len()
    }

    /// Number of conversions that ran to completion.
    pub fn completed_count(&self) -> usize {
        self.inner.completed.load(Ordering::SeqCst)
    }

    /// Number of conversions stopped by their cancellation token.
    pub fn cancelled_count(&self) -> usize {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// Highest number of conversions that were running at the same time.
    pub fn max_concurrent(&self) -> usize {
        self.inner.max_active.load(Ordering::SeqCst)
    }

    fn pdf_for(&self, request: &ConversionRequest) -> Vec<u8> {
        match &*self.inner.output.read() {
            Some(output) => output.clone(),
            None => format!("%PDF-mock {}", request.source.locator()).into_bytes(),
        }
    }
}

/// Decrements the active count on every exit path.
struct ActiveGuard<'a>(&'a AtomicUsize);

impl Drop for ActiveGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl Converter for MockConverter {
    fn name(&self) -> &str {
        "mock"
    }

    async fn convert(
        &self,
        request: &ConversionRequest,
        cancel: &CancellationToken,
    ) -> Result<ConversionOutput, ConverterError> {
        self.inner.started.write().push(request.source.locator());
        let active = self.inner.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.inner.max_active.fetch_max(active, Ordering::SeqCst);
        let _guard = ActiveGuard(&self.inner.active);

        if let Some(err) = self.inner.next_error.write().take() {
            return Err(err);
        }

        let pace = *self.inner.pace.read();
        let finished = match pace {
            Pace::Immediate => true,
            Pace::Delay(delay) => tokio::select! {
                _ = tokio::time::sleep(delay) => true,
                _ = cancel.cancelled() => false,
            },
            Pace::Hang => {
                cancel.cancelled().await;
                false
            }
        };

        if !finished {
            self.inner.cancelled.fetch_add(1, Ordering::SeqCst);
            return Err(ProcessError::Cancelled.into());
        }

        self.inner.completed.fetch_add(1, Ordering::SeqCst);
        Ok(ConversionOutput::Pdf(self.pdf_for(request)))
    }
}
