//! Mock object store for testing.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::storage::{ObjectStore, StorageError, StoredObject};

/// A recorded put for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedPut {
    pub key: String,
    pub body: Vec<u8>,
    pub content_type: String,
}

/// In-memory implementation of the ObjectStore trait.
#[derive(Debug, Clone)]
pub struct MockObjectStore {
    bucket: String,
    puts: Arc<RwLock<Vec<RecordedPut>>>,
    unreachable: Arc<AtomicBool>,
}

impl MockObjectStore {
    /// Create a new store for `bucket`.
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            puts: Arc::new(RwLock::new(Vec::new())),
            unreachable: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Makes every put fail as if the store could not be reached.
    pub fn set_unreachable(&self, unreachable: bool) {
        self.unreachable.store(unreachable, Ordering::SeqCst);
    }

    /// Get all successful puts.
    pub fn recorded_puts(&self) -> Vec<RecordedPut> {
        self.puts.read().clone()
    }
}

#[async_trait]
impl ObjectStore for MockObjectStore {
    fn name(&self) -> &str {
        "mock"
    }

    async fn put(
        &self,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<StoredObject, StorageError> {
        if self.unreachable.load(Ordering::SeqCst) {
            return Err(StorageError::put_failed(key, "connection refused"));
        }

        let size_bytes = body.len() as u64;
        self.puts.write().push(RecordedPut {
            key: key.to_string(),
            body,
            content_type: content_type.to_string(),
        });

        Ok(StoredObject {
            bucket: self.bucket.clone(),
            key: key.to_string(),
            location: format!("mock://{}/{}", self.bucket, key),
            size_bytes,
        })
    }
}
