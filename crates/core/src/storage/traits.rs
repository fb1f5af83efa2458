//! Trait definitions for the storage module.

use async_trait::async_trait;

use super::error::StorageError;
use super::types::StoredObject;

/// A blob store that rendered PDFs can be written to.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Returns the name of this store implementation.
    fn name(&self) -> &str;

    /// Writes `body` under `key`, returning where it ended up.
    async fn put(
        &self,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<StoredObject, StorageError>;
}
