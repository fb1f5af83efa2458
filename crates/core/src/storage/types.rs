//! Types for the storage module.

use serde::Serialize;

/// Reference to an object written to a store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredObject {
    /// Bucket the object was written to.
    pub bucket: String,
    /// Object key.
    pub key: String,
    /// Public location of the object.
    pub location: String,
    /// Object size in bytes.
    pub size_bytes: u64,
}
