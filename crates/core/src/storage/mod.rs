//! Object storage for rendered PDFs.
//!
//! The `ObjectStore` trait is the seam the upload decorator writes through.
//! `S3Store` puts objects into an S3 (or S3-compatible) bucket.

mod config;
mod error;
mod s3;
mod traits;
mod types;

pub use config::UploadConfig;
pub use error::StorageError;
pub use s3::S3Store;
pub use traits::ObjectStore;
pub use types::StoredObject;
