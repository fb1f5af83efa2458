//! S3 object store.

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::{Credentials, Region};
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::ObjectCannedAcl;
use aws_sdk_s3::Client;
use tracing::{debug, info};

use super::config::UploadConfig;
use super::error::StorageError;
use super::traits::ObjectStore;
use super::types::StoredObject;

/// Writes objects to an S3 or S3-compatible bucket.
#[derive(Clone)]
pub struct S3Store {
    client: Client,
    config: UploadConfig,
}

impl S3Store {
    /// Creates a store from configuration.
    ///
    /// Static credentials are used when both halves are configured; otherwise
    /// the default AWS credential chain applies.
    pub async fn new(config: UploadConfig) -> Result<Self, StorageError> {
        if config.bucket.trim().is_empty() {
            return Err(StorageError::InvalidConfig("bucket is empty".to_string()));
        }

        let region = Region::new(config.region.clone());
        let mut builder = match (&config.access_key_id, &config.secret_access_key) {
            (Some(id), Some(secret)) => {
                let credentials = Credentials::new(id, secret, None, None, "weaver-config");
                aws_sdk_s3::Config::builder()
                    .behavior_version(BehaviorVersion::latest())
                    .region(region)
                    .credentials_provider(credentials)
            }
            (None, None) => {
                let shared = aws_config::defaults(BehaviorVersion::latest())
                    .region(region)
                    .load()
                    .await;
                aws_sdk_s3::config::Builder::from(&shared)
            }
            _ => {
                return Err(StorageError::InvalidConfig(
                    "access_key_id and secret_access_key must be set together".to_string(),
                ))
            }
        };

        if let Some(endpoint) = &config.endpoint {
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }

        let client = Client::from_conf(builder.build());
        info!(
            "S3 store ready: bucket={} region={}",
            config.bucket, config.region
        );

        Ok(Self { client, config })
    }

    /// Get the bucket name.
    pub fn bucket(&self) -> &str {
        &self.config.bucket
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    fn name(&self) -> &str {
        "s3"
    }

    async fn put(
        &self,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<StoredObject, StorageError> {
        let size_bytes = body.len() as u64;
        let mut request = self
            .client
            .put_object()
            .bucket(&self.config.bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(body));
        if self.config.public_read {
            request = request.acl(ObjectCannedAcl::PublicRead);
        }

        request
            .send()
            .await
            .map_err(|e| StorageError::put_failed(key, DisplayErrorContext(&e).to_string()))?;

        debug!("Stored s3://{}/{} ({} bytes)", self.config.bucket, key, size_bytes);

        Ok(StoredObject {
            bucket: self.config.bucket.clone(),
            key: key.to_string(),
            location: self.config.object_location(key),
            size_bytes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_rejects_empty_bucket() {
        let result = S3Store::new(UploadConfig::new("  ")).await;
        assert!(matches!(result, Err(StorageError::InvalidConfig(_))));
    }

    #[tokio::test]
    async fn test_rejects_half_credentials() {
        let mut config = UploadConfig::new("pdfs");
        config.access_key_id = Some("AKIA".to_string());
        let result = S3Store::new(config).await;
        assert!(matches!(result, Err(StorageError::InvalidConfig(_))));
    }

    #[tokio::test]
    async fn test_static_credentials_with_endpoint() {
        let config = UploadConfig::new("pdfs")
            .with_endpoint("http://127.0.0.1:9000")
            .with_credentials("minio", "minio-secret");
        let store = S3Store::new(config).await.unwrap();
        assert_eq!(store.bucket(), "pdfs");
        assert_eq!(store.name(), "s3");
    }
}
