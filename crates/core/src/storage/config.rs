//! Configuration for the storage module.

use serde::{Deserialize, Serialize};

/// Where rendered PDFs are uploaded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    /// Target bucket.
    pub bucket: String,

    /// Bucket region.
    #[serde(default = "default_region")]
    pub region: String,

    /// Prefix for generated object keys.
    #[serde(default)]
    pub key_prefix: String,

    /// Custom endpoint for S3-compatible services (MinIO, R2, ...).
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Access key ID. The default AWS credential chain is used when unset.
    #[serde(default)]
    pub access_key_id: Option<String>,

    /// Secret access key.
    #[serde(default)]
    pub secret_access_key: Option<String>,

    /// Whether uploaded objects are world-readable.
    #[serde(default = "default_public_read")]
    pub public_read: bool,
}

fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_public_read() -> bool {
    true
}

impl UploadConfig {
    /// Creates a config for `bucket` with default settings.
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            region: default_region(),
            key_prefix: String::new(),
            endpoint: None,
            access_key_id: None,
            secret_access_key: None,
            public_read: default_public_read(),
        }
    }

    /// Sets the region.
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    /// Sets the key prefix.
    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    /// Sets a custom endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Sets static credentials.
    pub fn with_credentials(
        mut self,
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
    ) -> Self {
        self.access_key_id = Some(access_key_id.into());
        self.secret_access_key = Some(secret_access_key.into());
        self
    }

    /// Public URL of an object in this bucket.
    pub fn object_location(&self, key: &str) -> String {
        match &self.endpoint {
            Some(endpoint) => format!(
                "{}/{}/{}",
                endpoint.trim_end_matches('/'),
                self.bucket,
                key
            ),
            None => format!(
                "https://{}.s3.{}.amazonaws.com/{}",
                self.bucket, self.region, key
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config: UploadConfig = toml::from_str(r#"bucket = "pdfs""#).unwrap();
        assert_eq!(config.bucket, "pdfs");
        assert_eq!(config.region, "us-east-1");
        assert!(config.key_prefix.is_empty());
        assert!(config.public_read);
        assert!(config.access_key_id.is_none());
    }

    #[test]
    fn test_aws_location() {
        let config = UploadConfig::new("pdfs").with_region("eu-west-1");
        assert_eq!(
            config.object_location("a/b.pdf"),
            "https://pdfs.s3.eu-west-1.amazonaws.com/a/b.pdf"
        );
    }

    #[test]
    fn test_custom_endpoint_location() {
        let config = UploadConfig::new("pdfs").with_endpoint("http://localhost:9000/");
        assert_eq!(
            config.object_location("x.pdf"),
            "http://localhost:9000/pdfs/x.pdf"
        );
    }
}
