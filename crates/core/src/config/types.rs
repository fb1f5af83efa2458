use serde::{Deserialize, Serialize};

use crate::converter::RendererConfig;
use crate::queue::PoolConfig;
use crate::storage::UploadConfig;

/// Main configuration struct
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub pool: PoolConfig,
    #[serde(default)]
    pub renderer: RendererConfig,
    /// Uploads are disabled when this section is absent.
    #[serde(default)]
    pub upload: Option<UploadConfig>,
}

/// Sanitized config for logging (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub pool: PoolConfig,
    pub renderer: RendererConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upload: Option<SanitizedUploadConfig>,
}

/// Sanitized upload config (credentials hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedUploadConfig {
    pub bucket: String,
    pub region: String,
    pub key_prefix: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_key_id: Option<String>,
    pub secret_access_key_configured: bool,
    pub public_read: bool,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            pool: config.pool.clone(),
            renderer: config.renderer.clone(),
            upload: config.upload.as_ref().map(|u| SanitizedUploadConfig {
                bucket: u.bucket.clone(),
                region: u.region.clone(),
                key_prefix: u.key_prefix.clone(),
                endpoint: u.endpoint.clone(),
                access_key_id: u.access_key_id.clone(),
                secret_access_key_configured: u
                    .secret_access_key
                    .as_ref()
                    .is_some_and(|s| !s.is_empty()),
                public_read: u.public_read,
            }),
        }
    }
}
