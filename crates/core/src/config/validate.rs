use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Pool has at least one worker and a non-zero job timeout
/// - Renderer command is not blank
/// - Upload bucket and region are not blank, credentials come in pairs
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    // Pool validation
    if config.pool.max_workers == 0 {
        return Err(ConfigError::ValidationError(
            "pool.max_workers must be at least 1".to_string(),
        ));
    }
    if config.pool.worker_timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "pool.worker_timeout_secs cannot be 0".to_string(),
        ));
    }

    // Renderer validation
    if config.renderer.command.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "renderer.command cannot be empty".to_string(),
        ));
    }

    // Upload validation
    if let Some(upload) = &config.upload {
        if upload.bucket.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "upload.bucket cannot be empty".to_string(),
            ));
        }
        if upload.region.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "upload.region cannot be empty".to_string(),
            ));
        }
        if upload.access_key_id.is_some() != upload.secret_access_key.is_some() {
            return Err(ConfigError::ValidationError(
                "upload.access_key_id and upload.secret_access_key must be set together"
                    .to_string(),
            ));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::converter::RendererConfig;
    use crate::queue::PoolConfig;
    use crate::storage::UploadConfig;

    #[test]
    fn test_validate_default_config() {
        assert!(validate_config(&Config::default()).is_ok());
    }

    #[test]
    fn test_validate_zero_workers_fails() {
        let config = Config {
            pool: PoolConfig::new(0, 10),
            ..Default::default()
        };
        let result = validate_config(&config);
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_validate_zero_timeout_fails() {
        let config = Config {
            pool: PoolConfig::default().with_worker_timeout_secs(0),
            ..Default::default()
        };
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_zero_queue_depth_ok() {
        let config = Config {
            pool: PoolConfig::new(1, 0),
            ..Default::default()
        };
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validate_blank_command_fails() {
        let config = Config {
            renderer: RendererConfig::with_command("  "),
            ..Default::default()
        };
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_upload() {
        let mut config = Config {
            upload: Some(UploadConfig::new("pdfs")),
            ..Default::default()
        };
        assert!(validate_config(&config).is_ok());

        config.upload = Some(UploadConfig::new(""));
        assert!(validate_config(&config).is_err());

        config.upload = Some(UploadConfig::new("pdfs").with_region(""));
        assert!(validate_config(&config).is_err());

        let mut half = UploadConfig::new("pdfs");
        half.secret_access_key = Some("secret".to_string());
        config.upload = Some(half);
        assert!(validate_config(&config).is_err());
    }
}
