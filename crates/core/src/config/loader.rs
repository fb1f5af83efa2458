use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use std::path::Path;

use super::{types::Config, ConfigError};

/// Prefix of environment variables that override file settings.
/// Nested keys are separated by `__`, e.g. `WEAVER_POOL__MAX_WORKERS=4`.
const ENV_PREFIX: &str = "WEAVER_";

fn env_provider() -> Env {
    // WEAVER_CONFIG names the file itself and is not a setting.
    Env::prefixed(ENV_PREFIX).ignore(&["CONFIG"]).split("__")
}

/// Load configuration from file with environment variable overrides
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.display().to_string()));
    }

    let config: Config = Figment::new()
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))?;

    Ok(config)
}

/// Load configuration from defaults and environment variables only
pub fn load_config_from_env() -> Result<Config, ConfigError> {
    Figment::from(Serialized::defaults(Config::default()))
        .merge(env_provider())
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))
}

/// Load configuration from TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))
}
