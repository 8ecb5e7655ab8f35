use retention_sweep_core::contract::{RetentionConfig, ValidationError, BUCKET_ENV_VAR};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("RETENTION_BUCKET must be configured")]
    MissingBucket,

    #[error("invalid retention configuration: {0}")]
    Invalid(#[from] ValidationError),
}

/// Resolves the deployed configuration from `lookup`. Prefix and retention
/// window are fixed; only the bucket comes from the deployment.
pub fn load_config(
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<RetentionConfig, ConfigError> {
    let bucket = lookup(BUCKET_ENV_VAR).ok_or(ConfigError::MissingBucket)?;
    Ok(RetentionConfig::chat_images(bucket)?)
}

pub fn load_config_from_env() -> Result<RetentionConfig, ConfigError> {
    load_config(|name| std::env::var(name).ok())
}
