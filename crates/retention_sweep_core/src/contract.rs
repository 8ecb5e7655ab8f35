use chrono::{DateTime, TimeDelta, Utc};
use thiserror::Error;

pub const DEFAULT_PREFIX: &str = "chat_images/";
pub const RETENTION_DAYS: i64 = 30;
pub const BUCKET_ENV_VAR: &str = "RETENTION_BUCKET";
pub const BUCKET_PLACEHOLDER_MARKER: &str = "YOUR_";

const MIN_BUCKET_NAME_LEN: usize = 3;
const MAX_BUCKET_NAME_LEN: usize = 63;

/// A single object as reported by the storage backend's listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageObject {
    pub key: String,
    /// Backend-assigned creation instant. `None` when the listing omitted it.
    pub created_at: Option<DateTime<Utc>>,
}

impl StorageObject {
    pub fn new(key: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            key: key.into(),
            created_at: Some(created_at),
        }
    }
}

/// One page of a prefix enumeration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListPage {
    pub objects: Vec<StorageObject>,
    pub next_token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetentionConfig {
    bucket: String,
    prefix: String,
    retention_window: TimeDelta,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ValidationError {
    message: String,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

pub fn default_retention_window() -> TimeDelta {
    TimeDelta::days(RETENTION_DAYS)
}

impl RetentionConfig {
    pub fn new(
        bucket: impl Into<String>,
        prefix: impl Into<String>,
        retention_window: TimeDelta,
    ) -> Result<Self, ValidationError> {
        let bucket = bucket.into().trim().to_string();
        validate_bucket_name(&bucket)?;

        let prefix = prefix.into();
        if prefix.trim().is_empty() {
            return Err(ValidationError::new(
                "prefix cannot be empty; an empty prefix would sweep the whole bucket",
            ));
        }
        if prefix.starts_with('/') {
            return Err(ValidationError::new(format!(
                "prefix '{prefix}' must not start with '/'"
            )));
        }

        if retention_window <= TimeDelta::zero() {
            return Err(ValidationError::new(
                "retention_window must be a positive duration",
            ));
        }

        Ok(Self {
            bucket,
            prefix,
            retention_window,
        })
    }

    /// The deployed configuration: fixed prefix and window, operator-supplied bucket.
    pub fn chat_images(bucket: impl Into<String>) -> Result<Self, ValidationError> {
        Self::new(bucket, DEFAULT_PREFIX, default_retention_window())
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn retention_window(&self) -> TimeDelta {
        self.retention_window
    }
}

fn validate_bucket_name(bucket: &str) -> Result<(), ValidationError> {
    if bucket.is_empty() {
        return Err(ValidationError::new("bucket cannot be empty"));
    }

    if bucket.starts_with(BUCKET_PLACEHOLDER_MARKER) {
        return Err(ValidationError::new(format!(
            "bucket '{bucket}' is still a placeholder; set {BUCKET_ENV_VAR} before deploying"
        )));
    }

    if !(MIN_BUCKET_NAME_LEN..=MAX_BUCKET_NAME_LEN).contains(&bucket.len()) {
        return Err(ValidationError::new(format!(
            "bucket '{bucket}' must be between {MIN_BUCKET_NAME_LEN} and {MAX_BUCKET_NAME_LEN} characters"
        )));
    }

    let valid_chars = bucket
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '.' || c == '-');
    if !valid_chars {
        return Err(ValidationError::new(format!(
            "bucket '{bucket}' may only contain lowercase letters, digits, '.' and '-'"
        )));
    }

    let edges_alphanumeric = [bucket.chars().next(), bucket.chars().last()]
        .into_iter()
        .flatten()
        .all(|c| c.is_ascii_alphanumeric());
    if !edges_alphanumeric {
        return Err(ValidationError::new(format!(
            "bucket '{bucket}' must begin and end with a letter or digit"
        )));
    }

    Ok(())
}
