use async_trait::async_trait;
use retention_sweep_core::contract::ListPage;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("failed to list objects under '{prefix}': {message}")]
    List { prefix: String, message: String },

    #[error("failed to delete object '{key}': {message}")]
    Delete { key: String, message: String },
}

/// Storage backend seam. Implementations are bound to a single bucket.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Fetch one page of keys under `prefix`, resuming from `continuation`.
    async fn list_page(
        &self,
        prefix: &str,
        continuation: Option<String>,
    ) -> Result<ListPage, StoreError>;

    /// Deleting a key that no longer exists must succeed.
    async fn delete_object(&self, key: &str) -> Result<(), StoreError>;
}
