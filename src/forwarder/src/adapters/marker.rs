use super::error::AdapterResult;
use crate::types::Watermark;
use async_trait::async_trait;

/// Durable home of the per-stream watermark.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MarkerStore: Send + Sync {
    /// Returns `None` if no watermark was ever recorded under `key`.
    async fn get(&self, key: &str) -> AdapterResult<Option<Watermark>>;

    /// Replaces whatever is stored under `key`.
    async fn put(&self, key: &str, watermark: &Watermark) -> AdapterResult<()>;
}
