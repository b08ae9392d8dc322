use super::error::AdapterResult;
use crate::types::Event;
use async_trait::async_trait;

/// Append-only, sequenced log destination.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LogSink: Send + Sync {
    /// Makes sure `stream_name` exists, reusing an existing stream, and
    /// returns its current continuation token (`None` for a fresh stream).
    async fn ensure_stream(&self, stream_name: &str) -> AdapterResult<Option<String>>;

    /// Appends one event and returns the token the next append must carry.
    async fn append(
        &self,
        stream_name: &str,
        event: &Event,
        continuation: Option<String>,
    ) -> AdapterResult<Option<String>>;
}
