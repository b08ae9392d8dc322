use super::error::AdapterResult;
use crate::types::{Event, StreamIdentity};
use async_trait::async_trait;

/// Where service events come from.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EventSource: Send + Sync {
    /// The current bounded window of events for a service, newest first.
    ///
    /// Older events silently age out of the window between calls.
    async fn list_events(&self, identity: &StreamIdentity) -> AdapterResult<Vec<Event>>;
}
