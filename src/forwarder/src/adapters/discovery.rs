use super::error::AdapterResult;
use crate::types::StreamIdentity;
use async_trait::async_trait;

/// Enumerates the services whose events should be forwarded.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ServiceDiscovery: Send + Sync {
    async fn list_streams(&self) -> AdapterResult<Vec<StreamIdentity>>;
}
