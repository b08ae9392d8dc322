use super::errors::classify_sdk_error;
use crate::adapters::{AdapterError, AdapterResult, EventSource};
use crate::types::{Event, StreamIdentity};
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_ecs as ecs;
use aws_sdk_ecs::types::ServiceEvent;
use chrono::{DateTime, Utc};

/// Reads the recent-events window of an ECS service via `DescribeServices`.
pub struct EcsEventSource {
    client: ecs::Client,
}

impl EcsEventSource {
    pub fn new(config: &SdkConfig) -> Self {
        Self {
            client: ecs::Client::new(config),
        }
    }
}

#[async_trait]
impl EventSource for EcsEventSource {
    async fn list_events(&self, identity: &StreamIdentity) -> AdapterResult<Vec<Event>> {
        let output = self
            .client
            .describe_services()
            .cluster(identity.cluster())
            .services(identity.service())
            .send()
            .await
            .map_err(|err| classify_sdk_error("DescribeServices", err))?;

        if let Some(failure) = output.failures().first() {
            return Err(AdapterError::not_found(format!(
                "service {} is unavailable: {}",
                identity,
                failure.reason().unwrap_or("unknown reason")
            )));
        }

        let service = output
            .services()
            .iter()
            .find(|service| service.service_name() == Some(identity.service()))
            .or_else(|| output.services().first())
            .ok_or_else(|| {
                AdapterError::not_found(format!("service {} was not returned", identity))
            })?;

        Ok(service
            .events()
            .iter()
            .filter_map(|event| convert_service_event(identity, event))
            .collect())
    }
}

/// ECS always fills these fields in; an event without them cannot be tracked and is dropped.
fn convert_service_event(identity: &StreamIdentity, event: &ServiceEvent) -> Option<Event> {
    let Some(id) = event.id() else {
        tracing::warn!(stream = %identity, "Skipping service event without id");
        return None;
    };
    let Some(created_at) = event.created_at() else {
        tracing::warn!(stream = %identity, event_id = id, "Skipping service event without timestamp");
        return None;
    };
    let Some(created_at) = DateTime::<Utc>::from_timestamp(created_at.secs(), created_at.subsec_nanos())
    else {
        tracing::warn!(stream = %identity, event_id = id, "Skipping service event with out of range timestamp");
        return None;
    };

    Some(Event::new(
        id,
        created_at,
        event.message().unwrap_or_default(),
    ))
}
