use super::errors::classify_sdk_error;
use crate::adapters::{AdapterResult, ServiceDiscovery};
use crate::types::StreamIdentity;
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_ecs as ecs;

/// Lists every service of every ECS cluster visible to the credentials.
pub struct EcsServiceDiscovery {
    client: ecs::Client,
}

impl EcsServiceDiscovery {
    pub fn new(config: &SdkConfig) -> Self {
        Self {
            client: ecs::Client::new(config),
        }
    }

    async fn cluster_names(&self) -> AdapterResult<Vec<String>> {
        let mut names = Vec::new();
        let mut pages = self.client.list_clusters().into_paginator().send();

        while let Some(page) = pages.next().await {
            let page = page.map_err(|err| classify_sdk_error("ListClusters", err))?;
            names.extend(page.cluster_arns().iter().map(|arn| resource_name(arn).to_string()));
        }
        Ok(names)
    }

    async fn service_names(&self, cluster: &str) -> AdapterResult<Vec<String>> {
        let mut names = Vec::new();
        let mut pages = self
            .client
            .list_services()
            .cluster(cluster)
            .into_paginator()
            .send();

        while let Some(page) = pages.next().await {
            let page = page.map_err(|err| classify_sdk_error("ListServices", err))?;
            names.extend(page.service_arns().iter().map(|arn| resource_name(arn).to_string()));
        }
        Ok(names)
    }
}

#[async_trait]
impl ServiceDiscovery for EcsServiceDiscovery {
    async fn list_streams(&self) -> AdapterResult<Vec<StreamIdentity>> {
        let mut identities = Vec::new();
        for cluster in self.cluster_names().await? {
            let services = self.service_names(&cluster).await?;
            tracing::debug!(cluster = %cluster, services = services.len(), "Listed services");
            identities.extend(
                services
                    .into_iter()
                    .map(|service| StreamIdentity::new(cluster.clone(), service)),
            );
        }
        Ok(identities)
    }
}

/// Last path segment of an ARN.
///
/// Service ARNs come in two shapes, `service/<name>` and
/// `service/<cluster>/<name>`; the resource name is last in both.
fn resource_name(arn: &str) -> &str {
    arn.rsplit('/').next().unwrap_or(arn)
}
