use crate::adapters::{AdapterError, LogSink, MarkerStore};
use crate::cloud_providers::aws::config::{resolve_aws_config, AwsCredentialSource};
use crate::cloud_providers::aws::{
    CloudWatchLogSink, DynamoMarkerStore, EcsEventSource, EcsServiceDiscovery,
};
use crate::config::Config;
use crate::daemon::cancel_on_shutdown_signal;
use crate::fleet::{Fleet, FleetSettings};
use crate::forwarder::{Adapters, ForwarderSettings};
use crate::retry::BackoffPolicy;
use crate::utils::Sentry;
use anyhow::{Context, Result};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

async fn create_resources(
    sink: &CloudWatchLogSink,
    store: &DynamoMarkerStore,
    retry: &BackoffPolicy,
) -> Result<()> {
    retry
        .run(
            "ensure_log_group",
            || sink.ensure_log_group(),
            AdapterError::is_retryable,
        )
        .await
        .with_context(|| format!("Failed to prepare log group {}", sink.log_group()))?;

    retry
        .run(
            "ensure_table",
            || store.ensure_table(),
            AdapterError::is_retryable,
        )
        .await
        .with_context(|| format!("Failed to prepare marker table {}", store.table()))?;

    Ok(())
}

async fn create_fleet(config: &Config) -> Result<Fleet> {
    let retry = config.backoff_policy()?;

    let aws_config = resolve_aws_config(
        AwsCredentialSource::from_config(config),
        config.region.as_deref(),
    )
    .await?;

    let sink = CloudWatchLogSink::new(&aws_config, &config.cloudwatch_log_group);
    let store = DynamoMarkerStore::new(&aws_config, &config.marker_table);
    if config.create_missing_resources {
        create_resources(&sink, &store, &retry).await?;
    }

    let discovery = EcsServiceDiscovery::new(&aws_config);
    let identities = Fleet::discover(&discovery, &retry).await?;

    let sink: Arc<dyn LogSink> = Arc::new(sink);
    let store: Arc<dyn MarkerStore> = Arc::new(store);
    let adapters = Adapters {
        source: Arc::new(EcsEventSource::new(&aws_config)),
        sink,
        store,
    };

    let fleet = Fleet::open_all(
        identities,
        adapters,
        ForwarderSettings {
            pacing: config.request_spacing(),
            retry,
        },
        FleetSettings {
            stream_spacing: config.request_spacing(),
            poll_interval: config.poll_interval(),
        },
    )
    .await;

    info!(
        streams = fleet.stream_count(),
        pending = fleet.pending_count(),
        log_group = %config.cloudwatch_log_group,
        "Forwarder fleet ready"
    );
    Ok(fleet)
}

async fn forward_until_shutdown(config: &Config) -> Result<()> {
    let cancel = CancellationToken::new();
    tokio::spawn(cancel_on_shutdown_signal(cancel.clone()));

    let mut fleet = create_fleet(config)
        .await
        .context("Failed to start the forwarder")?;

    fleet.run(&cancel).await;
    Ok(())
}

/// Sets up logging and telemetry, then forwards events until a shutdown signal.
///
/// A fatal error is reported before the Sentry guard is dropped, so it is flushed.
pub async fn run(config: Config) -> Result<()> {
    let _log_guard = crate::logging::setup_logging(&config)?;
    let _sentry_guard = Sentry::setup(config.sentry_dsn.as_deref());

    let result = forward_until_shutdown(&config).await;
    if let Err(err) = &result {
        error!("{:#}", err);
        sentry::integrations::anyhow::capture_anyhow(err);
    }
    result
}
