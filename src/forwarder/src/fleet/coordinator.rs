use super::report::CycleReport;
use crate::adapters::{AdapterError, ServiceDiscovery};
use crate::forwarder::{Adapters, ForwardError, ForwarderSettings, StreamForwarder};
use crate::retry::BackoffPolicy;
use crate::types::StreamIdentity;
use crate::utils::telemetry;
use anyhow::{bail, Context, Result};
use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

#[derive(Clone, Debug)]
pub struct FleetSettings {
    /// Pause between two streams within a cycle.
    pub stream_spacing: Duration,
    /// Time between the starts of two cycles.
    pub poll_interval: Duration,
}

/// Owns every forwarder, so each stream has exactly one writer.
pub struct Fleet {
    forwarders: BTreeMap<StreamIdentity, StreamForwarder>,
    pending: BTreeSet<StreamIdentity>,
    adapters: Adapters,
    forwarder_settings: ForwarderSettings,
    settings: FleetSettings,
}

impl Fleet {
    /// Lists every service of every cluster. An empty result is an error:
    /// there would be nothing to forward.
    pub async fn discover(
        discovery: &dyn ServiceDiscovery,
        retry: &BackoffPolicy,
    ) -> Result<Vec<StreamIdentity>> {
        let mut identities = retry
            .run(
                "list_streams",
                || discovery.list_streams(),
                AdapterError::is_retryable,
            )
            .await
            .context("Failed to enumerate clusters and services")?;

        if identities.is_empty() {
            bail!("No services found in any cluster");
        }

        identities.sort();
        identities.dedup();
        info!(count = identities.len(), "Discovered services");
        Ok(identities)
    }

    /// Opens a forwarder per identity. Streams that fail to open are retried
    /// at the start of every cycle.
    pub async fn open_all(
        identities: Vec<StreamIdentity>,
        adapters: Adapters,
        forwarder_settings: ForwarderSettings,
        settings: FleetSettings,
    ) -> Self {
        let mut fleet = Self {
            forwarders: BTreeMap::new(),
            pending: identities.into_iter().collect(),
            adapters,
            forwarder_settings,
            settings,
        };
        fleet.open_pending().await;
        fleet
    }

    /// Streams this fleet is responsible for, open or not.
    pub fn stream_count(&self) -> usize {
        self.forwarders.len() + self.pending.len()
    }

    pub fn active_count(&self) -> usize {
        self.forwarders.len()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn forwarder(&self, identity: &StreamIdentity) -> Option<&StreamForwarder> {
        self.forwarders.get(identity)
    }

    async fn open_pending(&mut self) {
        let pending = std::mem::take(&mut self.pending);
        for identity in pending {
            match StreamForwarder::open(
                identity.clone(),
                self.adapters.clone(),
                self.forwarder_settings.clone(),
            )
            .await
            {
                Ok(forwarder) => {
                    debug!(stream = %forwarder.stream_name(), "Opened stream");
                    self.forwarders.insert(identity, forwarder);
                }
                Err(err) => {
                    self.report_failure(&err);
                    self.pending.insert(identity);
                }
            }
        }
    }

    fn report_failure(&self, err: &ForwardError) {
        error!(
            stream = %err.stream(),
            stage = err.stage().as_str(),
            exhausted = err.is_exhausted(),
            "{}",
            err
        );
        telemetry::report_stream_failure(err.stream(), err.stage().as_str(), err);
    }

    /// Processes every open stream once, in a stable order.
    ///
    /// A failing stream is logged and skipped; it never stops the cycle.
    pub async fn run_cycle(&mut self, cancel: &CancellationToken) -> CycleReport {
        let mut report = CycleReport::default();

        if !self.pending.is_empty() {
            self.open_pending().await;
        }

        let identities: Vec<StreamIdentity> = self.forwarders.keys().cloned().collect();
        let mut retired = Vec::new();

        for (index, identity) in identities.iter().enumerate() {
            if cancel.is_cancelled() {
                report.cancelled = true;
                break;
            }
            if index > 0 {
                tokio::time::sleep(self.settings.stream_spacing).await;
            }
            let Some(forwarder) = self.forwarders.get_mut(identity) else {
                continue;
            };

            report.streams += 1;
            match forwarder.process(cancel).await {
                Ok(outcome) => {
                    report.events += outcome.forwarded();
                    if outcome.is_gap() {
                        report.gaps += 1;
                    }
                    debug!(stream = %forwarder.stream_name(), ?outcome, "Processed stream");
                }
                Err(err) if err.is_source_gone() => {
                    warn!(
                        stream = %err.stream(),
                        "Service no longer exists, no longer forwarding its events"
                    );
                    retired.push(identity.clone());
                }
                Err(err) => {
                    report.failures += 1;
                    self.report_failure(&err);
                }
            }
        }

        for identity in retired {
            self.forwarders.remove(&identity);
            report.retired += 1;
        }
        report.pending = self.pending.len();
        report
    }

    /// Runs cycles on the poll interval until `cancel` fires.
    pub async fn run(&mut self, cancel: &CancellationToken) {
        let mut poll_interval = tokio::time::interval(self.settings.poll_interval);
        poll_interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("Fleet cancelled");
                    break;
                }

                _ = poll_interval.tick() => {
                    let report = self.run_cycle(cancel).await;
                    info!(
                        streams = report.streams,
                        events = report.events,
                        gaps = report.gaps,
                        failures = report.failures,
                        "Cycle finished: {}",
                        report
                    );
                    if report.cancelled {
                        break;
                    }
                }
            }
        }

        info!("Stopped forwarding");
    }
}
