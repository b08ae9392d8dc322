use super::error::{ForwardError, Stage};
use super::outcome::{plan_window, BatchKind, ForwarderState, Plan, ProcessOutcome};
use crate::adapters::{AdapterError, EventSource, LogSink, MarkerStore};
use crate::retry::BackoffPolicy;
use crate::types::{Event, StreamIdentity, Watermark};
use crate::utils::telemetry;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// The remote collaborators shared by every forwarder in a fleet.
#[derive(Clone)]
pub struct Adapters {
    pub source: Arc<dyn EventSource>,
    pub sink: Arc<dyn LogSink>,
    pub store: Arc<dyn MarkerStore>,
}

#[derive(Clone, Debug)]
pub struct ForwarderSettings {
    /// Pause before every append, to stay under the sink's request rate limits.
    pub pacing: Duration,
    /// Applied to each individual remote call.
    pub retry: BackoffPolicy,
}

/// Forwarding state machine for one stream.
///
/// `process` takes `&mut self`, so whoever owns the forwarder is the only
/// writer for its stream.
pub struct StreamForwarder {
    identity: StreamIdentity,
    stream_name: String,
    marker_key: String,
    continuation: Option<String>,
    watermark: Option<Watermark>,
    adapters: Adapters,
    settings: ForwarderSettings,
}

impl StreamForwarder {
    /// Prepares the log stream and loads the persisted watermark, if any.
    pub async fn open(
        identity: StreamIdentity,
        adapters: Adapters,
        settings: ForwarderSettings,
    ) -> Result<Self, ForwardError> {
        let stream_name = identity.stream_name();
        let marker_key = identity.marker_key();

        let continuation = {
            let sink = &adapters.sink;
            settings
                .retry
                .run(
                    Stage::EnsureStream.as_str(),
                    || sink.ensure_stream(&stream_name),
                    AdapterError::is_retryable,
                )
                .await
                .map_err(|err| ForwardError::new(Stage::EnsureStream, &stream_name, err))?
        };

        let watermark = {
            let store = &adapters.store;
            settings
                .retry
                .run(
                    Stage::LoadWatermark.as_str(),
                    || store.get(&marker_key),
                    AdapterError::is_retryable,
                )
                .await
                .map_err(|err| ForwardError::new(Stage::LoadWatermark, &stream_name, err))?
        };

        match &watermark {
            Some(watermark) => debug!(
                stream = %stream_name,
                watermark = %watermark,
                "Found persisted watermark"
            ),
            None => debug!(stream = %stream_name, "No persisted watermark, starting cold"),
        }

        Ok(Self {
            identity,
            stream_name,
            marker_key,
            continuation,
            watermark,
            adapters,
            settings,
        })
    }

    pub fn identity(&self) -> &StreamIdentity {
        &self.identity
    }

    pub fn stream_name(&self) -> &str {
        &self.stream_name
    }

    pub fn watermark(&self) -> Option<&Watermark> {
        self.watermark.as_ref()
    }

    pub fn continuation_token(&self) -> Option<&str> {
        self.continuation.as_deref()
    }

    pub fn state(&self) -> ForwarderState {
        match self.watermark {
            Some(_) => ForwarderState::Warm,
            None => ForwarderState::Cold,
        }
    }

    /// Runs one poll cycle: fetch the window, forward what is new, persist the watermark.
    ///
    /// On error the watermark is left where it was, so the next cycle makes the
    /// same decision again. If `cancel` fires mid-batch, the watermark advances
    /// only to the last event that was actually appended.
    pub async fn process(
        &mut self,
        cancel: &CancellationToken,
    ) -> Result<ProcessOutcome, ForwardError> {
        let window = self.fetch_window().await?;

        let Some(newest) = window.first() else {
            debug!(stream = %self.stream_name, "Event window is empty");
            return Ok(ProcessOutcome::Idle);
        };
        let newest = Watermark::from(newest);

        let (kind, count) = match plan_window(&window, self.watermark.as_ref()) {
            Plan::UpToDate => {
                debug!(stream = %self.stream_name, "No new events found");
                return Ok(ProcessOutcome::UpToDate);
            }
            Plan::Forward { kind, count } => (kind, count),
        };

        match kind {
            BatchKind::ColdStart => {
                info!(stream = %self.stream_name, count, "No watermark yet, forwarding full window")
            }
            BatchKind::NewEvents => {
                info!(stream = %self.stream_name, count, "Found new events in stream")
            }
            BatchKind::GapRecovery => self.flag_gap(window.len()),
        }

        // the window is newest-first; the sink must see oldest-first
        let mut forwarded = 0;
        let mut last_appended = None;
        for event in window[..count].iter().rev() {
            if cancel.is_cancelled() {
                break;
            }
            tokio::time::sleep(self.settings.pacing).await;
            self.append(event).await?;
            forwarded += 1;
            last_appended = Some(event);
        }

        if forwarded < count {
            if let Some(event) = last_appended {
                self.commit(Watermark::from(event)).await?;
            }
            info!(
                stream = %self.stream_name,
                forwarded,
                remaining = count - forwarded,
                "Stopped forwarding on shutdown"
            );
            return Ok(ProcessOutcome::Cancelled {
                forwarded,
                gap_recovery: kind == BatchKind::GapRecovery,
            });
        }

        self.commit(newest).await?;

        Ok(match kind {
            BatchKind::ColdStart => ProcessOutcome::ColdStart { forwarded },
            BatchKind::NewEvents => ProcessOutcome::Forwarded { forwarded },
            BatchKind::GapRecovery => ProcessOutcome::GapRecovered { forwarded },
        })
    }

    async fn fetch_window(&self) -> Result<Vec<Event>, ForwardError> {
        let source = &self.adapters.source;
        let identity = &self.identity;
        self.settings
            .retry
            .run(
                Stage::FetchEvents.as_str(),
                || source.list_events(identity),
                AdapterError::is_retryable,
            )
            .await
            .map_err(|err| ForwardError::new(Stage::FetchEvents, &self.stream_name, err))
    }

    async fn append(&mut self, event: &Event) -> Result<(), ForwardError> {
        info!(
            stream = %self.stream_name,
            event_id = %event.id,
            "Writing event to log stream"
        );

        let next = {
            let sink = &self.adapters.sink;
            let stream_name = &self.stream_name;
            let continuation = &self.continuation;
            self.settings
                .retry
                .run(
                    Stage::Append.as_str(),
                    || sink.append(stream_name, event, continuation.clone()),
                    AdapterError::is_retryable,
                )
                .await
                .map_err(|err| ForwardError::new(Stage::Append, stream_name, err))?
        };

        self.continuation = next;
        Ok(())
    }

    /// Persists `watermark`, then adopts it. A failed write leaves the old one in place.
    async fn commit(&mut self, watermark: Watermark) -> Result<(), ForwardError> {
        {
            let store = &self.adapters.store;
            let marker_key = &self.marker_key;
            let watermark = &watermark;
            self.settings
                .retry
                .run(
                    Stage::PersistWatermark.as_str(),
                    || store.put(marker_key, watermark),
                    AdapterError::is_retryable,
                )
                .await
                .map_err(|err| ForwardError::new(Stage::PersistWatermark, &self.stream_name, err))?;
        }

        debug!(stream = %self.stream_name, watermark = %watermark, "Persisted watermark");
        self.watermark = Some(watermark);
        Ok(())
    }

    fn flag_gap(&self, window_len: usize) {
        let previous = self
            .watermark
            .as_ref()
            .map(Watermark::as_str)
            .unwrap_or_default();

        warn!(
            stream = %self.stream_name,
            watermark = previous,
            window_len,
            gap_detected = true,
            "Was not able to find last event in our stream, possible events are being missed"
        );
        telemetry::report_gap(&self.stream_name, previous, window_len);
    }
}
