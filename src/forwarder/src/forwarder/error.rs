use crate::adapters::AdapterError;
use crate::retry::RetryError;
use std::fmt;

/// Step of the forwarding cycle a failure happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    EnsureStream,
    LoadWatermark,
    FetchEvents,
    Append,
    PersistWatermark,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::EnsureStream => "ensure_stream",
            Stage::LoadWatermark => "load_watermark",
            Stage::FetchEvents => "fetch_events",
            Stage::Append => "append",
            Stage::PersistWatermark => "persist_watermark",
        }
    }
}

/// A forwarding step failed for good (retries exhausted or a permanent error).
#[derive(Debug)]
pub struct ForwardError {
    stage: Stage,
    stream: String,
    source: RetryError<AdapterError>,
}

impl ForwardError {
    pub(crate) fn new(stage: Stage, stream: &str, source: RetryError<AdapterError>) -> Self {
        Self {
            stage,
            stream: stream.to_string(),
            source,
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn stream(&self) -> &str {
        &self.stream
    }

    pub fn adapter_error(&self) -> &AdapterError {
        self.source.inner()
    }

    pub fn is_exhausted(&self) -> bool {
        self.source.is_exhausted()
    }

    /// The service behind this stream no longer exists at the source.
    pub fn is_source_gone(&self) -> bool {
        self.stage == Stage::FetchEvents && self.adapter_error().is_not_found()
    }
}

impl fmt::Display for ForwardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} failed for stream {}: {}",
            self.stage.as_str(),
            self.stream,
            self.source
        )
    }
}

impl std::error::Error for ForwardError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}
