//! Operator-facing reports for conditions that need a human to look at them.
//!
//! Reports go to Sentry when it was set up; otherwise they are dropped, the
//! log line emitted alongside is then the only trace.

use serde_json::Value;
use std::collections::BTreeMap;

/// Builder for one Sentry message with tags and extra context.
pub struct ErrorReporter {
    component: String,
    tags: BTreeMap<String, String>,
    extra: BTreeMap<String, Value>,
}

impl ErrorReporter {
    pub fn new(component: &str) -> Self {
        Self {
            component: component.to_string(),
            tags: BTreeMap::new(),
            extra: BTreeMap::new(),
        }
    }

    pub fn tag(mut self, key: &str, value: &str) -> Self {
        self.tags.insert(key.to_string(), value.to_string());
        self
    }

    pub fn add<T: serde::Serialize>(mut self, key: &str, value: T) -> Self {
        let value = serde_json::to_value(value).unwrap_or(Value::Null);
        self.extra.insert(key.to_string(), value);
        self
    }

    pub fn report(self, level: sentry::Level, message: &str) {
        if cfg!(test) {
            return;
        }
        sentry::with_scope(
            |scope| {
                scope.set_tag("component", &self.component);
                for (key, value) in &self.tags {
                    scope.set_tag(key, value);
                }
                for (key, value) in &self.extra {
                    scope.set_extra(key, value.clone());
                }
            },
            || {
                sentry::capture_message(message, level);
            },
        );
    }
}

/// The watermark of `stream` was no longer in the source window.
pub fn report_gap(stream: &str, watermark: &str, window_len: usize) {
    ErrorReporter::new("forwarder")
        .tag("stream", stream)
        .tag("condition", "gap_detected")
        .add("watermark", watermark)
        .add("window_len", window_len)
        .report(
            sentry::Level::Warning,
            &format!("Possible missed events in stream {}", stream),
        );
}

/// A stream was skipped for this cycle.
pub fn report_stream_failure(stream: &str, stage: &str, error: &dyn std::fmt::Display) {
    ErrorReporter::new("fleet")
        .tag("stream", stream)
        .tag("stage", stage)
        .add("error_message", error.to_string())
        .report(
            sentry::Level::Error,
            &format!("Forwarding failed for stream {}", stream),
        );
}
