#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ecs_event_forwarder::adapters::{
    AdapterError, AdapterResult, EventSource, LogSink, MarkerStore, ServiceDiscovery,
};
use ecs_event_forwarder::forwarder::{Adapters, ForwarderSettings};
use ecs_event_forwarder::retry::BackoffPolicy;
use ecs_event_forwarder::types::{Event, StreamIdentity, Watermark};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub fn event(id: &str, secs: i64) -> Event {
    let created_at = DateTime::<Utc>::from_timestamp(1_700_000_000 + secs, 0).unwrap();
    Event::new(id, created_at, format!("event {}", id))
}

/// A newest-first window of events `first..=last`, like the ECS API returns.
pub fn window(first: u32, last: u32) -> Vec<Event> {
    (first..=last)
        .rev()
        .map(|n| event(&format!("e{}", n), i64::from(n)))
        .collect()
}

pub fn settings() -> ForwarderSettings {
    ForwarderSettings {
        pacing: Duration::ZERO,
        retry: BackoffPolicy::new(2, Duration::from_millis(10), 2.0).unwrap(),
    }
}

/// Event windows keyed by stream, replaced by the test between polls.
#[derive(Default)]
pub struct ScriptedSource {
    windows: Mutex<HashMap<StreamIdentity, Vec<Event>>>,
}

impl ScriptedSource {
    pub fn set_window(&self, identity: &StreamIdentity, events: Vec<Event>) {
        self.windows
            .lock()
            .unwrap()
            .insert(identity.clone(), events);
    }

    pub fn remove(&self, identity: &StreamIdentity) {
        self.windows.lock().unwrap().remove(identity);
    }
}

#[async_trait]
impl EventSource for ScriptedSource {
    async fn list_events(&self, identity: &StreamIdentity) -> AdapterResult<Vec<Event>> {
        self.windows
            .lock()
            .unwrap()
            .get(identity)
            .cloned()
            .ok_or_else(|| AdapterError::not_found(format!("service {} not found", identity)))
    }
}

#[derive(Default)]
struct SinkStream {
    events: Vec<Event>,
    token: Option<String>,
}

/// Log sink that enforces sequence tokens the way CloudWatch Logs does.
#[derive(Default)]
pub struct RecordingSink {
    streams: Mutex<HashMap<String, SinkStream>>,
    appends: AtomicUsize,
}

impl RecordingSink {
    pub fn ids(&self, stream_name: &str) -> Vec<String> {
        self.streams
            .lock()
            .unwrap()
            .get(stream_name)
            .map(|stream| stream.events.iter().map(|event| event.id.clone()).collect())
            .unwrap_or_default()
    }

    pub fn timestamps(&self, stream_name: &str) -> Vec<i64> {
        self.streams
            .lock()
            .unwrap()
            .get(stream_name)
            .map(|stream| stream.events.iter().map(Event::timestamp_millis).collect())
            .unwrap_or_default()
    }

    pub fn stream_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.streams.lock().unwrap().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn append_count(&self) -> usize {
        self.appends.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LogSink for RecordingSink {
    async fn ensure_stream(&self, stream_name: &str) -> AdapterResult<Option<String>> {
        let mut streams = self.streams.lock().unwrap();
        Ok(streams
            .entry(stream_name.to_string())
            .or_default()
            .token
            .clone())
    }

    async fn append(
        &self,
        stream_name: &str,
        event: &Event,
        continuation: Option<String>,
    ) -> AdapterResult<Option<String>> {
        let mut streams = self.streams.lock().unwrap();
        let stream = streams
            .get_mut(stream_name)
            .ok_or_else(|| AdapterError::not_found(format!("log stream {}", stream_name)))?;

        if stream.token != continuation {
            return Err(AdapterError::rejected(format!(
                "sequence token {:?} is not {:?}",
                continuation, stream.token
            )));
        }

        stream.events.push(event.clone());
        let token = format!("{}-{}", stream_name, stream.events.len());
        stream.token = Some(token.clone());
        self.appends.fetch_add(1, Ordering::SeqCst);
        Ok(Some(token))
    }
}

/// Marker store backed by a map; writes can be made to fail.
#[derive(Default)]
pub struct MemoryMarkerStore {
    markers: Mutex<HashMap<String, Watermark>>,
    failing_puts: AtomicUsize,
}

impl MemoryMarkerStore {
    pub fn marker(&self, key: &str) -> Option<String> {
        self.markers
            .lock()
            .unwrap()
            .get(key)
            .map(|watermark| watermark.as_str().to_string())
    }

    /// The next `count` writes fail with a permanent error.
    pub fn fail_next_puts(&self, count: usize) {
        self.failing_puts.store(count, Ordering::SeqCst);
    }
}

#[async_trait]
impl MarkerStore for MemoryMarkerStore {
    async fn get(&self, key: &str) -> AdapterResult<Option<Watermark>> {
        Ok(self.markers.lock().unwrap().get(key).cloned())
    }

    async fn put(&self, key: &str, watermark: &Watermark) -> AdapterResult<()> {
        let failing = self.failing_puts.load(Ordering::SeqCst);
        if failing > 0 {
            self.failing_puts.store(failing - 1, Ordering::SeqCst);
            return Err(AdapterError::rejected("marker table is read only"));
        }
        self.markers
            .lock()
            .unwrap()
            .insert(key.to_string(), watermark.clone());
        Ok(())
    }
}

pub struct StaticDiscovery(pub Vec<StreamIdentity>);

#[async_trait]
impl ServiceDiscovery for StaticDiscovery {
    async fn list_streams(&self) -> AdapterResult<Vec<StreamIdentity>> {
        Ok(self.0.clone())
    }
}

/// One set of fakes, shared by every forwarder built from it.
#[derive(Default, Clone)]
pub struct Harness {
    pub source: Arc<ScriptedSource>,
    pub sink: Arc<RecordingSink>,
    pub store: Arc<MemoryMarkerStore>,
}

impl Harness {
    pub fn adapters(&self) -> Adapters {
        Adapters {
            source: self.source.clone(),
            sink: self.sink.clone(),
            store: self.store.clone(),
        }
    }
}
