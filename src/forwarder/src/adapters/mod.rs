//! Boundaries to the three remote services a forwarder talks to, plus service discovery.
//!
//! Implementations classify their failures into [`ErrorKind`]s so the retrier
//! only ever retries transient conditions.

mod discovery;
mod error;
mod marker;
mod sink;
mod source;

pub use discovery::ServiceDiscovery;
pub use error::{AdapterError, AdapterResult, ErrorKind};
pub use marker::MarkerStore;
pub use sink::LogSink;
pub use source::EventSource;

#[cfg(test)]
pub use discovery::MockServiceDiscovery;
#[cfg(test)]
pub use marker::MockMarkerStore;
#[cfg(test)]
pub use sink::MockLogSink;
#[cfg(test)]
pub use source::MockEventSource;
