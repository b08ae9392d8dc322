use std::fmt;

/// The `(cluster, service)` pair one forwarder is responsible for.
///
/// Both the log stream name and the marker key are derived from it, so it must
/// not change for the lifetime of a forwarder.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StreamIdentity {
    cluster: String,
    service: String,
}

impl StreamIdentity {
    pub fn new(cluster: impl Into<String>, service: impl Into<String>) -> Self {
        Self {
            cluster: cluster.into(),
            service: service.into(),
        }
    }

    pub fn cluster(&self) -> &str {
        &self.cluster
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    /// Name of the log stream events for this service are appended to.
    pub fn stream_name(&self) -> String {
        format!("{}_{}", self.cluster, self.service)
    }

    /// Key of the watermark record in the marker store.
    pub fn marker_key(&self) -> String {
        format!("{}_{}", self.cluster, self.service)
    }
}

impl fmt::Display for StreamIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.cluster, self.service)
    }
}
