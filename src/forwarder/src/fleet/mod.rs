//! Drives one [`StreamForwarder`](crate::forwarder::StreamForwarder) per
//! `(cluster, service)` pair on a fixed poll interval.

mod coordinator;
mod report;

pub use coordinator::{Fleet, FleetSettings};
pub use report::CycleReport;
