use serde::Serialize;
use std::fmt;

/// Totals for one pass over the fleet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CycleReport {
    /// Streams processed this cycle, successfully or not.
    pub streams: usize,
    pub events: usize,
    pub gaps: usize,
    pub failures: usize,
    /// Streams dropped because their service no longer exists.
    pub retired: usize,
    /// Streams that still could not be opened.
    pub pending: usize,
    pub cancelled: bool,
}

impl fmt::Display for CycleReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} streams, {} events forwarded, {} gaps, {} failures, {} retired, {} pending",
            self.streams, self.events, self.gaps, self.failures, self.retired, self.pending
        )
    }
}
