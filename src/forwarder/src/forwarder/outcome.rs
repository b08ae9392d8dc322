use crate::types::{Event, Watermark};

/// Whether a forwarder knows where it left off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForwarderState {
    /// Nothing has ever been forwarded for this stream.
    Cold,
    /// A watermark is established.
    Warm,
}

/// What one `process` call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessOutcome {
    /// The source returned no events at all.
    Idle,
    /// The newest event was already forwarded.
    UpToDate,
    /// First run for this stream: the whole window was forwarded.
    ColdStart { forwarded: usize },
    /// Events newer than the watermark were forwarded.
    Forwarded { forwarded: usize },
    /// The watermark had aged out of the window, so events were probably lost;
    /// the whole window was forwarded again.
    GapRecovered { forwarded: usize },
    /// Shutdown was requested part way through a batch. `gap_recovery` is set
    /// when that batch was re-forwarding a window after a gap.
    Cancelled { forwarded: usize, gap_recovery: bool },
}

impl ProcessOutcome {
    pub fn forwarded(&self) -> usize {
        match self {
            ProcessOutcome::Idle | ProcessOutcome::UpToDate => 0,
            ProcessOutcome::ColdStart { forwarded }
            | ProcessOutcome::Forwarded { forwarded }
            | ProcessOutcome::GapRecovered { forwarded }
            | ProcessOutcome::Cancelled { forwarded, .. } => *forwarded,
        }
    }

    pub fn is_gap(&self) -> bool {
        matches!(
            self,
            ProcessOutcome::GapRecovered { .. }
                | ProcessOutcome::Cancelled {
                    gap_recovery: true,
                    ..
                }
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BatchKind {
    ColdStart,
    NewEvents,
    GapRecovery,
}

/// Which prefix of a newest-first window still has to be forwarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Plan {
    UpToDate,
    Forward { kind: BatchKind, count: usize },
}

/// Locates the watermark in `window` by id and decides what to forward.
///
/// `window` must be non-empty and ordered newest first.
pub(crate) fn plan_window(window: &[Event], watermark: Option<&Watermark>) -> Plan {
    let Some(watermark) = watermark else {
        return Plan::Forward {
            kind: BatchKind::ColdStart,
            count: window.len(),
        };
    };

    match window.iter().position(|event| watermark.matches(event)) {
        Some(0) => Plan::UpToDate,
        Some(position) => Plan::Forward {
            kind: BatchKind::NewEvents,
            count: position,
        },
        None => Plan::Forward {
            kind: BatchKind::GapRecovery,
            count: window.len(),
        },
    }
}
