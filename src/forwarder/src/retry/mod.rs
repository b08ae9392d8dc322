//! Bounded exponential-backoff retries for remote calls.
//!
//! Every call to [`BackoffPolicy::run`] builds its own delay schedule, so
//! concurrent or back-to-back invocations of the same operation never share
//! attempt counters or delays.

mod error;
mod policy;

pub use error::{InvalidPolicy, RetryError};
pub use policy::{BackoffDelays, BackoffPolicy, MAX_BACKOFF_DELAY};
