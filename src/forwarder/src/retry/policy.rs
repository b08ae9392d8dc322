use super::error::{InvalidPolicy, RetryError};
use std::future::Future;
use std::time::Duration;
use tokio_retry::RetryIf;
use tracing::{debug, warn};

/// Upper bound for a single backoff sleep.
pub const MAX_BACKOFF_DELAY: Duration = Duration::from_secs(60 * 60);

/// How often and how patiently a failing operation is retried.
#[derive(Clone, Debug, PartialEq)]
pub struct BackoffPolicy {
    max_retries: u32,
    initial_delay: Duration,
    backoff_factor: f64,
}

impl BackoffPolicy {
    /// `max_retries` counts retries after the first attempt, so `0` means "try once".
    pub fn new(
        max_retries: u32,
        initial_delay: Duration,
        backoff_factor: f64,
    ) -> Result<Self, InvalidPolicy> {
        if initial_delay.is_zero() {
            return Err(InvalidPolicy::ZeroInitialDelay);
        }
        // written this way round so NaN is rejected too
        if !(backoff_factor > 1.0) {
            return Err(InvalidPolicy::FactorNotAboveOne(backoff_factor));
        }

        Ok(Self {
            max_retries,
            initial_delay,
            backoff_factor,
        })
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub fn initial_delay(&self) -> Duration {
        self.initial_delay
    }

    pub fn backoff_factor(&self) -> f64 {
        self.backoff_factor
    }

    /// A fresh delay schedule: `initial_delay * factor^n` for each allowed retry.
    pub fn delays(&self) -> BackoffDelays {
        BackoffDelays {
            next: self.initial_delay,
            factor: self.backoff_factor,
            remaining: self.max_retries,
        }
    }

    /// Runs `operation`, retrying failures for which `is_retryable` returns true.
    ///
    /// Non-retryable failures are returned as [`RetryError::Permanent`] without
    /// sleeping. A retryable failure on the last allowed attempt becomes
    /// [`RetryError::RetriesExhausted`].
    pub async fn run<T, E, Op, Fut, P>(
        &self,
        label: &str,
        mut operation: Op,
        mut is_retryable: P,
    ) -> Result<T, RetryError<E>>
    where
        Op: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        P: FnMut(&E) -> bool,
        E: std::fmt::Display,
    {
        let mut attempts: u32 = 0;
        let mut last_was_retryable = false;

        let schedule = self.delays().enumerate().map(|(retry, delay)| {
            warn!(
                operation = label,
                attempt = retry + 2,
                delay_ms = delay.as_millis() as u64,
                "Retrying after transient failure"
            );
            delay
        });

        let result = RetryIf::spawn(
            schedule,
            || {
                attempts += 1;
                operation()
            },
            |err: &E| {
                last_was_retryable = is_retryable(err);
                if last_was_retryable {
                    debug!(operation = label, error = %err, "Transient failure");
                }
                last_was_retryable
            },
        )
        .await;

        match result {
            Ok(value) => Ok(value),
            Err(last) if last_was_retryable => Err(RetryError::RetriesExhausted { attempts, last }),
            Err(err) => Err(RetryError::Permanent(err)),
        }
    }
}

/// Delay schedule for one retrying call.
#[derive(Clone, Debug)]
pub struct BackoffDelays {
    next: Duration,
    factor: f64,
    remaining: u32,
}

impl Iterator for BackoffDelays {
    type Item = Duration;

    fn next(&mut self) -> Option<Duration> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;

        let current = self.next;
        self.next = Duration::try_from_secs_f64(current.as_secs_f64() * self.factor)
            .unwrap_or(MAX_BACKOFF_DELAY)
            .min(MAX_BACKOFF_DELAY);
        Some(current.min(MAX_BACKOFF_DELAY))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.remaining as usize;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for BackoffDelays {}
