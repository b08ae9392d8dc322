use std::fmt;
use std::time::Duration;

/// Failure of an operation run under a [`super::BackoffPolicy`].
#[derive(Debug)]
pub enum RetryError<E> {
    /// The operation failed with an error the policy does not retry.
    Permanent(E),

    /// Every allowed retry failed; `last` is the final error seen.
    RetriesExhausted { attempts: u32, last: E },
}

impl<E> RetryError<E> {
    /// The underlying operation error.
    pub fn inner(&self) -> &E {
        match self {
            RetryError::Permanent(err) => err,
            RetryError::RetriesExhausted { last, .. } => last,
        }
    }

    pub fn into_inner(self) -> E {
        match self {
            RetryError::Permanent(err) => err,
            RetryError::RetriesExhausted { last, .. } => last,
        }
    }

    pub fn is_exhausted(&self) -> bool {
        matches!(self, RetryError::RetriesExhausted { .. })
    }
}

impl<E: fmt::Display> fmt::Display for RetryError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetryError::Permanent(err) => write!(f, "{}", err),
            RetryError::RetriesExhausted { attempts, last } => {
                write!(f, "Retries exhausted after {} attempts: {}", attempts, last)
            }
        }
    }
}

impl<E> std::error::Error for RetryError<E>
where
    E: std::error::Error + 'static,
{
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.inner())
    }
}

/// Rejected [`super::BackoffPolicy`] settings.
#[derive(Debug, Clone, PartialEq)]
pub enum InvalidPolicy {
    ZeroInitialDelay,
    FactorNotAboveOne(f64),
}

impl fmt::Display for InvalidPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvalidPolicy::ZeroInitialDelay => {
                write!(f, "initial retry delay must be greater than {:?}", Duration::ZERO)
            }
            InvalidPolicy::FactorNotAboveOne(factor) => {
                write!(f, "backoff factor must be greater than 1, got {}", factor)
            }
        }
    }
}

impl std::error::Error for InvalidPolicy {}
