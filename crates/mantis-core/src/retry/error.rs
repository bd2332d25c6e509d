//! Error returned by the generic retry loop.

use super::cancel::Cancelled;
use std::fmt;

/// Why [`run_with_retry`](super::run_with_retry) gave up.
///
/// A cancellation only shows up here when the token was done before any
/// attempt failed; otherwise the last operation error is reported.
#[derive(Debug)]
pub enum RetryError<E> {
    /// Last error returned by the operation.
    Operation(E),
    /// The token was done before the first attempt.
    Cancelled(Cancelled),
}

impl<E> RetryError<E> {
    /// The operation error, if that is why the loop stopped.
    pub fn into_operation(self) -> Option<E> {
        match self {
            RetryError::Operation(e) => Some(e),
            RetryError::Cancelled(_) => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, RetryError::Cancelled(_))
    }
}

impl<E: fmt::Display> fmt::Display for RetryError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetryError::Operation(e) => write!(f, "{}", e),
            RetryError::Cancelled(c) => write!(f, "{}", c),
        }
    }
}

impl<E> std::error::Error for RetryError<E>
where
    E: std::error::Error + 'static,
{
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RetryError::Operation(e) => Some(e),
            RetryError::Cancelled(c) => Some(c),
        }
    }
}

impl<E> From<Cancelled> for RetryError<E> {
    fn from(c: Cancelled) -> Self {
        RetryError::Cancelled(c)
    }
}
