use super::backoff::Backoff;
use super::cancel::CancelToken;
use std::fmt;

/// Options for one [`run_with_retry`](super::run_with_retry) call.
///
/// Start from [`RetryConfig::default`] (the built-in defaults) and override
/// what the call needs:
///
/// ```
/// use mantis_core::retry::{Backoff, RetryConfig};
/// use std::time::Duration;
///
/// let cfg: RetryConfig<'_, std::io::Error> = RetryConfig::default()
///     .attempts(3)
///     .backoff(Backoff::constant(Duration::from_millis(10)))
///     .retry_if(|e: &std::io::Error| e.kind() != std::io::ErrorKind::NotFound);
/// assert_eq!(cfg.max_attempts(), 3);
/// ```
pub struct RetryConfig<'a, E> {
    pub(super) attempts: u32,
    pub(super) backoff: Backoff,
    pub(super) classifier: Box<dyn Fn(&E) -> bool + 'a>,
    pub(super) on_retry: Box<dyn FnMut(u32, &E) + 'a>,
    pub(super) cancel: CancelToken,
}

impl<E> Default for RetryConfig<'_, E> {
    fn default() -> Self {
        Self {
            attempts: super::DEFAULT_ATTEMPTS,
            backoff: Backoff::default(),
            classifier: Box::new(|_| true),
            on_retry: Box::new(|_, _| {}),
            cancel: CancelToken::never(),
        }
    }
}

impl<'a, E> RetryConfig<'a, E> {
    /// Retries beyond the first attempt; 0 runs the operation exactly once.
    pub fn attempts(mut self, attempts: u32) -> Self {
        self.attempts = attempts;
        self
    }

    pub fn backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    /// Classifier: `true` retries the error, `false` stops immediately.
    pub fn retry_if<F>(mut self, f: F) -> Self
    where
        F: Fn(&E) -> bool + 'a,
    {
        self.classifier = Box::new(f);
        self
    }

    /// Hook called before every retry with the number of tries so far and the
    /// last error. Not called before the first attempt.
    pub fn on_retry<F>(mut self, f: F) -> Self
    where
        F: FnMut(u32, &E) + 'a,
    {
        self.on_retry = Box::new(f);
        self
    }

    pub fn cancel(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.attempts
    }
}

impl<E> fmt::Debug for RetryConfig<'_, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryConfig")
            .field("attempts", &self.attempts)
            .field("backoff", &self.backoff)
            .field("cancel", &self.cancel)
            .finish_non_exhaustive()
    }
}
