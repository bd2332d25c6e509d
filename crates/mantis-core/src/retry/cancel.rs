//! Cancellation tokens for attempt loops and backoff waits.
//!
//! A token is shared (cloned) between the caller and the retry loop. The
//! caller cancels it explicitly or lets its deadline pass; every blocked
//! [`CancelToken::wait`] wakes immediately.

use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Terminal error of a finished token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Cancelled {
    /// `cancel()` was called.
    #[error("operation canceled")]
    Canceled,
    /// The token's deadline passed.
    #[error("deadline exceeded")]
    DeadlineExceeded,
}

struct Inner {
    state: Mutex<Option<Cancelled>>,
    cond: Condvar,
    deadline: Option<Instant>,
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, Option<Cancelled>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn check(&self, state: &Option<Cancelled>, now: Instant) -> Option<Cancelled> {
        if let Some(err) = state {
            return Some(*err);
        }
        match self.deadline {
            Some(at) if at <= now => Some(Cancelled::DeadlineExceeded),
            _ => None,
        }
    }
}

/// Cloneable cancellation signal with an optional deadline.
///
/// The default token never fires.
#[derive(Clone, Default)]
pub struct CancelToken {
    inner: Option<Arc<Inner>>,
}

impl CancelToken {
    /// A token that is never done.
    pub fn never() -> Self {
        Self { inner: None }
    }

    /// A token that is done once `cancel()` is called.
    pub fn new() -> Self {
        Self::build(None)
    }

    /// A token that is done after `timeout` elapses (or on `cancel()`).
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::build(Instant::now().checked_add(timeout))
    }

    /// A token that is done at `deadline` (or on `cancel()`).
    pub fn with_deadline(deadline: Instant) -> Self {
        Self::build(Some(deadline))
    }

    fn build(deadline: Option<Instant>) -> Self {
        Self {
            inner: Some(Arc::new(Inner {
                state: Mutex::new(None),
                cond: Condvar::new(),
                deadline,
            })),
        }
    }

    /// Cancel the token and wake all waiters. No-op on a `never` token or
    /// one that is already done.
    pub fn cancel(&self) {
        if let Some(inner) = &self.inner {
            let mut state = inner.lock();
            if inner.check(&state, Instant::now()).is_none() {
                *state = Some(Cancelled::Canceled);
            }
            inner.cond.notify_all();
        }
    }

    /// The terminal error, once the token is done.
    pub fn error(&self) -> Option<Cancelled> {
        let inner = self.inner.as_ref()?;
        let state = inner.lock();
        inner.check(&state, Instant::now())
    }

    pub fn is_done(&self) -> bool {
        self.error().is_some()
    }

    /// Blocks for `duration` unless the token finishes first.
    ///
    /// Returns `Ok(())` when the full duration elapsed and `Err` with the
    /// token's error as soon as it is done. A token that is already done
    /// wins over a zero-length wait.
    pub fn wait(&self, duration: Duration) -> Result<(), Cancelled> {
        let Some(inner) = &self.inner else {
            if !duration.is_zero() {
                std::thread::sleep(duration);
            }
            return Ok(());
        };
        let wake = Instant::now().checked_add(duration);
        let mut state = inner.lock();
        loop {
            let now = Instant::now();
            if let Some(err) = inner.check(&state, now) {
                return Err(err);
            }
            let until = match (wake, inner.deadline) {
                (Some(w), Some(d)) => w.min(d),
                (Some(w), None) => w,
                (None, Some(d)) => d,
                (None, None) => {
                    state = inner.cond.wait(state).unwrap_or_else(PoisonError::into_inner);
                    continue;
                }
            };
            if wake.is_some_and(|w| w <= now) {
                return Ok(());
            }
            let (guard, _) = inner
                .cond
                .wait_timeout(state, until.saturating_duration_since(now))
                .unwrap_or_else(PoisonError::into_inner);
            state = guard;
        }
    }
}

impl std::fmt::Debug for CancelToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancelToken")
            .field("error", &self.error())
            .field("deadline", &self.inner.as_ref().and_then(|i| i.deadline))
            .finish()
    }
}
