use super::error::Error;
use super::request::Request;
use super::response::Response;
use super::transport::Transport;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Computes how long to wait before the next send.
///
/// `delay` is called exactly once per send, right before waiting. It may be
/// stateful; implementations shared between threads handle their own
/// synchronization.
pub trait Limiter {
    fn delay(&self) -> Duration;
}

/// A fixed delay before every send.
impl Limiter for Duration {
    fn delay(&self) -> Duration {
        *self
    }
}

impl<L: Limiter + ?Sized> Limiter for Arc<L> {
    fn delay(&self) -> Duration {
        (**self).delay()
    }
}

impl<L: Limiter + ?Sized> Limiter for &L {
    fn delay(&self) -> Duration {
        (**self).delay()
    }
}

/// Adapts a closure into a [`Limiter`].
pub struct FnLimiter<F>(F);

pub fn limiter_fn<F: Fn() -> Duration>(f: F) -> FnLimiter<F> {
    FnLimiter(f)
}

impl<F: Fn() -> Duration> Limiter for FnLimiter<F> {
    fn delay(&self) -> Duration {
        (self.0)()
    }
}

/// Spaces sends at least `interval` apart, across every thread sharing it.
///
/// Each call reserves the next free slot, so concurrent callers queue up
/// behind each other instead of all firing once the interval has passed.
#[derive(Debug)]
pub struct IntervalLimiter {
    interval: Duration,
    next: Mutex<Option<Instant>>,
}

/// Longest spacing an [`IntervalLimiter`] enforces; larger intervals saturate here.
pub const MAX_INTERVAL: Duration = Duration::from_secs(u32::MAX as u64);

impl IntervalLimiter {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval: interval.min(MAX_INTERVAL),
            next: Mutex::new(None),
        }
    }
}

impl Limiter for IntervalLimiter {
    fn delay(&self) -> Duration {
        let now = Instant::now();
        let mut next = self.next.lock().unwrap_or_else(PoisonError::into_inner);
        let slot = match *next {
            Some(at) if at > now => at,
            _ => now,
        };
        *next = Some(slot.checked_add(self.interval).unwrap_or(slot));
        slot - now
    }
}

/// Waits for the limiter before forwarding each request. No retries, no
/// classification; the request's cancel token aborts the wait with
/// [`Error::Cancelled`] and nothing is sent.
pub struct ThrottledRequester<L, T> {
    limiter: L,
    transport: T,
}

impl<L: Limiter, T: Transport> ThrottledRequester<L, T> {
    pub fn new(limiter: L, transport: T) -> Self {
        Self { limiter, transport }
    }
}

impl<L: Limiter, T: Transport> Transport for ThrottledRequester<L, T> {
    fn send(&self, req: &mut Request) -> Result<Response, Error> {
        let delay = self.limiter.delay();
        if !delay.is_zero() {
            tracing::trace!(?delay, "throttling request");
        }
        req.cancel_token().wait(delay)?;
        self.transport.send(req)
    }
}
