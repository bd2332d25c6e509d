use rand::Rng;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Largest exponent used by [`Backoff::ExponentialRandom`]; keeps `2^cap` inside a `u64`.
const MAX_EXPONENT_CAP: u32 = 62;

/// Wait strategy between attempts.
///
/// `delay` takes the 1-based try number of the attempt that just failed.
/// Callers never ask for attempt 0; the strategies still answer it
/// (constant: the delay, exponential: zero).
#[derive(Clone)]
pub enum Backoff {
    /// Same delay for every attempt.
    Constant(Duration),
    /// Exponential backoff with full jitter: `unit * RAND[0, 2^min(n, max_exponent))`.
    ExponentialRandom { unit: Duration, max_exponent: u32 },
    /// Caller-supplied strategy.
    Custom(Arc<dyn Fn(u32) -> Duration + Send + Sync>),
}

impl Backoff {
    pub fn constant(delay: Duration) -> Self {
        Backoff::Constant(delay)
    }

    /// No wait at all between attempts.
    pub fn none() -> Self {
        Backoff::Constant(Duration::ZERO)
    }

    pub fn exponential_random(unit: Duration, max_exponent: u32) -> Self {
        Backoff::ExponentialRandom { unit, max_exponent }
    }

    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(u32) -> Duration + Send + Sync + 'static,
    {
        Backoff::Custom(Arc::new(f))
    }

    /// Delay to wait after the `attempt`-th failed try.
    pub fn delay(&self, attempt: u32) -> Duration {
        match self {
            Backoff::Constant(d) => *d,
            Backoff::ExponentialRandom { unit, max_exponent } => {
                if attempt == 0 {
                    return Duration::ZERO;
                }
                let cap = attempt.min(*max_exponent).min(MAX_EXPONENT_CAP);
                let slots = 1u64 << cap;
                let r = rand::thread_rng().gen_range(0..slots);
                scale(*unit, r)
            }
            Backoff::Custom(f) => f(attempt),
        }
    }
}

/// `unit * factor`, saturating at `u64::MAX` nanoseconds.
fn scale(unit: Duration, factor: u64) -> Duration {
    let nanos = unit.as_nanos().saturating_mul(u128::from(factor));
    Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
}

impl Default for Backoff {
    fn default() -> Self {
        Backoff::Constant(super::DEFAULT_BACKOFF)
    }
}

impl fmt::Debug for Backoff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backoff::Constant(d) => f.debug_tuple("Constant").field(d).finish(),
            Backoff::ExponentialRandom { unit, max_exponent } => f
                .debug_struct("ExponentialRandom")
                .field("unit", unit)
                .field("max_exponent", max_exponent)
                .finish(),
            Backoff::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}
