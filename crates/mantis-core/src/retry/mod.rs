//! Generic retry executor.
//!
//! Runs any fallible closure with a bounded number of retries, a backoff
//! strategy between attempts, an error classifier deciding which failures
//! are worth another try, and a cancellation token that interrupts both the
//! attempt loop and the waits. The HTTP requesters in [`crate::rest`] reuse
//! the backoff and cancellation pieces.

mod backoff;
mod cancel;
mod error;
mod policy;
mod run;

use std::time::Duration;

/// Retries beyond the first attempt when left unconfigured.
pub const DEFAULT_ATTEMPTS: u32 = 10;

/// Wait between attempts when left unconfigured.
pub const DEFAULT_BACKOFF: Duration = Duration::from_millis(100);

pub use backoff::Backoff;
pub use cancel::{CancelToken, Cancelled};
pub use error::RetryError;
pub use policy::RetryConfig;
pub use run::run_with_retry;
