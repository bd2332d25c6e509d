//! Retry loop: run a closure until success, a fatal error, cancellation, or
//! the attempt budget runs out.

use super::error::RetryError;
use super::policy::RetryConfig;

/// Runs `op` up to `attempts + 1` times.
///
/// The cancel token is checked before every attempt. If it is already done,
/// the last operation error is returned, or the token's own error when no
/// attempt has failed yet. A cancellation during a backoff wait also returns
/// the last operation error.
///
/// No backoff wait follows the final attempt; its error is returned at once.
pub fn run_with_retry<T, E, F>(mut config: RetryConfig<'_, E>, mut op: F) -> Result<T, RetryError<E>>
where
    F: FnMut() -> Result<T, E>,
{
    let mut last_err: Option<E> = None;
    let mut tries = 0u32;

    loop {
        if let Some(err) = &last_err {
            (config.on_retry)(tries, err);
        }

        if let Some(cancelled) = config.cancel.error() {
            return Err(match last_err {
                Some(err) => RetryError::Operation(err),
                None => RetryError::Cancelled(cancelled),
            });
        }

        let err = match op() {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };
        tries += 1;

        if !(config.classifier)(&err) {
            tracing::debug!(tries, "error classified as fatal, not retrying");
            return Err(RetryError::Operation(err));
        }
        if tries > config.attempts {
            tracing::debug!(tries, "retry attempts exhausted");
            return Err(RetryError::Operation(err));
        }

        let delay = config.backoff.delay(tries);
        tracing::debug!(tries, ?delay, "attempt failed, backing off");
        if config.cancel.wait(delay).is_err() {
            return Err(RetryError::Operation(err));
        }
        last_err = Some(err);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retry::{Backoff, CancelToken, Cancelled};
    use std::cell::Cell;
    use std::sync::{Arc, Mutex};
    use std::time::{Duration, Instant};

    fn quick<'a, E>() -> RetryConfig<'a, E> {
        RetryConfig::default().backoff(Backoff::none())
    }

    #[test]
    fn first_success_runs_no_hooks() {
        let hooks = Cell::new(0);
        let res: Result<u32, RetryError<String>> = run_with_retry(
            quick().attempts(5).on_retry(|_, _| hooks.set(hooks.get() + 1)).retry_if(|_| {
                panic!("classifier must not run on success")
            }),
            || Ok(7),
        );
        assert_eq!(res.unwrap(), 7);
        assert_eq!(hooks.get(), 0);
    }

    #[test]
    fn success_on_retry() {
        let calls = Cell::new(0);
        let retries = Cell::new(0);
        let res = run_with_retry(
            quick().attempts(5).on_retry(|_, _| retries.set(retries.get() + 1)),
            || {
                calls.set(calls.get() + 1);
                if calls.get() == 2 {
                    Ok(())
                } else {
                    Err(format!("call {}", calls.get()))
                }
            },
        );
        assert!(res.is_ok());
        assert_eq!(calls.get(), 2);
        assert_eq!(retries.get(), 1);
    }

    #[test]
    fn all_failed_runs_attempts_plus_one() {
        let calls = Cell::new(0u32);
        let mut seen = Vec::new();
        let res = run_with_retry(
            quick().attempts(5).on_retry(|try_no, e: &String| seen.push((try_no, e.clone()))),
            || {
                calls.set(calls.get() + 1);
                Err::<(), _>(format!("i={}", calls.get()))
            },
        );
        assert_eq!(calls.get(), 6);
        assert_eq!(res.unwrap_err().into_operation().as_deref(), Some("i=6"));
        assert_eq!(seen.len(), 5);
        assert_eq!(seen[0], (1, "i=1".to_string()));
        assert_eq!(seen[4], (5, "i=5".to_string()));
    }

    #[test]
    fn zero_attempts_runs_once() {
        let calls = Cell::new(0);
        let res = run_with_retry(quick().attempts(0), || {
            calls.set(calls.get() + 1);
            Err::<(), _>("nope")
        });
        assert_eq!(calls.get(), 1);
        assert!(matches!(res, Err(RetryError::Operation("nope"))));
    }

    #[test]
    fn fatal_error_stops_immediately() {
        let calls = Cell::new(0);
        let hooks = Cell::new(0);
        let res = run_with_retry(
            quick()
                .attempts(5)
                .retry_if(|_| false)
                .on_retry(|_, _| hooks.set(hooks.get() + 1)),
            || {
                calls.set(calls.get() + 1);
                Err::<(), _>(format!("try {}", calls.get()))
            },
        );
        assert_eq!(calls.get(), 1);
        assert_eq!(hooks.get(), 0);
        assert_eq!(res.unwrap_err().into_operation().as_deref(), Some("try 1"));
    }

    #[test]
    fn expired_token_prevents_any_attempt() {
        let calls = Cell::new(0);
        let token = CancelToken::with_deadline(Instant::now());
        let res = run_with_retry(
            RetryConfig::default()
                .attempts(5)
                .cancel(token)
                .backoff(Backoff::constant(Duration::from_millis(100))),
            || {
                calls.set(calls.get() + 1);
                Err::<(), _>("boom")
            },
        );
        assert_eq!(calls.get(), 0);
        assert!(matches!(res, Err(RetryError::Cancelled(Cancelled::DeadlineExceeded))));
    }

    #[test]
    fn token_expiring_during_backoff_returns_last_error() {
        let calls = Cell::new(0);
        let token = CancelToken::with_timeout(Duration::from_millis(10));
        let res = run_with_retry(
            RetryConfig::default()
                .attempts(5)
                .cancel(token)
                .backoff(Backoff::constant(Duration::from_millis(500))),
            || {
                calls.set(calls.get() + 1);
                Err::<(), _>(format!("try {}", calls.get()))
            },
        );
        assert_eq!(calls.get(), 1);
        assert_eq!(res.unwrap_err().into_operation().as_deref(), Some("try 1"));
    }

    #[test]
    fn backoff_receives_tries_so_far() {
        let asked = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&asked);
        let _ = run_with_retry(
            RetryConfig::default().attempts(3).backoff(Backoff::custom(move |n| {
                log.lock().unwrap().push(n);
                Duration::ZERO
            })),
            || Err::<(), _>(()),
        );
        // No wait after the final attempt.
        assert_eq!(*asked.lock().unwrap(), vec![1, 2, 3]);
    }
}
