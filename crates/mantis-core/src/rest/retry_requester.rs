use super::error::Error;
use super::request::Request;
use super::response::Response;
use super::tester::{default_response_tester, Outcome, ResponseTester, SharedTester};
use super::transport::Transport;
use crate::retry::{Backoff, DEFAULT_ATTEMPTS};
use std::sync::Arc;

/// Sends a request with retries, waiting per `backoff` between attempts and
/// replaying the body before each resend.
///
/// A body that was already read when `send` is called (for example by an
/// outer [`RetryAfterRequester`](super::RetryAfterRequester) resending the
/// same request) is replayed before the first attempt.
///
/// Attempts are classified by the response tester: success returns the
/// response, a fatal error returns the error, anything else is retried until
/// `attempts` retries are used up, at which point the last response or
/// transport error is returned as-is. The request's cancel token interrupts
/// the backoff wait with [`Error::Cancelled`].
///
/// # Panics
///
/// `send` panics if the request body is not replayable.
pub struct RetryRequester<T> {
    attempts: u32,
    backoff: Backoff,
    tester: SharedTester,
    transport: T,
}

impl<T: Transport> RetryRequester<T> {
    /// Ten retries, no wait between attempts, success on `[200, 400)`.
    pub fn new(transport: T) -> Self {
        Self {
            attempts: DEFAULT_ATTEMPTS,
            backoff: Backoff::none(),
            tester: Arc::new(default_response_tester),
            transport,
        }
    }

    /// Retries beyond the first attempt.
    pub fn attempts(mut self, attempts: u32) -> Self {
        self.attempts = attempts;
        self
    }

    pub fn backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn tester(mut self, tester: impl ResponseTester + Send + Sync + 'static) -> Self {
        self.tester = Arc::new(tester);
        self
    }
}

impl<T: Transport> Transport for RetryRequester<T> {
    fn send(&self, req: &mut Request) -> Result<Response, Error> {
        req.assert_replayable();
        // An outer requester may hand over a body an earlier send already read.
        if req.body().is_consumed() {
            req.replay_body();
        }
        let cancel = req.cancel_token().clone();

        let mut i = 0u32;
        loop {
            req.set_try_count(i);
            let attempt = match self.tester.test(self.transport.send(req)) {
                Outcome::Success(resp) => return Ok(resp),
                Outcome::Fatal(err) => {
                    tracing::debug!(try_count = i, "request failed fatally: {}", err);
                    return Err(err);
                }
                Outcome::Retry(attempt) => attempt,
            };
            if i >= self.attempts {
                tracing::debug!(try_count = i, "retry attempts exhausted");
                return attempt;
            }

            match attempt {
                Ok(mut resp) => {
                    tracing::debug!(try_count = i, status = resp.status(), "retryable response");
                    resp.close();
                }
                Err(err) => tracing::debug!(try_count = i, "retryable transport error: {}", err),
            }

            cancel.wait(self.backoff.delay(i + 1))?;
            req.replay_body();
            i += 1;
        }
    }
}
