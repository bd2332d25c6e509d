//! Response testers: decide whether an attempt succeeded, should be retried,
//! or failed fatally.

use super::error::{Error, HttpError, ERROR_BODY_LIMIT};
use super::response::Response;
use std::collections::HashMap;
use std::sync::Arc;

/// Result of one send: a response or a transport error.
pub type Attempt = Result<Response, Error>;

/// Classification of an [`Attempt`]. Exactly one case holds.
#[derive(Debug)]
pub enum Outcome {
    /// Return this response to the caller.
    Success(Response),
    /// Try again; carries the attempt so it can be released or returned when
    /// the attempt budget runs out.
    Retry(Attempt),
    /// Stop and return this error.
    Fatal(Error),
}

/// Classifies attempts for [`RetryRequester`](super::RetryRequester).
pub trait ResponseTester {
    fn test(&self, attempt: Attempt) -> Outcome;
}

impl<F> ResponseTester for F
where
    F: Fn(Attempt) -> Outcome,
{
    fn test(&self, attempt: Attempt) -> Outcome {
        self(attempt)
    }
}

/// Shared, thread-safe tester handle.
pub type SharedTester = Arc<dyn ResponseTester + Send + Sync>;

/// Success for status codes in `[200, 400)`, retry for any other status.
/// Transport errors are fatal.
pub fn default_response_tester(attempt: Attempt) -> Outcome {
    match attempt {
        Err(e) => Outcome::Fatal(e),
        Ok(resp) if resp.is_success() => Outcome::Success(resp),
        Ok(resp) => Outcome::Retry(Ok(resp)),
    }
}

/// Tester with explicit per-status decisions.
///
/// - Transport error: delegated to the base tester, else fatal.
/// - Status in the map: success (`true`) or retry (`false`), never an error.
/// - Any other status: delegated to the base tester; without one the response
///   is converted into a fatal [`HttpError`] capturing up to `body_limit`
///   body bytes.
#[derive(Clone)]
pub struct StatusCodeTester {
    base: Option<SharedTester>,
    codes: HashMap<u16, bool>,
    body_limit: u64,
}

impl StatusCodeTester {
    pub fn new(codes: impl IntoIterator<Item = (u16, bool)>) -> Self {
        Self {
            base: None,
            codes: codes.into_iter().collect(),
            body_limit: ERROR_BODY_LIMIT,
        }
    }

    /// Delegate unmatched statuses and transport errors to `base`.
    pub fn with_base(mut self, base: impl ResponseTester + Send + Sync + 'static) -> Self {
        self.base = Some(Arc::new(base));
        self
    }

    pub fn with_body_limit(mut self, limit: u64) -> Self {
        self.body_limit = limit;
        self
    }

    /// Mark `codes` as retryable.
    pub fn retry_on(mut self, codes: impl IntoIterator<Item = u16>) -> Self {
        self.codes.extend(codes.into_iter().map(|c| (c, false)));
        self
    }

    /// Mark `codes` as successful.
    pub fn succeed_on(mut self, codes: impl IntoIterator<Item = u16>) -> Self {
        self.codes.extend(codes.into_iter().map(|c| (c, true)));
        self
    }
}

impl ResponseTester for StatusCodeTester {
    fn test(&self, attempt: Attempt) -> Outcome {
        let resp = match attempt {
            Err(e) => {
                return match &self.base {
                    Some(base) => base.test(Err(e)),
                    None => Outcome::Fatal(e),
                };
            }
            Ok(resp) => resp,
        };
        match self.codes.get(&resp.status()) {
            Some(true) => Outcome::Success(resp),
            Some(false) => Outcome::Retry(Ok(resp)),
            None => match &self.base {
                Some(base) => base.test(Ok(resp)),
                None => Outcome::Fatal(HttpError::from_response(resp, self.body_limit).into()),
            },
        }
    }
}
