//! Composable HTTP requesters.
//!
//! Everything here implements [`Transport`] and wraps another `Transport`:
//!
//! - [`RetryRequester`]: retries with backoff, classifying attempts with a
//!   [`ResponseTester`] and replaying the request body between attempts.
//! - [`RetryAfterRequester`]: honours a server wait hint (`Retry-After`).
//! - [`ThrottledRequester`]: waits for a [`Limiter`] before each send.
//! - [`LoggingRequester`]: logs requests and responses.
//! - [`CurlTransport`]: the network, via libcurl.
//!
//! Requests meant to be retried are built with [`Request::replayable`] so
//! their body can be sent again byte-for-byte.

mod body;
mod classify;
mod curl_transport;
mod error;
mod headers;
mod logging_requester;
mod request;
mod response;
mod retry_after;
mod retry_requester;
mod tester;
mod throttle;
mod transport;

#[cfg(test)]
pub(crate) mod testing;

pub use body::{Body, BodyError, BodyReader, BodySource, EncodeBody, Json, ReplayFn, SeekRead};
pub use classify::{
    is_transient, is_transient_curl_error, retry_status_tester, strict_response_tester,
    DEFAULT_RETRY_STATUS_CODES,
};
pub use curl_transport::CurlTransport;
pub use error::{reason_phrase, Error, HttpError, ERROR_BODY_LIMIT};
pub use headers::Headers;
pub use logging_requester::LoggingRequester;
pub use request::{BuildError, Request};
pub use response::Response;
pub use retry_after::{RetryAfterRequester, DEFAULT_RETRY_AFTER_STATUS_CODES, RETRY_AFTER};
pub use retry_requester::RetryRequester;
pub use tester::{default_response_tester, Attempt, Outcome, ResponseTester, SharedTester, StatusCodeTester};
pub use throttle::{limiter_fn, FnLimiter, IntervalLimiter, Limiter, ThrottledRequester, MAX_INTERVAL};
pub use transport::{transport_fn, FnTransport, Transport};
