//! Classify curl errors and HTTP statuses for retry decisions.

use super::error::{Error, HttpError, ERROR_BODY_LIMIT};
use super::tester::{Attempt, Outcome, StatusCodeTester};

/// Statuses worth retrying when nothing else is configured: throttling and
/// transient server-side failures.
pub const DEFAULT_RETRY_STATUS_CODES: [u16; 5] = [429, 500, 502, 503, 504];

/// True for curl failures that a later attempt may not hit (timeouts,
/// connection and DNS trouble, dropped transfers).
pub fn is_transient_curl_error(e: &curl::Error) -> bool {
    e.is_operation_timedout()
        || e.is_couldnt_connect()
        || e.is_couldnt_resolve_host()
        || e.is_couldnt_resolve_proxy()
        || e.is_read_error()
        || e.is_recv_error()
        || e.is_send_error()
        || e.is_got_nothing()
}

/// True for transport errors worth another attempt.
pub fn is_transient(err: &Error) -> bool {
    match err {
        Error::Curl(e) => is_transient_curl_error(e),
        _ => false,
    }
}

/// Strict classification used when no explicit code applies: success on
/// `[200, 400)`, retry on transient transport errors, and a fatal
/// [`HttpError`] for anything else.
pub fn strict_response_tester(attempt: Attempt) -> Outcome {
    match attempt {
        Ok(resp) if resp.is_success() => Outcome::Success(resp),
        Ok(resp) => Outcome::Fatal(HttpError::from_response(resp, ERROR_BODY_LIMIT).into()),
        Err(e) if is_transient(&e) => Outcome::Retry(Err(e)),
        Err(e) => Outcome::Fatal(e),
    }
}

/// Tester retrying `codes` and transient transport errors; every other
/// failure stops the retry loop.
pub fn retry_status_tester(codes: impl IntoIterator<Item = u16>) -> StatusCodeTester {
    StatusCodeTester::new(std::iter::empty())
        .retry_on(codes)
        .with_base(strict_response_tester)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rest::{Response, ResponseTester};

    // libcurl result codes.
    const OPERATION_TIMEDOUT: u32 = 28;
    const COULDNT_CONNECT: u32 = 7;
    const GOT_NOTHING: u32 = 52;
    const URL_MALFORMAT: u32 = 3;

    fn curl_error(code: u32) -> curl::Error {
        curl::Error::new(code as _)
    }

    #[test]
    fn curl_timeouts_and_connection_errors_are_transient() {
        assert!(is_transient_curl_error(&curl_error(OPERATION_TIMEDOUT)));
        assert!(is_transient_curl_error(&curl_error(COULDNT_CONNECT)));
        assert!(is_transient_curl_error(&curl_error(GOT_NOTHING)));
        assert!(!is_transient_curl_error(&curl_error(URL_MALFORMAT)));
    }

    #[test]
    fn http_429_and_503_retried() {
        let t = retry_status_tester(DEFAULT_RETRY_STATUS_CODES);
        assert!(matches!(t.test(Ok(Response::new(429))), Outcome::Retry(_)));
        assert!(matches!(t.test(Ok(Response::new(503))), Outcome::Retry(_)));
    }

    #[test]
    fn http_4xx_fatal() {
        let t = retry_status_tester(DEFAULT_RETRY_STATUS_CODES);
        assert!(matches!(t.test(Ok(Response::new(404))), Outcome::Fatal(Error::Http(_))));
        assert!(matches!(t.test(Ok(Response::new(403))), Outcome::Fatal(Error::Http(_))));
    }

    #[test]
    fn success_passes() {
        let t = retry_status_tester(DEFAULT_RETRY_STATUS_CODES);
        assert!(matches!(t.test(Ok(Response::new(204))), Outcome::Success(_)));
    }

    #[test]
    fn transient_transport_error_retried() {
        let t = retry_status_tester(Vec::new());
        let e = Error::Curl(curl_error(COULDNT_CONNECT));
        assert!(matches!(t.test(Err(e)), Outcome::Retry(Err(_))));
        let e = Error::transport("bad certificate");
        assert!(matches!(t.test(Err(e)), Outcome::Fatal(_)));
    }
}
