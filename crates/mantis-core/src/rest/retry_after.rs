use super::error::Error;
use super::request::Request;
use super::response::Response;
use super::transport::Transport;
use std::collections::HashSet;
use std::time::Duration;

/// Default header carrying the server's wait hint, in whole seconds.
pub const RETRY_AFTER: &str = "Retry-After";

/// Status codes that trigger a wait when left unconfigured.
pub const DEFAULT_RETRY_AFTER_STATUS_CODES: [u16; 1] = [429];

/// Resends a request whenever the server answers with a trigger status and a
/// wait hint, for as long as the server keeps doing so.
///
/// Responses with another status, without the header, or with a value that
/// is not a non-negative number of seconds are returned as they are. The
/// request's cancel token interrupts the wait with [`Error::Cancelled`].
///
/// The request is resent without replaying its body itself. Sent straight to
/// a transport, a resend therefore carries whatever the first send left
/// unread. Put a [`RetryRequester`](super::RetryRequester) underneath to get a
/// full body on every resend: it rewinds a consumed body before its first
/// attempt. Its tester should pass the trigger statuses through as successes
/// so they reach this requester instead of being retried blindly.
///
/// # Panics
///
/// `send` panics if the request body is not replayable.
pub struct RetryAfterRequester<T> {
    status_codes: HashSet<u16>,
    header: String,
    transport: T,
}

impl<T: Transport> RetryAfterRequester<T> {
    pub fn new(transport: T) -> Self {
        Self {
            status_codes: DEFAULT_RETRY_AFTER_STATUS_CODES.into_iter().collect(),
            header: RETRY_AFTER.to_string(),
            transport,
        }
    }

    /// Replace the trigger status codes. An empty set keeps the default.
    pub fn status_codes(mut self, codes: impl IntoIterator<Item = u16>) -> Self {
        let codes: HashSet<u16> = codes.into_iter().collect();
        if !codes.is_empty() {
            self.status_codes = codes;
        }
        self
    }

    /// Header to read the delay from. An empty name keeps the default.
    pub fn header(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        if !name.is_empty() {
            self.header = name;
        }
        self
    }

    /// The wait requested by `resp`, if it should be retried at all.
    fn requested_delay(&self, resp: &Response) -> Option<Duration> {
        if !self.status_codes.contains(&resp.status()) {
            return None;
        }
        let value = resp.header(&self.header)?;
        match parse_delay(value) {
            Some(d) => Some(d),
            None => {
                tracing::warn!(
                    status = resp.status(),
                    header = %self.header,
                    value,
                    "malformed wait hint, not retrying"
                );
                None
            }
        }
    }
}

/// Whole non-negative seconds.
fn parse_delay(value: &str) -> Option<Duration> {
    value.trim().parse::<u64>().ok().map(Duration::from_secs)
}

impl<T: Transport> Transport for RetryAfterRequester<T> {
    fn send(&self, req: &mut Request) -> Result<Response, Error> {
        req.assert_replayable();
        let cancel = req.cancel_token().clone();
        loop {
            let mut resp = self.transport.send(req)?;
            let Some(delay) = self.requested_delay(&resp) else {
                return Ok(resp);
            };
            tracing::debug!(status = resp.status(), ?delay, "server asked to retry later");
            resp.close();
            cancel.wait(delay)?;
        }
    }
}
