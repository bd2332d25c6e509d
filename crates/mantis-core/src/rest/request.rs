use super::body::{Body, BodyError, BodySource};
use super::headers::Headers;
use crate::retry::CancelToken;
use std::fmt;
use url::Url;

/// Failure to construct a [`Request`].
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error(transparent)]
    Body(#[from] BodyError),
}

impl BuildError {
    pub fn is_not_replayable(&self) -> bool {
        matches!(self, BuildError::Body(BodyError::NotReplayable))
    }
}

/// An outgoing HTTP request.
///
/// Besides method, URL, headers and body, a request carries the cancel token
/// that interrupts requester waits and the try count of the current attempt
/// (0 for the first), which transports and loggers can read.
pub struct Request {
    method: String,
    url: Url,
    headers: Headers,
    body: Body,
    cancel: CancelToken,
    try_count: u32,
}

impl Request {
    /// A request without a body.
    pub fn new(method: &str, url: &str) -> Result<Self, BuildError> {
        Ok(Self {
            method: method.to_ascii_uppercase(),
            url: Url::parse(url)?,
            headers: Headers::new(),
            body: Body::empty(),
            cancel: CancelToken::never(),
            try_count: 0,
        })
    }

    /// A request whose body can be replayed on retries.
    ///
    /// Fails with a not-replayable error for [`BodySource::Unbounded`]; no
    /// request is constructed in that case.
    pub fn replayable(
        method: &str,
        url: &str,
        source: impl Into<BodySource>,
    ) -> Result<Self, BuildError> {
        let mut req = Self::new(method, url)?;
        req.body = Body::from_source(source.into())?;
        Ok(req)
    }

    pub fn with_body(mut self, body: Body) -> Self {
        self.body = body;
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.append(name, value);
        self
    }

    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut Headers {
        &mut self.headers
    }

    pub fn body(&self) -> &Body {
        &self.body
    }

    pub fn body_mut(&mut self) -> &mut Body {
        &mut self.body
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    /// Zero-based attempt number of the current send.
    pub fn try_count(&self) -> u32 {
        self.try_count
    }

    pub fn set_try_count(&mut self, try_count: u32) {
        self.try_count = try_count;
    }

    /// See [`Body::replay`].
    pub fn replay_body(&mut self) {
        self.body.replay();
    }

    pub fn is_replayable(&self) -> bool {
        self.body.is_replayable()
    }

    /// Panics if the body is non-empty and cannot be replayed.
    ///
    /// Retrying such a request would send a consumed or partial body on the
    /// next attempt, so this is treated as a programming error.
    pub fn assert_replayable(&self) {
        if !self.is_replayable() {
            panic!(
                "mantis/rest: request with non-empty body is not retryable ({} {}); build it with Request::replayable",
                self.method, self.url
            );
        }
    }
}

impl fmt::Debug for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request")
            .field("method", &self.method)
            .field("url", &self.url.as_str())
            .field("headers", &self.headers)
            .field("body", &self.body)
            .field("try_count", &self.try_count)
            .finish()
    }
}
