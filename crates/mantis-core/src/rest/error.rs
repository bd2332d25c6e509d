//! Error types for HTTP requesters.

use super::headers::Headers;
use super::response::Response;
use crate::retry::Cancelled;
use std::fmt;
use std::io::{self, Read};

/// Default cap on body bytes captured by [`HttpError::from_response`] (1 MB).
pub const ERROR_BODY_LIMIT: u64 = 1_000_000;

/// Error returned by a [`Transport`](super::Transport) or a requester.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The underlying transport failed before producing a response.
    #[error("transport: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),
    /// A response was turned into an error by a response tester.
    #[error(transparent)]
    Http(#[from] HttpError),
    /// The request's cancel token finished while waiting.
    #[error(transparent)]
    Cancelled(#[from] Cancelled),
    /// Reading the request or response body failed.
    #[error("io: {0}")]
    Io(#[from] io::Error),
    /// libcurl reported an error (timeout, connection, etc.).
    #[error("curl: {0}")]
    Curl(#[from] curl::Error),
}

impl Error {
    pub fn transport<E>(err: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Error::Transport(err.into())
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled(_))
    }
}

/// An HTTP response converted into an error: status, headers and a bounded
/// prefix of the body.
#[derive(Debug, Clone)]
pub struct HttpError {
    status: u16,
    headers: Headers,
    body: Vec<u8>,
}

impl HttpError {
    /// Reads up to `limit` body bytes (`0` = no limit) and closes the response.
    /// A failed read yields an error without body bytes.
    pub fn from_response(mut resp: Response, limit: u64) -> Self {
        let mut body = Vec::new();
        let read = if limit == 0 {
            resp.body_mut().read_to_end(&mut body)
        } else {
            resp.body_mut().take(limit).read_to_end(&mut body)
        };
        if let Err(e) = read {
            tracing::debug!(status = resp.status(), "error body unreadable: {}", e);
            body.clear();
        }
        resp.close();
        Self {
            status: resp.status(),
            headers: resp.headers().clone(),
            body,
        }
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }
}

impl fmt::Display for HttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "http: {} {}", self.status, reason_phrase(self.status))?;
        if !self.body.is_empty() {
            write!(f, "; {}", String::from_utf8_lossy(&self.body))?;
        }
        Ok(())
    }
}

impl std::error::Error for HttpError {}

/// Canonical reason phrase for common status codes; empty when unknown.
pub fn reason_phrase(status: u16) -> &'static str {
    match status {
        100 => "Continue",
        101 => "Switching Protocols",
        200 => "OK",
        201 => "Created",
        202 => "Accepted",
        204 => "No Content",
        206 => "Partial Content",
        301 => "Moved Permanently",
        302 => "Found",
        303 => "See Other",
        304 => "Not Modified",
        307 => "Temporary Redirect",
        308 => "Permanent Redirect",
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        405 => "Method Not Allowed",
        408 => "Request Timeout",
        409 => "Conflict",
        410 => "Gone",
        412 => "Precondition Failed",
        413 => "Payload Too Large",
        415 => "Unsupported Media Type",
        422 => "Unprocessable Entity",
        429 => "Too Many Requests",
        500 => "Internal Server Error",
        501 => "Not Implemented",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        504 => "Gateway Timeout",
        _ => "",
    }
}
