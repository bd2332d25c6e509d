use super::error::Error;
use super::request::Request;
use super::response::Response;
use super::transport::Transport;
use std::time::Instant;

/// Logs every request and its outcome through `tracing`, including the try
/// count stamped by [`RetryRequester`](super::RetryRequester).
pub struct LoggingRequester<T> {
    transport: T,
}

impl<T: Transport> LoggingRequester<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }
}

impl<T: Transport> Transport for LoggingRequester<T> {
    fn send(&self, req: &mut Request) -> Result<Response, Error> {
        tracing::debug!(
            method = req.method(),
            url = %req.url(),
            try_count = req.try_count(),
            content_length = ?req.body().content_length(),
            "sending request"
        );
        let t0 = Instant::now();
        match self.transport.send(req) {
            Ok(resp) => {
                tracing::debug!(
                    method = req.method(),
                    url = %req.url(),
                    try_count = req.try_count(),
                    status = resp.status(),
                    elapsed = ?t0.elapsed(),
                    "received response"
                );
                Ok(resp)
            }
            Err(err) => {
                tracing::warn!(
                    method = req.method(),
                    url = %req.url(),
                    try_count = req.try_count(),
                    elapsed = ?t0.elapsed(),
                    "request failed: {}",
                    err
                );
                Err(err)
            }
        }
    }
}
