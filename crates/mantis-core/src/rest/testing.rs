//! Recording fake transport for requester tests.

use super::error::Error;
use super::headers::Headers;
use super::request::Request;
use super::response::Response;
use super::transport::Transport;
use std::io::Read;
use std::sync::Mutex;
use std::time::Instant;

/// Scripted reply: a response or a transport error.
#[derive(Debug, Clone)]
pub(crate) struct FakeResponse {
    status: u16,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
    error: Option<String>,
}

impl FakeResponse {
    pub(crate) fn status(status: u16) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: Vec::new(),
            error: None,
        }
    }

    pub(crate) fn error(msg: &str) -> Self {
        Self {
            error: Some(msg.to_string()),
            ..Self::status(0)
        }
    }

    pub(crate) fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub(crate) fn body(mut self, body: &str) -> Self {
        self.body = body.as_bytes().to_vec();
        self
    }

    fn make(&self) -> Result<Response, Error> {
        if let Some(msg) = &self.error {
            return Err(Error::transport(msg.clone()));
        }
        let mut resp = Response::new(self.status).with_body(self.body.clone());
        for (k, v) in &self.headers {
            resp = resp.with_header(k.clone(), v.clone());
        }
        Ok(resp)
    }
}

/// What the fake saw for one send.
#[derive(Debug, Clone)]
pub(crate) struct Sent {
    pub at: Instant,
    pub try_count: u32,
    pub headers: Headers,
    pub body: Vec<u8>,
}

/// Replies with the scripted responses in order, starting over after the last.
pub(crate) struct FakeTransport {
    responses: Vec<FakeResponse>,
    sent: Mutex<Vec<Sent>>,
}

impl FakeTransport {
    pub(crate) fn new(responses: Vec<FakeResponse>) -> Self {
        assert!(!responses.is_empty(), "fake transport needs at least one response");
        Self {
            responses,
            sent: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }
}

impl Transport for FakeTransport {
    fn send(&self, req: &mut Request) -> Result<Response, Error> {
        let at = Instant::now();
        let mut body = Vec::new();
        let read = req.body_mut().read_to_end(&mut body);
        let mut sent = self.sent.lock().unwrap();
        sent.push(Sent {
            at,
            try_count: req.try_count(),
            headers: req.headers().clone(),
            body,
        });
        read?;
        let idx = (sent.len() - 1) % self.responses.len();
        self.responses[idx].make()
    }
}

/// POST request with a replayable text body.
pub(crate) fn fake_request(body: &str) -> Request {
    Request::replayable("POST", "http://example.com", body.to_string()).unwrap()
}
