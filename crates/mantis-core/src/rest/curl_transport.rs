//! Blocking HTTP transport over libcurl.
//!
//! One `Easy` handle per send. The request body is streamed through curl's
//! read callback so replayed bodies are read fresh on every attempt.

use super::error::Error;
use super::headers::Headers;
use super::request::Request;
use super::response::Response;
use super::transport::Transport;
use curl::easy::{Easy, List, ReadError};
use std::io::{self, Read};
use std::str;
use std::time::Duration;

/// libcurl-backed [`Transport`].
#[derive(Debug, Clone, Copy)]
pub struct CurlTransport {
    pub connect_timeout: Duration,
    pub timeout: Duration,
    pub follow_redirects: bool,
}

impl Default for CurlTransport {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(30),
            timeout: Duration::from_secs(300),
            follow_redirects: true,
        }
    }
}

impl CurlTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connect_timeout(mut self, d: Duration) -> Self {
        self.connect_timeout = d;
        self
    }

    pub fn timeout(mut self, d: Duration) -> Self {
        self.timeout = d;
        self
    }

    pub fn follow_redirects(mut self, follow: bool) -> Self {
        self.follow_redirects = follow;
        self
    }

    fn configure(&self, easy: &mut Easy, req: &Request) -> Result<(), curl::Error> {
        easy.url(req.url().as_str())?;
        easy.follow_location(self.follow_redirects)?;
        easy.connect_timeout(self.connect_timeout)?;
        easy.timeout(self.timeout)?;

        let has_body = !req.body().is_empty();
        let len = req.body().content_length();
        match req.method() {
            "GET" if !has_body => easy.get(true)?,
            "HEAD" => easy.nobody(true)?,
            "POST" => {
                easy.post(true)?;
                if let Some(len) = len {
                    easy.post_field_size(len)?;
                }
            }
            method => {
                if has_body {
                    easy.upload(true)?;
                    if let Some(len) = len {
                        easy.in_filesize(len)?;
                    }
                }
                easy.custom_request(method)?;
            }
        }

        let mut list = List::new();
        for (k, v) in req.headers().iter() {
            list.append(&format!("{}: {}", k.trim(), v.trim()))?;
        }
        if has_body {
            // No 100-continue round trip; the body is already in hand.
            list.append("Expect:")?;
            if len.is_none() && req.headers().get("Transfer-Encoding").is_none() {
                list.append("Transfer-Encoding: chunked")?;
            }
        }
        easy.http_headers(list)?;
        Ok(())
    }
}

impl Transport for CurlTransport {
    fn send(&self, req: &mut Request) -> Result<Response, Error> {
        let mut easy = Easy::new();
        self.configure(&mut easy, req)?;

        let mut header_lines: Vec<String> = Vec::new();
        let mut body = Vec::new();
        let mut read_error: Option<io::Error> = None;

        let performed = {
            let request_body = req.body_mut();
            let mut transfer = easy.transfer();
            transfer.read_function(|into| match request_body.read(into) {
                Ok(n) => Ok(n),
                Err(e) => {
                    read_error = Some(e);
                    Err(ReadError::Abort)
                }
            })?;
            transfer.header_function(|data| {
                if let Ok(s) = str::from_utf8(data) {
                    header_lines.push(s.trim_end().to_string());
                }
                true
            })?;
            transfer.write_function(|data| {
                body.extend_from_slice(data);
                Ok(data.len())
            })?;
            transfer.perform()
        };
        if let Err(e) = performed {
            if let Some(io_err) = read_error {
                return Err(Error::Io(io_err));
            }
            return Err(Error::Curl(e));
        }

        let status = easy.response_code()?;
        let status = u16::try_from(status)
            .map_err(|_| Error::transport(format!("invalid status code {}", status)))?;
        Ok(Response::new(status)
            .with_headers(parse_final_headers(&header_lines))
            .with_body(body))
    }
}

/// Headers of the last response in `lines`; earlier blocks belong to
/// redirects or interim `1xx` responses.
fn parse_final_headers(lines: &[String]) -> Headers {
    let mut headers = Headers::new();
    for line in lines {
        if line.starts_with("HTTP/") {
            headers = Headers::new();
            continue;
        }
        if let Some((k, v)) = Headers::parse_line(line) {
            headers.append(k, v);
        }
    }
    headers
}
