//! `mantis send` – one request through the throttle, Retry-After, retry and logging layers.

use anyhow::{anyhow, Context, Result};
use mantis_core::config::MantisConfig;
use mantis_core::rest::{
    reason_phrase, BodySource, Headers, LoggingRequester, Request, RetryAfterRequester,
    RetryRequester, ThrottledRequester, Transport,
};
use std::fs::File;
use std::io;
use std::path::PathBuf;

#[derive(Debug, Clone, Default)]
pub struct SendArgs {
    pub url: String,
    pub method: Option<String>,
    pub data: Option<String>,
    pub data_file: Option<PathBuf>,
    pub headers: Vec<String>,
}

pub fn run_send(cfg: &MantisConfig, args: SendArgs) -> Result<()> {
    let mut req = build_request(&args)?;
    let chain = build_chain(cfg);
    let mut resp = chain
        .send(&mut req)
        .with_context(|| format!("{} {}", req.method(), req.url()))?;

    let status = resp.status();
    eprintln!("HTTP {} {}", status, reason_phrase(status));
    let mut out = io::stdout().lock();
    io::copy(resp.body_mut(), &mut out).context("read response body")?;
    Ok(())
}

/// Builds a replayable request. A body makes the method default to POST.
pub fn build_request(args: &SendArgs) -> Result<Request> {
    let source = match (&args.data, &args.data_file) {
        (_, Some(path)) => {
            let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
            BodySource::seekable(file)
        }
        (Some(data), None) => BodySource::from(data.as_str()),
        (None, None) => BodySource::Empty,
    };
    let has_body = args.data.is_some() || args.data_file.is_some();
    let method = args
        .method
        .as_deref()
        .unwrap_or(if has_body { "POST" } else { "GET" });

    let mut req = Request::replayable(method, &args.url, source)
        .with_context(|| format!("build request for {}", args.url))?;
    for raw in &args.headers {
        let (name, value) = Headers::parse_line(raw)
            .ok_or_else(|| anyhow!("invalid header {:?}, expected 'Name: value'", raw))?;
        req = req.with_header(name, value);
    }
    Ok(req)
}

/// Throttle? → RetryAfter? → Retry → Logging → curl.
pub fn build_chain(cfg: &MantisConfig) -> Box<dyn Transport> {
    let retry = RetryRequester::new(LoggingRequester::new(cfg.transport.curl()))
        .attempts(cfg.retry.attempts)
        .backoff(cfg.retry.backoff())
        .tester(cfg.retry_tester());
    let mut chain: Box<dyn Transport> = Box::new(retry);
    if cfg.retry_after.enabled {
        chain = Box::new(
            RetryAfterRequester::new(chain)
                .status_codes(cfg.retry_after.status_codes.iter().copied())
                .header(cfg.retry_after.header.clone()),
        );
    }
    if let Some(interval) = cfg.throttle.interval() {
        chain = Box::new(ThrottledRequester::new(interval, chain));
    }
    chain
}
