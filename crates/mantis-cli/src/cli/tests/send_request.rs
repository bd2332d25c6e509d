//! Tests for request building and chain assembly in `mantis send`.

use crate::cli::commands::{build_chain, build_request, SendArgs};
use mantis_core::config::MantisConfig;
use std::io::{Read, Write};

fn args(url: &str) -> SendArgs {
    SendArgs {
        url: url.to_string(),
        ..SendArgs::default()
    }
}

#[test]
fn no_body_defaults_to_get() {
    let req = build_request(&args("https://example.com/")).unwrap();
    assert_eq!(req.method(), "GET");
    assert!(req.body().is_empty());
    assert!(req.is_replayable());
}

#[test]
fn data_defaults_to_post_and_is_replayable() {
    let mut a = args("https://example.com/");
    a.data = Some("hello".to_string());
    let mut req = build_request(&a).unwrap();
    assert_eq!(req.method(), "POST");
    assert_eq!(req.body().content_length(), Some(5));

    let mut first = String::new();
    req.body_mut().read_to_string(&mut first).unwrap();
    req.replay_body();
    let mut second = String::new();
    req.body_mut().read_to_string(&mut second).unwrap();
    assert_eq!(first, "hello");
    assert_eq!(second, "hello");
}

#[test]
fn explicit_method_and_headers() {
    let mut a = args("https://example.com/");
    a.method = Some("delete".to_string());
    a.headers = vec!["X-Request-Id: 42".to_string()];
    let req = build_request(&a).unwrap();
    assert_eq!(req.method(), "DELETE");
    assert_eq!(req.headers().get("x-request-id"), Some("42"));
}

#[test]
fn malformed_header_is_rejected() {
    let mut a = args("https://example.com/");
    a.headers = vec!["no colon here".to_string()];
    let err = build_request(&a).unwrap_err();
    assert!(err.to_string().contains("invalid header"));
}

#[test]
fn invalid_url_is_rejected() {
    let err = build_request(&args("not a url")).unwrap_err();
    assert!(err.to_string().starts_with("build request for"));
}

#[test]
fn data_file_body_uses_file_length() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(b"from disk").unwrap();
    let mut a = args("https://example.com/");
    a.data_file = Some(file.path().to_path_buf());
    let req = build_request(&a).unwrap();
    assert_eq!(req.method(), "POST");
    assert_eq!(req.body().content_length(), Some(9));
}

#[test]
fn missing_data_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let mut a = args("https://example.com/");
    a.data_file = Some(dir.path().join("absent"));
    let err = build_request(&a).unwrap_err();
    assert!(err.to_string().starts_with("open "));
}

#[test]
fn chain_builds_with_all_layers() {
    let mut cfg = MantisConfig::default();
    cfg.retry_after.enabled = true;
    cfg.throttle.interval_ms = Some(10);
    let _chain = build_chain(&cfg);
}
