//! Blocking HTTP fetch against local servers

use std::time::{Duration, Instant};

use axum::http::StatusCode;
use trustdoc_core::FetchConfig;
use trustdoc_document::{
    DocumentError, DocumentSource, HttpSource, TrustDocument, TrustDocumentFetcher,
    TrustDocumentVerifier,
};

use crate::test_utils::{
    closed_url, hung_listener, init_tracing, issue_for, test_root_key, TestHttpServer,
};

fn fetch_config(timeout_ms: u64) -> FetchConfig {
    FetchConfig {
        timeout_ms,
        use_system_proxy: false,
        ..FetchConfig::default()
    }
}

#[test]
fn test_http_document_verifies() {
    init_tracing();
    let server = TestHttpServer::bind();
    let url = server.url("/trust.asc");
    let key = test_root_key("http");
    server.serve_text("/trust.asc", StatusCode::OK, issue_for(&key, &[url.as_str()]));

    let fetcher = TrustDocumentFetcher::from_config(&fetch_config(5_000)).unwrap();
    let mut doc = TrustDocument::new([url.as_str()]).unwrap();
    doc.load(&fetcher).unwrap();
    doc.validate(&TrustDocumentVerifier::new()).unwrap();

    assert!(doc.is_verified());
    assert_eq!(doc.resolved_url(), Some(url.as_str()));
}

#[test]
fn test_hung_mirror_times_out_and_next_wins() {
    init_tracing();
    let (hung, hung_url) = hung_listener("/trust.asc");

    let live = TestHttpServer::bind();
    let live_url = live.url("/trust.asc");
    live.serve_text("/trust.asc", StatusCode::OK, "body");

    let fetcher = TrustDocumentFetcher::from_config(&fetch_config(300)).unwrap();
    let started = Instant::now();
    let fetched = fetcher.fetch(&[hung_url.as_str(), live_url.as_str()]).unwrap();

    assert_eq!(fetched.resolved_url, live_url);
    assert_eq!(fetched.bytes, b"body");
    assert!(started.elapsed() < Duration::from_secs(5));
    drop(hung);
}

#[test]
fn test_error_status_still_counts_as_reachable() {
    init_tracing();
    let server = TestHttpServer::bind();
    let url = server.url("/missing.asc");
    server.serve_text("/missing.asc", StatusCode::NOT_FOUND, "not here");

    let source = HttpSource::new(&fetch_config(5_000)).unwrap();
    let body = source.get(&url, Duration::from_secs(5)).unwrap();
    assert_eq!(body, b"not here");

    // Unregistered paths still complete an exchange
    let empty = source.get(&server.url("/other.asc"), Duration::from_secs(5)).unwrap();
    assert!(empty.is_empty());
}

#[test]
fn test_stopped_server_falls_through_to_next() {
    init_tracing();
    let stopped = TestHttpServer::bind();
    let stopped_url = stopped.url("/trust.asc");
    stopped.serve_text("/trust.asc", StatusCode::OK, "stale");
    stopped.shutdown();

    let live = TestHttpServer::bind();
    let live_url = live.url("/trust.asc");
    live.serve_text("/trust.asc", StatusCode::OK, "fresh");

    let fetcher = TrustDocumentFetcher::from_config(&fetch_config(1_000)).unwrap();
    let fetched = fetcher.fetch(&[stopped_url.as_str(), live_url.as_str()]).unwrap();
    assert_eq!(fetched.resolved_url, live_url);
    assert_eq!(fetched.bytes, b"fresh");
}

#[test]
fn test_unreachable_port_reports_all_urls() {
    init_tracing();
    let closed_url = closed_url("/trust.asc");

    let fetcher = TrustDocumentFetcher::from_config(&fetch_config(1_000)).unwrap();
    match fetcher.fetch(&[closed_url.as_str()]) {
        Err(DocumentError::NoReachableSource { urls }) => assert_eq!(urls, vec![closed_url]),
        other => panic!("expected NoReachableSource, got {:?}", other),
    }
}
