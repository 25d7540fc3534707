mod common;

use common::{Reply, ScriptedMappingApi};
use holdingsmatch::application::identifier_resolver::{IdentifierCache, IdentifierResolver};
use holdingsmatch::domain::error::DomainError;
use std::sync::Arc;
use std::time::Duration;

fn resolver(api: Arc<ScriptedMappingApi>) -> IdentifierResolver {
    IdentifierResolver::new(api, Arc::new(IdentifierCache::new()), Duration::from_millis(1))
}

#[tokio::test]
async fn test_api_hit() {
    let api = Arc::new(ScriptedMappingApi::not_found());
    api.script("88160R101", vec![Reply::ticker("TSLA")]);
    let r = resolver(api.clone());

    assert_eq!(r.resolve("88160R101").await.unwrap(), Some("TSLA".into()));
    assert_eq!(api.calls(), 1);
}

#[tokio::test]
async fn test_rate_limited_three_times_uses_fallback() {
    let api = Arc::new(ScriptedMappingApi::new(Reply::status(429)));
    let r = resolver(api.clone());

    assert_eq!(r.resolve("037833100").await.unwrap(), Some("AAPL".into()));
    assert_eq!(api.calls(), 3, "should stop after three attempts");
}

#[tokio::test]
async fn test_backoff_follows_every_failed_attempt() {
    let api = Arc::new(ScriptedMappingApi::new(Reply::status(429)));
    let r = IdentifierResolver::new(api.clone(), Arc::new(IdentifierCache::new()), Duration::from_millis(20));

    let start = tokio::time::Instant::now();
    assert_eq!(r.resolve("037833100").await.unwrap(), Some("AAPL".into()));
    // 20 + 40 + 80 ms
    assert!(start.elapsed() >= Duration::from_millis(140), "elapsed {:?}", start.elapsed());
    assert_eq!(api.calls(), 3);
}

#[tokio::test]
async fn test_server_error_then_success() {
    let api = Arc::new(ScriptedMappingApi::not_found());
    api.script("30303M102", vec![Reply::status(503), Reply::ticker("META")]);
    let r = resolver(api.clone());

    assert_eq!(r.resolve("30303M102").await.unwrap(), Some("META".into()));
    assert_eq!(api.calls(), 2);
}

#[tokio::test]
async fn test_transport_errors_are_retried() {
    let api = Arc::new(ScriptedMappingApi::not_found());
    api.script(
        "67066G104",
        vec![Reply::TransportError, Reply::TransportError, Reply::ticker("NVDA")],
    );
    let r = resolver(api.clone());

    assert_eq!(r.resolve("67066G104").await.unwrap(), Some("NVDA".into()));
    assert_eq!(api.calls(), 3);
}

#[tokio::test]
async fn test_permanent_status_is_not_retried() {
    let api = Arc::new(ScriptedMappingApi::new(Reply::status(400)));
    let r = resolver(api.clone());

    assert_eq!(r.resolve("594918104").await.unwrap(), Some("MSFT".into()));
    assert_eq!(api.calls(), 1);
}

#[tokio::test]
async fn test_html_body_aborts_to_fallback() {
    let api = Arc::new(ScriptedMappingApi::new(Reply::Status(
        200,
        "<!DOCTYPE html><html><body>Too many requests</body></html>".into(),
    )));
    let r = resolver(api.clone());

    assert_eq!(r.resolve("191216100").await.unwrap(), Some("KO".into()));
    assert_eq!(api.calls(), 1);
}

#[tokio::test]
async fn test_unknown_everywhere_is_none() {
    let api = Arc::new(ScriptedMappingApi::not_found());
    let r = resolver(api.clone());

    assert_eq!(r.resolve("999999999").await.unwrap(), None);
}

#[tokio::test]
async fn test_hits_and_misses_are_cached() {
    let api = Arc::new(ScriptedMappingApi::not_found());
    api.script("88160R101", vec![Reply::ticker("TSLA")]);
    let r = resolver(api.clone());

    r.resolve("88160R101").await.unwrap();
    r.resolve("999999999").await.unwrap();
    let calls = api.calls();

    assert_eq!(r.resolve("88160R101").await.unwrap(), Some("TSLA".into()));
    assert_eq!(r.resolve("999999999").await.unwrap(), None);
    assert_eq!(api.calls(), calls, "cached lookups must not hit the API");
    assert_eq!(r.cache().len(), 2);
}

#[tokio::test]
async fn test_malformed_cusip_is_validation_error() {
    let api = Arc::new(ScriptedMappingApi::not_found());
    let r = resolver(api.clone());

    assert!(matches!(r.resolve("12345").await, Err(DomainError::Validation(_))));
    assert!(matches!(r.resolve("0378331000").await, Err(DomainError::Validation(_))));
    assert_eq!(api.calls(), 0);
}
