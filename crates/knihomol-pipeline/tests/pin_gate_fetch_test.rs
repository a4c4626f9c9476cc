//! Integration tests for the allow-list fetch against a mock HTTP server.

use knihomol_pipeline::PinGate;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_refresh_parses_published_csv() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/pins.csv"))
        .respond_with(ResponseTemplate::new(200).set_body_string("1234\n\"5678\"\nabc\n"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut gate = PinGate::with_source(format!("{}/pins.csv", mock_server.uri()));
    let allowed = gate.refresh().await;

    assert_eq!(allowed.len(), 2);
    assert!(allowed.contains("1234"));
    assert!(allowed.contains("5678"));
    assert!(!allowed.contains("abc"));
}

#[tokio::test]
async fn test_refresh_rebuilds_wholesale() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/pins.csv"))
        .respond_with(ResponseTemplate::new(200).set_body_string("1234\n"))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/pins.csv"))
        .respond_with(ResponseTemplate::new(200).set_body_string("5678\n"))
        .mount(&mock_server)
        .await;

    let mut gate = PinGate::with_source(format!("{}/pins.csv", mock_server.uri()));
    gate.refresh().await;
    assert!(gate.allowed().contains("1234"));

    gate.refresh().await;
    // Stale entries are discarded, not accumulated
    assert!(!gate.allowed().contains("1234"));
    assert!(gate.allowed().contains("5678"));
}

#[tokio::test]
async fn test_fetch_failure_fails_closed() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/pins.csv"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let mut gate = PinGate::with_source(format!("{}/pins.csv", mock_server.uri()));
    let allowed = gate.refresh().await;
    assert!(allowed.is_empty());

    // Only the default code validates against the empty set
    let decision = gate.commit("1234");
    assert_eq!(decision.pin, "0000");
    assert!(decision.needs_confirmation);
    assert_eq!(gate.commit("0000").pin, "0000");
    assert!(!gate.commit("0000").needs_confirmation);
}

#[tokio::test]
async fn test_failed_refresh_discards_previous_set() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/pins.csv"))
        .respond_with(ResponseTemplate::new(200).set_body_string("1234\n"))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/pins.csv"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let mut gate = PinGate::with_source(format!("{}/pins.csv", mock_server.uri()));
    gate.refresh().await;
    assert!(!gate.allowed().is_empty());

    gate.refresh().await;
    // An unreachable allow-list never silently widens (or keeps) the set
    assert!(gate.allowed().is_empty());
}

#[tokio::test]
async fn test_unreachable_source_fails_closed() {
    // Nothing listens on this port; the request itself errors out.
    let mut gate = PinGate::with_source("http://127.0.0.1:9/pins.csv");
    let allowed = gate.refresh().await;
    assert!(allowed.is_empty());
}
