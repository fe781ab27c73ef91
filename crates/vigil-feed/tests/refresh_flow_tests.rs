//! End-to-end refresh cycle tests: poller state machine driving the
//! real HTTP client against a mock backend.

use std::time::Duration;

use vigil_core::ServerConfig;
use vigil_feed::{
    BackoffPolicy, FeedClient, FeedEvent, Poller, PollerConfig, TickOutcome,
};
use wiremock::{Mock, MockServer, ResponseTemplate, matchers};

fn poller(interval_secs: u64) -> Poller {
    let interval = Duration::from_secs(interval_secs);
    Poller::new(PollerConfig {
        interval_secs,
        backoff: BackoffPolicy::for_poll(interval, Duration::from_secs(60), 2.0),
    })
}

fn client(mock: &MockServer) -> FeedClient {
    let server = ServerConfig {
        base_url: mock.uri(),
        alerts_path: "/api/alerts/".to_string(),
        ..ServerConfig::default()
    };
    FeedClient::new(&server, 5).unwrap()
}

fn fragment_body(fingerprints: &[&str]) -> serde_json::Value {
    let markup: String = fingerprints
        .iter()
        .map(|fp| format!(r#"<tr data-fingerprint="{fp}"><td>{fp}</td></tr>"#))
        .collect();
    serde_json::json!({
        "markup": markup,
        "count": fingerprints.len(),
        "timestamp": "2025-06-01T12:00:00Z"
    })
}

async fn mount_fragment(mock: &MockServer, fingerprints: &[&str]) {
    Mock::given(matchers::method("GET"))
        .and(matchers::path("/api/alerts/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(fragment_body(fingerprints)))
        .mount(mock)
        .await;
}

/// Drive one full poll cycle: tick to expiry, fetch, complete.
async fn run_cycle(poller: &mut Poller, client: &FeedClient) -> Vec<FeedEvent> {
    loop {
        match poller.tick() {
            TickOutcome::StartFetch(ticket) => {
                let result = client.fetch_fragment().await;
                return poller.complete(ticket.seq, result);
            }
            TickOutcome::Waiting { .. } => continue,
            other => panic!("unexpected tick outcome: {other:?}"),
        }
    }
}

#[tokio::test]
async fn test_full_cycle_reconciles_snapshot() {
    let mock_server = MockServer::start().await;

    // First response populates the feed; the second carries one more alert.
    Mock::given(matchers::method("GET"))
        .and(matchers::path("/api/alerts/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(fragment_body(&["a", "b"])))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;
    mount_fragment(&mock_server, &["a", "b", "c"]).await;

    let mut p = poller(2);
    let c = client(&mock_server);

    // Initial population: snapshot seeded, no arrival signal
    let events = run_cycle(&mut p, &c).await;
    assert!(
        events
            .iter()
            .all(|e| !matches!(e, FeedEvent::ArrivalSignal { .. }))
    );
    assert_eq!(p.feed().snapshot().len(), 2);

    // The alert that appeared afterwards signals exactly once
    let events = run_cycle(&mut p, &c).await;
    assert!(events.contains(&FeedEvent::ArrivalSignal { newly_arrived: 1 }));
    assert_eq!(p.feed().snapshot().len(), 3);
}

#[tokio::test]
async fn test_failure_then_recovery() {
    let mock_server = MockServer::start().await;

    Mock::given(matchers::method("GET"))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;
    mount_fragment(&mock_server, &["a"]).await;

    let mut p = poller(2);
    let c = client(&mock_server);

    let events = run_cycle(&mut p, &c).await;
    match &events[0] {
        FeedEvent::FetchFailed { last_success, .. } => assert!(last_success.is_none()),
        other => panic!("expected FetchFailed, got {other:?}"),
    }

    let events = run_cycle(&mut p, &c).await;
    assert!(events.contains(&FeedEvent::ErrorCleared));
    assert!(p.feed().contains("a"));
}

#[tokio::test]
async fn test_acknowledge_triggers_one_immediate_poll() {
    let mock_server = MockServer::start().await;

    // First poll shows two alerts; after the acknowledge, the backend
    // drops the acknowledged one.
    Mock::given(matchers::method("GET"))
        .and(matchers::path("/api/alerts/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(fragment_body(&["a", "b"])))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;
    Mock::given(matchers::method("PUT"))
        .and(matchers::path("/api/v1/alerts/a/acknowledge/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"status": "ok"})))
        .expect(1)
        .mount(&mock_server)
        .await;
    mount_fragment(&mock_server, &["b"]).await;

    let mut p = poller(30);
    let c = client(&mock_server);

    run_cycle(&mut p, &c).await;
    assert!(p.feed().contains("a"));

    // Acknowledge, then the one out-of-cycle refresh
    c.acknowledge("a", "handled").await.unwrap();
    let ticket = p.force_refresh().expect("no fetch should be in flight");
    let result = c.fetch_fragment().await;
    p.complete(ticket.seq, result);

    assert!(!p.feed().contains("a"));
    assert!(p.feed().contains("b"));
}
