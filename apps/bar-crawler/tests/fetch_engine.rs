//! Fetch engine behavior against a mock aggregates API.

use std::time::Duration;

use chrono::{TimeZone, Utc};
use wiremock::matchers::{method, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

use bar_crawler::application::ports::{BarSource, FetchError};
use bar_crawler::infrastructure::polygon::{FetchSettings, PolygonClient};
use bar_crawler::infrastructure::sink::JsonlSink;

fn test_settings(base_url: String) -> FetchSettings {
    FetchSettings {
        base_url,
        retry_delay: Duration::from_millis(5),
        key_cooldown: Duration::from_millis(1),
        request_timeout: Duration::from_secs(5),
        ..FetchSettings::default()
    }
}

fn ok_body(bars: usize) -> String {
    let rows: Vec<String> = (0..bars)
        .map(|i| {
            format!(
                r#"{{"t":{},"o":1.0,"h":2.0,"l":0.5,"c":1.5,"v":100,"vw":1.2,"n":7}}"#,
                1_717_977_600_000_i64 + i as i64 * 60_000
            )
        })
        .collect();
    format!(
        r#"{{"ticker":"AAPL","queryCount":{n},"resultsCount":{n},"adjusted":true,"results":[{rows}],"status":"OK","request_id":"r1"}}"#,
        n = bars,
        rows = rows.join(",")
    )
}

#[tokio::test]
async fn success_fetch_returns_and_saves_bars() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/v2/aggs/ticker/AAPL/range/1/minute/.*"))
        .respond_with(ResponseTemplate::new(200).set_body_string(ok_body(2)))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let client = PolygonClient::new(test_settings(server.uri()))
        .unwrap()
        .with_output(dir.path().to_path_buf(), Box::new(JsonlSink));
    client.set_per_day_mode(true);

    let from = Utc.with_ymd_and_hms(2024, 6, 10, 0, 0, 0).unwrap();
    let to = Utc.with_ymd_and_hms(2024, 6, 10, 23, 59, 59).unwrap();
    let bars = client
        .fetch_minute_bars("AAPL", "test-key-0001", from, to)
        .await
        .unwrap();

    assert_eq!(bars.len(), 2);
    assert_eq!(bars[0].volume, 100);

    let packet = dir.path().join("AAPL").join("AAPL_2024-06-10.jsonl");
    let content = std::fs::read_to_string(packet).unwrap();
    assert_eq!(content.lines().count(), 2);
}

#[tokio::test]
async fn window_naming_includes_range_outside_per_day_mode() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(ok_body(1)))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let client = PolygonClient::new(test_settings(server.uri()))
        .unwrap()
        .with_output(dir.path().to_path_buf(), Box::new(JsonlSink));

    let from = Utc.with_ymd_and_hms(2024, 6, 10, 0, 0, 0).unwrap();
    let to = Utc.with_ymd_and_hms(2024, 6, 12, 23, 59, 59).unwrap();
    client
        .fetch_minute_bars("AAPL", "test-key-0001", from, to)
        .await
        .unwrap();

    assert!(dir
        .path()
        .join("AAPL")
        .join("AAPL_2024-06-10_to_2024-06-12.jsonl")
        .exists());
}

#[tokio::test]
async fn rate_limit_exhausts_exactly_three_attempts() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
        .expect(3)
        .mount(&server)
        .await;

    let client = PolygonClient::new(test_settings(server.uri())).unwrap();
    let from = Utc.with_ymd_and_hms(2024, 6, 10, 0, 0, 0).unwrap();
    let to = Utc.with_ymd_and_hms(2024, 6, 10, 23, 59, 59).unwrap();

    let err = client
        .fetch_minute_bars("AAPL", "test-key-0001", from, to)
        .await
        .unwrap_err();

    match err {
        FetchError::RateLimited { attempts } => assert_eq!(attempts, 3),
        other => panic!("expected RateLimited, got {other:?}"),
    }
    assert!(err.to_string().contains("429"));
    server.verify().await;
}

#[tokio::test]
async fn delayed_window_contributes_zero_bars() {
    let server = MockServer::start().await;
    // First window succeeds, second reports DELAYED.
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(ok_body(2)))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(r#"{"status":"DELAYED","request_id":"r2"}"#),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = PolygonClient::new(test_settings(server.uri())).unwrap();
    // 61 days with a 50-day cap: two windows.
    let from = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let to = Utc.with_ymd_and_hms(2024, 3, 1, 23, 59, 59).unwrap();

    let bars = client
        .fetch_minute_bars("AAPL", "test-key-0001", from, to)
        .await
        .unwrap();
    assert_eq!(bars.len(), 2);
}

#[tokio::test]
async fn malformed_body_retries_then_succeeds() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>gateway burp</html>"))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(ok_body(1)))
        .expect(1)
        .mount(&server)
        .await;

    let client = PolygonClient::new(test_settings(server.uri())).unwrap();
    let from = Utc.with_ymd_and_hms(2024, 6, 10, 0, 0, 0).unwrap();
    let to = Utc.with_ymd_and_hms(2024, 6, 10, 23, 59, 59).unwrap();

    let bars = client
        .fetch_minute_bars("AAPL", "test-key-0001", from, to)
        .await
        .unwrap();
    assert_eq!(bars.len(), 1);
}

#[tokio::test]
async fn server_error_fails_without_retry() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .expect(1)
        .mount(&server)
        .await;

    let client = PolygonClient::new(test_settings(server.uri())).unwrap();
    let from = Utc.with_ymd_and_hms(2024, 6, 10, 0, 0, 0).unwrap();
    let to = Utc.with_ymd_and_hms(2024, 6, 10, 23, 59, 59).unwrap();

    let err = client
        .fetch_minute_bars("AAPL", "test-key-0001", from, to)
        .await
        .unwrap_err();
    match err {
        FetchError::Status { status, body } => {
            assert_eq!(status, 500);
            assert_eq!(body, "boom");
        }
        other => panic!("expected Status, got {other:?}"),
    }
    server.verify().await;
}

#[tokio::test]
async fn unexpected_status_field_fails_terminally() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(r#"{"status":"ERROR","request_id":"r3"}"#),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = PolygonClient::new(test_settings(server.uri())).unwrap();
    let from = Utc.with_ymd_and_hms(2024, 6, 10, 0, 0, 0).unwrap();
    let to = Utc.with_ymd_and_hms(2024, 6, 10, 23, 59, 59).unwrap();

    let err = client
        .fetch_minute_bars("AAPL", "test-key-0001", from, to)
        .await
        .unwrap_err();
    match err {
        FetchError::NotOk(status) => assert_eq!(status, "ERROR"),
        other => panic!("expected NotOk, got {other:?}"),
    }
}
