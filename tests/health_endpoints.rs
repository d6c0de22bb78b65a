//! End-to-end tests for the readiness and liveness endpoints.

use std::time::{Duration, Instant};

use reqwest::StatusCode;
use serde_json::Value;

mod common;
use common::TestServer;

async fn get_json(client: &reqwest::Client, url: &str) -> (StatusCode, reqwest::header::HeaderMap, Value) {
    let res = client.get(url).send().await.unwrap();
    let status = res.status();
    let headers = res.headers().clone();
    let body: Value = res.json().await.unwrap();
    (status, headers, body)
}

#[tokio::test]
async fn test_ready_reports_every_tagged_probe() {
    let dir = tempfile::tempdir().unwrap();
    let api = common::start_mock_backend(200, "[]").await;
    let db = common::closed_address().await;

    let config = common::config(&format!(
        r#"
        [[probes]]
        name = "sqlserver"
        kind = "database"
        address = "{db}"
        failure_status = "Degraded"
        tags = ["ready"]

        [[probes]]
        name = "Stock index api health check"
        kind = "http"
        url = "http://{api}/api/StockIndexes"
        tags = ["ready"]

        [[probes]]
        name = "Filepath write"
        kind = "filesystem"
        target_path = "{path}"
        tags = ["ready"]
        "#,
        db = db,
        api = api,
        path = dir.path().display(),
    ));
    let server = TestServer::start(config).await;
    let client = reqwest::Client::new();

    let res = client.get(server.url("/health/ready")).send().await.unwrap();
    let status = res.status();
    let headers = res.headers().clone();
    let text = res.text().await.unwrap();
    let body: Value = serde_json::from_str(&text).unwrap();

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(headers["content-type"], "application/json");
    assert_eq!(headers["cache-control"], "no-store, no-cache");
    assert!(headers.contains_key("x-request-id"));

    assert_eq!(body["OverallStatus"], "Degraded");
    // Entries keep registration order.
    let positions: Vec<usize> = ["\"sqlserver\"", "\"Stock index api health check\"", "\"Filepath write\""]
        .iter()
        .map(|key| text.find(key).unwrap())
        .collect();
    assert!(positions.windows(2).all(|w| w[0] < w[1]));

    let checks = body["DependencyHealthChecks"].as_object().unwrap();
    assert_eq!(checks.len(), 3);

    assert_eq!(checks["sqlserver"]["Status"], "Degraded");
    assert!(checks["sqlserver"]["Exception"].is_string());
    assert_eq!(checks["Stock index api health check"]["Status"], "Healthy");
    assert_eq!(checks["Stock index api health check"]["Data"]["status"], "200");
    assert_eq!(checks["Filepath write"]["Status"], "Healthy");
    assert!(checks["Filepath write"]["Exception"].is_null());
    // A successful write carries no data; `filePath` is only attached on failure.
    assert!(checks["Filepath write"]["Data"].as_object().unwrap().is_empty());

    // Scratch files are always removed.
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);

    server.shutdown().await;
}

#[tokio::test]
async fn test_ready_unhealthy_maps_to_503() {
    let db = common::closed_address().await;
    let config = common::config(&format!(
        r#"
        [[probes]]
        name = "sqlserver"
        kind = "database"
        address = "{db}"
        tags = ["ready"]
        "#
    ));
    let server = TestServer::start(config).await;

    let (status, _, body) = get_json(&reqwest::Client::new(), &server.url("/health/ready")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["OverallStatus"], "Unhealthy");
    assert_eq!(body["DependencyHealthChecks"]["sqlserver"]["Status"], "Unhealthy");

    server.shutdown().await;
}

#[tokio::test]
async fn test_live_excludes_ready_probes_and_returns_200() {
    let db = common::closed_address().await;
    let dir = tempfile::tempdir().unwrap();
    let config = common::config(&format!(
        r#"
        [[probes]]
        name = "sqlserver"
        kind = "database"
        address = "{db}"
        tags = ["ready"]

        [[probes]]
        name = "self"
        kind = "filesystem"
        target_path = "{path}"
        "#,
        db = db,
        path = dir.path().display(),
    ));
    let server = TestServer::start(config).await;
    let client = reqwest::Client::new();

    let (status, _, body) = get_json(&client, &server.url("/health/live")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["OverallStatus"], "Healthy");
    assert!(body.get("DependencyHealthChecks").is_none());
    assert!(body["TotalChecksDuration"].as_str().unwrap().contains('.'));

    let (_, _, ready) = get_json(&client, &server.url("/health/ready")).await;
    let checks = ready["DependencyHealthChecks"].as_object().unwrap();
    assert!(checks.contains_key("sqlserver"));
    assert!(!checks.contains_key("self"));

    server.shutdown().await;
}

#[tokio::test]
async fn test_live_stays_200_when_unhealthy() {
    let db = common::closed_address().await;
    let config = common::config(&format!(
        r#"
        [[probes]]
        name = "cache"
        kind = "database"
        address = "{db}"
        "#
    ));
    let server = TestServer::start(config).await;

    let (status, _, body) = get_json(&reqwest::Client::new(), &server.url("/health/live")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["OverallStatus"], "Unhealthy");

    server.shutdown().await;
}

#[tokio::test]
async fn test_empty_registry_is_healthy() {
    let server = TestServer::start(common::config("")).await;
    let client = reqwest::Client::new();

    let (status, _, body) = get_json(&client, &server.url("/health/ready")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["OverallStatus"], "Healthy");
    assert_eq!(body["TotalChecksDuration"], "0.00");
    assert!(body["DependencyHealthChecks"].as_object().unwrap().is_empty());

    server.shutdown().await;
}

#[tokio::test]
async fn test_probes_run_in_parallel() {
    let slow_a = common::start_slow_backend(200, "ok", Duration::from_millis(300)).await;
    let slow_b = common::start_slow_backend(200, "ok", Duration::from_millis(300)).await;
    let slow_c = common::start_slow_backend(200, "ok", Duration::from_millis(300)).await;

    let config = common::config(&format!(
        r#"
        [[probes]]
        name = "a"
        kind = "http"
        url = "http://{slow_a}/"
        tags = ["ready"]

        [[probes]]
        name = "b"
        kind = "http"
        url = "http://{slow_b}/"
        tags = ["ready"]

        [[probes]]
        name = "c"
        kind = "http"
        url = "http://{slow_c}/"
        tags = ["ready"]
        "#
    ));
    let server = TestServer::start(config).await;

    let start = Instant::now();
    let (status, _, body) = get_json(&reqwest::Client::new(), &server.url("/health/ready")).await;
    let elapsed = start.elapsed();

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["OverallStatus"], "Healthy");
    assert!(elapsed < Duration::from_millis(800), "took {:?}", elapsed);

    server.shutdown().await;
}

#[tokio::test]
async fn test_slow_probe_times_out_as_unhealthy() {
    let slow = common::start_slow_backend(200, "ok", Duration::from_secs(5)).await;
    let config = common::config(&format!(
        r#"
        [[probes]]
        name = "slow"
        kind = "http"
        url = "http://{slow}/"
        failure_status = "Degraded"
        timeout_ms = 100
        tags = ["ready"]
        "#
    ));
    let server = TestServer::start(config).await;

    let (status, _, body) = get_json(&reqwest::Client::new(), &server.url("/health/ready")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    let slow = &body["DependencyHealthChecks"]["slow"];
    assert_eq!(slow["Status"], "Unhealthy");
    assert!(slow["Exception"].as_str().unwrap().contains("100 ms"));

    server.shutdown().await;
}

#[tokio::test]
async fn test_status_and_request_id() {
    let server = TestServer::start(common::config("")).await;
    let client = reqwest::Client::new();

    let res = client
        .get(server.url("/status"))
        .header("x-request-id", "trace-42")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()["x-request-id"], "trace-42");
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["name"], "healthgate");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));

    let (status, headers, _) = get_json(&client, &server.url("/missing")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(headers.contains_key("x-request-id"));

    server.shutdown().await;
}
