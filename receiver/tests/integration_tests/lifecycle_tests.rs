//! Integration tests for the gateway lifecycle against a real socket.

use hec_receiver::{Gateway, GatewayConfig, GatewayError, Route};
use shared::consumer::{InMemoryLogsSink, InMemoryMetricsSink};
use std::sync::Arc;
use tokio::sync::mpsc;

use super::common::gzip;

fn local_config() -> GatewayConfig {
    GatewayConfig {
        endpoint: "127.0.0.1:0".to_string(),
        path: Some("/services/collector*".to_string()),
        access_token_passthrough: true,
        ..GatewayConfig::default()
    }
}

#[tokio::test]
async fn test_gateway_serves_hec_over_http() {
    let logs = InMemoryLogsSink::new();
    let mut gateway = Gateway::new(local_config(), Route::logs(Arc::new(logs.clone())));
    let (host, mut errors) = mpsc::unbounded_channel::<GatewayError>();

    let addr = gateway.start(host).await.unwrap();
    let client = reqwest::Client::new();
    let url = format!("http://{addr}/services/collector");

    let response = client
        .post(&url)
        .header("Authorization", "Splunk tok123")
        .body(r#"{"event": "login ok", "host": "auth-01"}"#)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 202);
    assert_eq!(response.text().await.unwrap(), r#""OK""#);

    let response = client
        .post(&url)
        .header("Content-Encoding", "gzip")
        .body(gzip(br#"{"event": "logout", "host": "auth-01"}"#))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 202);

    let response = client
        .post(format!("http://{addr}/other"))
        .body("{}")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);
    assert_eq!(response.text().await.unwrap(), r#""Not found""#);

    let log_batches = logs.batches().unwrap();
    assert_eq!(log_batches.len(), 2);
    assert_eq!(
        log_batches[0].resource_logs[0]
            .resource
            .get_str("com.splunk.hec.access_token"),
        Some("Splunk tok123")
    );

    gateway.shutdown().await.unwrap();
    assert!(errors.try_recv().is_err());
}

#[tokio::test]
async fn test_one_gateway_per_route() {
    let logs = InMemoryLogsSink::new();
    let metrics = InMemoryMetricsSink::new();
    let mut logs_gateway = Gateway::new(local_config(), Route::logs(Arc::new(logs.clone())));
    let mut metrics_gateway =
        Gateway::new(local_config(), Route::metrics(Arc::new(metrics.clone())));
    let (host, _errors) = mpsc::unbounded_channel::<GatewayError>();

    let logs_addr = logs_gateway.start(host.clone()).await.unwrap();
    let metrics_addr = metrics_gateway.start(host).await.unwrap();
    let client = reqwest::Client::new();

    let response = client
        .post(format!("http://{metrics_addr}/services/collector"))
        .body(r#"{"event": "metric", "fields": {"metric_name:cpu.idle": 97.5}}"#)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 202);

    let response = client
        .post(format!("http://{logs_addr}/services/collector"))
        .body(r#"{"event": "metric", "fields": {"metric_name:cpu.idle": 97.5}}"#)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);
    assert_eq!(
        response.text().await.unwrap(),
        r#""Unsupported metric event""#
    );

    assert_eq!(metrics.batch_count().unwrap(), 1);
    assert_eq!(logs.batch_count().unwrap(), 0);

    logs_gateway.shutdown().await.unwrap();
    metrics_gateway.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_gateway_stops_accepting_after_shutdown() {
    let route = Route::logs(Arc::new(InMemoryLogsSink::new()));
    let mut gateway = Gateway::new(local_config(), route);
    let (host, _errors) = mpsc::unbounded_channel::<GatewayError>();

    let addr = gateway.start(host).await.unwrap();
    gateway.shutdown().await.unwrap();

    let result = reqwest::Client::new()
        .post(format!("http://{addr}/services/collector"))
        .body(r#"{"event": "late"}"#)
        .send()
        .await;

    assert!(result.is_err());
}

#[tokio::test]
async fn test_gateway_can_restart_after_shutdown() {
    let route = Route::logs(Arc::new(InMemoryLogsSink::new()));
    let mut gateway = Gateway::new(local_config(), route);

    let (host, _errors) = mpsc::unbounded_channel::<GatewayError>();
    gateway.start(host).await.unwrap();
    gateway.shutdown().await.unwrap();

    let (host, _errors) = mpsc::unbounded_channel::<GatewayError>();
    let addr = gateway.start(host).await.unwrap();

    let response = reqwest::Client::new()
        .post(format!("http://{addr}/services/collector"))
        .body(r#"{"event": "again"}"#)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 202);

    gateway.shutdown().await.unwrap();
}
