//! Integration tests for log event ingestion.
//!
//! Tests cover:
//! - Log record contents and resource attributes
//! - Custom attribute key mapping
//! - Routing gate for logs

use axum::http::StatusCode;
use hec_receiver::GatewayConfig;
use serde_json::json;
use shared::hec::HecToOtelAttrs;

use super::common::{logs_app, logs_app_with, metrics_app, post};

#[tokio::test]
async fn test_ingest_single_log_event() {
    let (app, sinks) = logs_app();

    let (status, message) = post(
        app,
        r#"{"time": 1700000000.5, "host": "auth-01", "source": "/var/log/auth.log", "sourcetype": "linux_secure", "index": "security", "event": "Accepted publickey for deploy", "fields": {"pid": 4242}}"#,
    )
    .await;

    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(message, "OK");

    let batches = sinks.logs.unwrap().batches().unwrap();
    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0].log_record_count(), 1);

    let resource = &batches[0].resource_logs[0].resource;
    assert_eq!(resource.get_str("host.name"), Some("auth-01"));
    assert_eq!(resource.get_str("com.splunk.source"), Some("/var/log/auth.log"));
    assert_eq!(resource.get_str("com.splunk.sourcetype"), Some("linux_secure"));
    assert_eq!(resource.get_str("com.splunk.index"), Some("security"));

    let record = batches[0].log_records().next().unwrap();
    assert_eq!(record.body, json!("Accepted publickey for deploy"));
    assert_eq!(record.name.as_deref(), Some("linux_secure"));
    assert_eq!(record.attributes.get("pid"), Some(&json!(4242)));
    assert_eq!(
        record.timestamp.unwrap().timestamp_nanos_opt(),
        Some(1_700_000_000_500_000_000)
    );
}

#[tokio::test]
async fn test_structured_log_body() {
    let (app, sinks) = logs_app();

    let (status, _) = post(
        app,
        r#"{"event": {"message": "payment declined", "code": 402}}"#,
    )
    .await;

    assert_eq!(status, StatusCode::ACCEPTED);

    let batches = sinks.logs.unwrap().batches().unwrap();
    let record = batches[0].log_records().next().unwrap();
    assert_eq!(record.body["message"], "payment declined");
    assert_eq!(record.body["code"], 402);
}

#[tokio::test]
async fn test_many_log_events_in_one_body() {
    let (app, sinks) = logs_app();

    let body: String = (0..50)
        .map(|i| format!(r#"{{"event": "line {i}", "host": "h{}"}}"#, i % 3))
        .collect::<Vec<_>>()
        .join("\n");
    let (status, _) = post(app, body).await;

    assert_eq!(status, StatusCode::ACCEPTED);

    let batches = sinks.logs.unwrap().batches().unwrap();
    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0].log_record_count(), 50);
}

#[tokio::test]
async fn test_custom_metadata_attribute_keys() {
    let config = GatewayConfig {
        hec_metadata_to_otel_attrs: HecToOtelAttrs {
            host: "host".to_string(),
            index: "splunk.index".to_string(),
            ..HecToOtelAttrs::default()
        },
        ..GatewayConfig::default()
    };
    let (app, sinks) = logs_app_with(&config);

    let (status, _) = post(app, r#"{"event": "x", "host": "db-01", "index": "main"}"#).await;

    assert_eq!(status, StatusCode::ACCEPTED);

    let batches = sinks.logs.unwrap().batches().unwrap();
    let resource = &batches[0].resource_logs[0].resource;
    assert_eq!(resource.get_str("host"), Some("db-01"));
    assert_eq!(resource.get_str("splunk.index"), Some("main"));
    assert_eq!(resource.get_str("host.name"), None);
}

#[tokio::test]
async fn test_log_event_on_metrics_only_gateway() {
    let (app, sinks) = metrics_app();

    let (status, message) = post(app, r#"{"event": "a log line"}"#).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(message, "Unsupported log event");
    assert_eq!(sinks.metrics_batches(), 0);
}
