//! Integration tests for access token pass-through.

use axum::http::StatusCode;
use hec_receiver::GatewayConfig;
use shared::hec::HEC_TOKEN_LABEL;

use super::common::{logs_app_with, metrics_app_with, post, post_with_headers};

const METRIC_EVENT: &str = r#"{"event": "metric", "fields": {"metric_name:x": 1}}"#;
const LOG_EVENT: &str = r#"{"event": "hello"}"#;

fn passthrough_config() -> GatewayConfig {
    GatewayConfig {
        access_token_passthrough: true,
        ..GatewayConfig::default()
    }
}

#[tokio::test]
async fn test_token_added_to_metrics_resource() {
    let (app, sinks) = metrics_app_with(&passthrough_config());

    let (status, _) =
        post_with_headers(app, METRIC_EVENT, &[("Authorization", "tok123")]).await;

    assert_eq!(status, StatusCode::ACCEPTED);
    let batches = sinks.metrics.unwrap().batches().unwrap();
    assert_eq!(
        batches[0].resource_metrics[0].resource.get_str(HEC_TOKEN_LABEL),
        Some("tok123")
    );
}

#[tokio::test]
async fn test_token_added_to_every_log_resource() {
    let (app, sinks) = logs_app_with(&passthrough_config());

    let body = format!("{LOG_EVENT}{LOG_EVENT}{LOG_EVENT}");
    let (status, _) = post_with_headers(app, body, &[("Authorization", "tok123")]).await;

    assert_eq!(status, StatusCode::ACCEPTED);
    let batches = sinks.logs.unwrap().batches().unwrap();
    assert_eq!(batches[0].resource_logs.len(), 3);
    for resource_logs in &batches[0].resource_logs {
        assert_eq!(resource_logs.resource.get_str(HEC_TOKEN_LABEL), Some("tok123"));
    }
}

#[tokio::test]
async fn test_no_token_when_passthrough_disabled() {
    let (app, sinks) = logs_app_with(&GatewayConfig::default());

    let (status, _) = post_with_headers(app, LOG_EVENT, &[("Authorization", "tok123")]).await;

    assert_eq!(status, StatusCode::ACCEPTED);
    let batches = sinks.logs.unwrap().batches().unwrap();
    assert_eq!(
        batches[0].resource_logs[0].resource.get_str(HEC_TOKEN_LABEL),
        None
    );
}

#[tokio::test]
async fn test_no_token_when_header_absent() {
    let (app, sinks) = logs_app_with(&passthrough_config());

    let (status, _) = post(app, LOG_EVENT).await;

    assert_eq!(status, StatusCode::ACCEPTED);
    let batches = sinks.logs.unwrap().batches().unwrap();
    assert!(batches[0].resource_logs[0]
        .resource
        .attributes
        .get(HEC_TOKEN_LABEL)
        .is_none());
}
