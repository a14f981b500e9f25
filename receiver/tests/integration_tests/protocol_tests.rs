//! Integration tests for the HEC protocol checks.
//!
//! Tests cover:
//! - Path matching against the configured glob
//! - Method and content encoding checks
//! - The empty body short-circuit

use axum::body::Body;
use axum::http::{Request, StatusCode};
use hec_receiver::GatewayConfig;

use super::common::{logs_app, logs_app_with, post, post_with_headers, send};

const LOG_EVENT: &str = r#"{"event": "hello"}"#;

fn collector_config() -> GatewayConfig {
    GatewayConfig {
        path: Some("/services/collector*".to_string()),
        ..GatewayConfig::default()
    }
}

#[tokio::test]
async fn test_unmatched_path_returns_404_for_any_method() {
    for method in ["POST", "GET", "PUT", "DELETE"] {
        let (app, sinks) = logs_app_with(&collector_config());

        let (status, message) = send(
            app,
            Request::builder()
                .method(method)
                .uri("/api/v1/logs")
                .body(Body::from(LOG_EVENT))
                .unwrap(),
        )
        .await;

        assert_eq!(status, StatusCode::NOT_FOUND, "{method}");
        assert_eq!(message, "Not found");
        assert_eq!(sinks.logs_batches(), 0);
    }
}

#[tokio::test]
async fn test_matched_path_accepts_events() {
    let (app, sinks) = logs_app_with(&collector_config());

    let (status, message) = send(
        app,
        Request::builder()
            .method("POST")
            .uri("/services/collector/event")
            .body(Body::from(LOG_EVENT))
            .unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(message, "OK");
    assert_eq!(sinks.logs_batches(), 1);
}

#[tokio::test]
async fn test_any_path_matches_without_glob() {
    let (app, sinks) = logs_app();

    let (status, _) = send(
        app,
        Request::builder()
            .method("POST")
            .uri("/anything/at/all")
            .body(Body::from(LOG_EVENT))
            .unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(sinks.logs_batches(), 1);
}

#[tokio::test]
async fn test_non_post_returns_invalid_method() {
    for method in ["GET", "PUT", "DELETE", "PATCH", "HEAD", "OPTIONS"] {
        let (app, sinks) = logs_app();

        let response = tower::ServiceExt::oneshot(
            app,
            Request::builder()
                .method(method)
                .uri("/services/collector")
                .body(Body::from(LOG_EVENT))
                .unwrap(),
        )
        .await
        .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{method}");
        assert_eq!(sinks.logs_batches(), 0);
    }

    let (app, _) = logs_app();
    let (_, message) = send(
        app,
        Request::builder()
            .method("GET")
            .uri("/services/collector")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(message, r#"Only "POST" method is supported"#);
}

#[tokio::test]
async fn test_unsupported_encoding_returns_415() {
    for encoding in ["deflate", "br", "GZIP", "gzip, deflate"] {
        let (app, sinks) = logs_app();

        let (status, message) =
            post_with_headers(app, LOG_EVENT, &[("content-encoding", encoding)]).await;

        assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE, "{encoding}");
        assert_eq!(message, r#""Content-Encoding" must be "gzip" or empty"#);
        assert_eq!(sinks.logs_batches(), 0);
    }
}

#[tokio::test]
async fn test_empty_encoding_header_is_identity() {
    let (app, sinks) = logs_app();

    let (status, _) = post_with_headers(app, LOG_EVENT, &[("content-encoding", "")]).await;

    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(sinks.logs_batches(), 1);
}

#[tokio::test]
async fn test_empty_body_returns_200_without_forwarding() {
    let (app, sinks) = logs_app();

    let (status, message) = post_with_headers(app, "", &[("content-length", "0")]).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(message, "OK");
    assert_eq!(sinks.logs_batches(), 0);
    assert_eq!(sinks.metrics_batches(), 0);
}

#[tokio::test]
async fn test_empty_body_check_runs_after_encoding_check() {
    let (app, _) = logs_app();

    let (status, _) = post_with_headers(
        app,
        "",
        &[("content-length", "0"), ("content-encoding", "br")],
    )
    .await;

    assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
}

#[tokio::test]
async fn test_empty_gzip_body_returns_200() {
    let (app, sinks) = logs_app();

    let (status, _) = post_with_headers(app, "", &[("content-encoding", "gzip")]).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(sinks.logs_batches(), 0);
}

#[tokio::test]
async fn test_whitespace_body_is_accepted_without_forwarding() {
    let (app, sinks) = logs_app();

    let (status, message) = post(app, "  \n ").await;

    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(message, "OK");
    assert_eq!(sinks.logs_batches(), 0);
    assert_eq!(sinks.metrics_batches(), 0);
}

#[tokio::test]
async fn test_malformed_json_returns_400() {
    let (app, sinks) = logs_app();

    let (status, message) = post(app, "this is not json").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(message, "Failed to unmarshal message body");
    assert_eq!(sinks.logs_batches(), 0);
}

#[tokio::test]
async fn test_json_array_is_rejected() {
    let (app, sinks) = logs_app();

    let (status, message) = post(app, r#"[{"event": "a"}, {"event": "b"}]"#).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(message, "Failed to unmarshal message body");
    assert_eq!(sinks.logs_batches(), 0);
}

#[tokio::test]
async fn test_body_over_limit_is_rejected() {
    let config = GatewayConfig {
        max_request_body_bytes: 16,
        ..GatewayConfig::default()
    };
    let (app, sinks) = logs_app_with(&config);

    let (status, message) = post(app, r#"{"event": "a message that is too long"}"#).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(message, "Failed to unmarshal message body");
    assert_eq!(sinks.logs_batches(), 0);
}
