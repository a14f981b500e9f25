//! Common test utilities and helpers for integration tests.
//!
//! This module provides shared functionality used across all integration tests,
//! including test app setup and HTTP request helpers.

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use flate2::write::GzEncoder;
use flate2::Compression;
use hec_receiver::{create_router, GatewayConfig, ReceiverState, Route};
use http_body_util::BodyExt;
use shared::consumer::{InMemoryLogsSink, InMemoryMetricsSink, MetricsConsumer};
use shared::models::MetricsBatch;
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Consumer wired into a test app.
#[derive(Clone, Default)]
pub struct Sinks {
    /// Metrics sink, if the app serves metrics.
    pub metrics: Option<InMemoryMetricsSink>,
    /// Logs sink, if the app serves logs.
    pub logs: Option<InMemoryLogsSink>,
}

impl Sinks {
    /// Number of metrics batches received.
    pub fn metrics_batches(&self) -> usize {
        self.metrics
            .as_ref()
            .map_or(0, |sink| sink.batch_count().unwrap())
    }

    /// Number of logs batches received.
    pub fn logs_batches(&self) -> usize {
        self.logs
            .as_ref()
            .map_or(0, |sink| sink.batch_count().unwrap())
    }
}

/// Creates a test router serving metrics into an in-memory sink.
///
/// # Returns
///
/// A tuple containing the configured router and its sinks.
pub fn metrics_app_with(config: &GatewayConfig) -> (Router, Sinks) {
    let sink = InMemoryMetricsSink::new();
    let state = ReceiverState::new(config, Route::metrics(Arc::new(sink.clone()))).unwrap();
    let sinks = Sinks {
        metrics: Some(sink),
        logs: None,
    };
    (create_router(state), sinks)
}

/// Creates a test router serving logs into an in-memory sink.
pub fn logs_app_with(config: &GatewayConfig) -> (Router, Sinks) {
    let sink = InMemoryLogsSink::new();
    let state = ReceiverState::new(config, Route::logs(Arc::new(sink.clone()))).unwrap();
    let sinks = Sinks {
        metrics: None,
        logs: Some(sink),
    };
    (create_router(state), sinks)
}

/// Creates a test router serving only metrics.
pub fn metrics_app() -> (Router, Sinks) {
    metrics_app_with(&GatewayConfig::default())
}

/// Creates a test router serving only logs.
pub fn logs_app() -> (Router, Sinks) {
    logs_app_with(&GatewayConfig::default())
}

/// Helper to send a request and decode the canned response body.
///
/// # Arguments
///
/// * `app` - The Axum router to send the request to
/// * `request` - The request to send
///
/// # Returns
///
/// A tuple containing the response status code and the decoded body string.
pub async fn send(app: Router, request: Request<Body>) -> (StatusCode, String) {
    let response = tower::ServiceExt::oneshot(app, request).await.unwrap();

    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let message: String = serde_json::from_slice(&body_bytes).unwrap_or_default();

    (status, message)
}

/// Helper to POST a raw body to the collector path.
pub async fn post(app: Router, body: impl Into<Body>) -> (StatusCode, String) {
    send(
        app,
        Request::builder()
            .method("POST")
            .uri("/services/collector")
            .body(body.into())
            .unwrap(),
    )
    .await
}

/// Helper to POST a raw body with extra headers.
pub async fn post_with_headers(
    app: Router,
    body: impl Into<Body>,
    headers: &[(&str, &str)],
) -> (StatusCode, String) {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/services/collector");
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }

    send(app, builder.body(body.into()).unwrap()).await
}

/// Helper to POST a gzip-compressed body.
pub async fn post_gzip(app: Router, body: &[u8]) -> (StatusCode, String) {
    post_with_headers(app, gzip(body), &[(header::CONTENT_ENCODING.as_str(), "gzip")]).await
}

/// Compresses `data` with gzip.
pub fn gzip(data: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

/// Metrics consumer that counts calls and always fails.
#[derive(Default)]
pub struct CountingFailingConsumer {
    /// Number of calls received.
    pub calls: AtomicUsize,
}

#[async_trait]
impl MetricsConsumer for CountingFailingConsumer {
    async fn consume_metrics(&self, _batch: MetricsBatch) -> anyhow::Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        anyhow::bail!("disk full on /var/spool/telemetry")
    }
}
