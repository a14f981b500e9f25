//! HEC ingestion endpoint.
//!
//! A single handler serves every path and method so that path and method
//! mismatches get the canned HEC responses instead of axum's defaults.
//!
//! A request goes through, in order: path match, method check, encoding
//! check, the empty body short-circuit, transport and stream decoding with the
//! per-event routing gate, and finally conversion and hand-off to the
//! consumer. Any failure ends the request; nothing is forwarded unless the
//! whole body decoded and every event matches the gateway's route. The whole
//! request is bounded by the write timeout.

use crate::customizer::ResourceCustomizer;
use crate::response::ResponseKind;
use crate::state::{ReceiverState, Route};
use axum::{
    body::{Body, HttpBody},
    extract::{Request, State},
    http::{header, HeaderMap, Method},
    response::Response,
    Router,
};
use shared::hec::{
    body_reader, decode_events, hec_to_logs, hec_to_metrics, ClassifiedEvent, ContentEncoding,
    DecodeError, LogEvent, MetricEvent,
};
use std::time::Duration;
use thiserror::Error;
use tracing::{field, Instrument};

/// Reasons a HEC request is not accepted.
#[derive(Debug, Error)]
pub enum RequestError {
    /// The path does not match the configured glob.
    #[error("path '{0}' not served")]
    NotFound(String),

    /// The method is not POST.
    #[error("method {0} not allowed")]
    InvalidMethod(Method),

    /// The content encoding is not supported.
    #[error("invalid content encoding")]
    InvalidEncoding(#[source] DecodeError),

    /// The gzip reader could not be created.
    #[error("failed to create gzip reader")]
    GzipReader(#[source] DecodeError),

    /// The body could not be read.
    #[error("failed to read request body")]
    BodyRead(#[source] axum::Error),

    /// An event in the body is malformed.
    #[error("failed to decode events")]
    Unmarshal(#[source] DecodeError),

    /// A metric event arrived but no metrics consumer is configured.
    #[error("metric event received without a metrics route")]
    UnsupportedMetricEvent,

    /// A log event arrived but no logs consumer is configured.
    #[error("log event received without a logs route")]
    UnsupportedLogEvent,

    /// A downstream consumer failed.
    #[error("consumer failed: {0:#}")]
    Consumer(anyhow::Error),

    /// The request was not handled within the write timeout.
    #[error("request not handled within {0:?}")]
    Timeout(Duration),
}

impl RequestError {
    /// The canned response for this error.
    #[must_use]
    pub fn kind(&self) -> ResponseKind {
        match self {
            Self::NotFound(_) => ResponseKind::NotFound,
            Self::InvalidMethod(_) => ResponseKind::InvalidMethod,
            Self::InvalidEncoding(_) => ResponseKind::InvalidEncoding,
            Self::GzipReader(_) => ResponseKind::GzipReaderError,
            Self::BodyRead(_) | Self::Unmarshal(_) => ResponseKind::UnmarshalBodyError,
            Self::UnsupportedMetricEvent => ResponseKind::UnsupportedMetricEvent,
            Self::UnsupportedLogEvent => ResponseKind::UnsupportedLogEvent,
            Self::Consumer(_) | Self::Timeout(_) => ResponseKind::InternalServerError,
        }
    }
}

/// Events of one request, all of the gateway's route.
#[derive(Debug)]
pub enum RoutedEvents {
    /// Events of a metrics gateway.
    Metrics(Vec<MetricEvent>),
    /// Events of a logs gateway.
    Logs(Vec<LogEvent>),
}

impl RoutedEvents {
    /// Number of events.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Metrics(events) => events.len(),
            Self::Logs(events) => events.len(),
        }
    }

    /// Whether no event was decoded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Creates the HEC ingestion routes.
pub fn hec_routes(state: ReceiverState) -> Router {
    Router::new().fallback(handle_request).with_state(state)
}

/// Handler for every HEC request.
async fn handle_request(State(state): State<ReceiverState>, request: Request) -> Response {
    let span = tracing::info_span!(
        "hec.request",
        http.method = %request.method(),
        url.path = %request.uri().path(),
        http.status_code = field::Empty,
        http.status_text = field::Empty,
        otel.status_code = field::Empty,
        otel.status_message = field::Empty,
        hec.events = field::Empty,
    );

    let timeout = state.request_timeout();
    let outcome = tokio::time::timeout(timeout, process(&state, request))
        .instrument(span.clone())
        .await
        .unwrap_or_else(|_| Err(RequestError::Timeout(timeout)));

    let kind = match &outcome {
        Ok(kind) => *kind,
        Err(err) => err.kind(),
    };
    span.record("http.status_code", kind.status().as_u16());
    span.record("http.status_text", kind.message());

    match &outcome {
        Ok(_) => {
            span.record("otel.status_code", "OK");
        }
        Err(err) => {
            span.record("otel.status_code", "ERROR");
            span.record("otel.status_message", field::display(err));
            span.in_scope(|| {
                tracing::debug!(
                    error = %err,
                    status = kind.status().as_u16(),
                    "HEC request rejected"
                );
            });
        }
    }

    state.responses().respond(kind)
}

/// Runs one request through the state machine.
async fn process(state: &ReceiverState, request: Request) -> Result<ResponseKind, RequestError> {
    let path = request.uri().path();
    if !state.matches_path(path) {
        return Err(RequestError::NotFound(path.to_string()));
    }

    if request.method() != Method::POST {
        return Err(RequestError::InvalidMethod(request.method().clone()));
    }

    let encoding = content_encoding(request.headers()).map_err(RequestError::InvalidEncoding)?;

    if has_empty_body(&request) {
        return Ok(ResponseKind::Ok);
    }

    let customizer =
        ResourceCustomizer::from_headers(state.access_token_passthrough(), request.headers());

    let body = axum::body::to_bytes(request.into_body(), state.max_request_body_bytes())
        .await
        .map_err(RequestError::BodyRead)?;

    let events = route_events(state, encoding, &body)?;
    tracing::Span::current().record("hec.events", events.len());

    forward(state, &customizer, events).await?;

    Ok(ResponseKind::Accepted)
}

/// Parses the `Content-Encoding` header.
fn content_encoding(headers: &HeaderMap) -> Result<ContentEncoding, DecodeError> {
    match headers.get(header::CONTENT_ENCODING) {
        None => ContentEncoding::from_header(None),
        Some(value) => {
            let value = value
                .to_str()
                .map_err(|_| DecodeError::UnsupportedEncoding(format!("{value:?}")))?;
            ContentEncoding::from_header(Some(value))
        }
    }
}

/// Whether the request declares an empty body.
fn has_empty_body(request: &Request<Body>) -> bool {
    let declared_zero = request
        .headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok())
        == Some(0);

    declared_zero || request.body().size_hint().exact() == Some(0)
}

/// Decodes a body and collects the events of the gateway's route.
///
/// Fails on the first malformed event or the first event of the other kind;
/// events decoded before the failure are discarded.
///
/// # Errors
///
/// Returns the error matching the first problem found in stream order.
pub fn route_events(
    state: &ReceiverState,
    encoding: ContentEncoding,
    body: &[u8],
) -> Result<RoutedEvents, RequestError> {
    let reader = body_reader(encoding, body).map_err(RequestError::GzipReader)?;
    let mut events = match state.route() {
        Route::Metrics(_) => RoutedEvents::Metrics(Vec::new()),
        Route::Logs(_) => RoutedEvents::Logs(Vec::new()),
    };

    for event in decode_events(reader) {
        match (event.map_err(RequestError::Unmarshal)?.classify(), &mut events) {
            (ClassifiedEvent::Metric(metric), RoutedEvents::Metrics(metrics)) => {
                metrics.push(metric);
            }
            (ClassifiedEvent::Log(log), RoutedEvents::Logs(logs)) => logs.push(log),
            (ClassifiedEvent::Metric(_), RoutedEvents::Logs(_)) => {
                return Err(RequestError::UnsupportedMetricEvent);
            }
            (ClassifiedEvent::Log(_), RoutedEvents::Metrics(_)) => {
                return Err(RequestError::UnsupportedLogEvent);
            }
        }
    }

    Ok(events)
}

/// Converts the routed events and hands the batch to the consumer.
///
/// Nothing is forwarded when the body held no events.
async fn forward(
    state: &ReceiverState,
    customizer: &ResourceCustomizer,
    events: RoutedEvents,
) -> Result<(), RequestError> {
    if events.is_empty() {
        return Ok(());
    }

    match (state.route(), events) {
        (Route::Metrics(consumer), RoutedEvents::Metrics(metrics)) => {
            let conversion = hec_to_metrics(metrics, |r| customizer.apply(r), state.attrs());
            if conversion.dropped > 0 {
                tracing::debug!(dropped = conversion.dropped, "Dropped unconvertible metric values");
            }
            tracing::debug!(
                data_points = conversion.batch.data_point_count(),
                "Forwarding metrics batch"
            );
            consumer
                .consume_metrics(conversion.batch)
                .await
                .map_err(RequestError::Consumer)
        }
        (Route::Logs(consumer), RoutedEvents::Logs(logs)) => {
            let batch = hec_to_logs(logs, |r| customizer.apply(r), state.attrs());
            tracing::debug!(log_records = batch.log_record_count(), "Forwarding logs batch");
            consumer
                .consume_logs(batch)
                .await
                .map_err(RequestError::Consumer)
        }
        (Route::Metrics(_), RoutedEvents::Logs(_)) => Err(RequestError::UnsupportedLogEvent),
        (Route::Logs(_), RoutedEvents::Metrics(_)) => Err(RequestError::UnsupportedMetricEvent),
    }
}
