//! HTTP Event Collector (HEC) wire format support.
//!
//! This module decodes HEC submissions into typed events and converts them into
//! the internal batch model.
//!
//! # Example
//!
//! ```
//! use shared::hec::{decode_events, ClassifiedEvent};
//!
//! let body = br#"{"event": "login ok", "host": "web-01"}
//! {"event": "metric", "fields": {"metric_name:cpu.idle": 97.5}}"#;
//!
//! let kinds: Vec<_> = decode_events(&body[..])
//!     .map(|event| match event.unwrap().classify() {
//!         ClassifiedEvent::Metric(_) => "metric",
//!         ClassifiedEvent::Log(_) => "log",
//!     })
//!     .collect();
//!
//! assert_eq!(kinds, vec!["log", "metric"]);
//! ```

pub mod conversions;
pub mod decoder;
pub mod event;
pub mod transport;

pub use conversions::{hec_to_logs, hec_to_metrics, HecToOtelAttrs, MetricsConversion};
pub use decoder::{decode_events, EventStream};
pub use event::{ClassifiedEvent, Event, LogEvent, MetricEvent};
pub use transport::{body_reader, ContentEncoding};

use thiserror::Error;

/// Request header carrying the sender's HEC token.
pub const HEC_TOKEN_HEADER: &str = "Authorization";

/// Resource attribute key under which a passed-through token is stored.
pub const HEC_TOKEN_LABEL: &str = "com.splunk.hec.access_token";

/// Value of the `event` field that marks a metric submission.
pub const METRIC_EVENT_TYPE: &str = "metric";

/// Prefix of `fields` keys that carry metric values in multi-metric events.
pub const METRIC_NAME_PREFIX: &str = "metric_name:";

/// `fields` key naming the metric in single-metric events.
pub const METRIC_NAME_FIELD: &str = "metric_name";

/// `fields` key carrying the value in single-metric events.
pub const METRIC_VALUE_FIELD: &str = "_value";

/// The only supported non-identity content encoding.
pub const GZIP_ENCODING: &str = "gzip";

/// Errors raised while turning a request body into events.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The declared content encoding is neither empty nor gzip.
    #[error("unsupported content encoding '{0}'")]
    UnsupportedEncoding(String),

    /// The body does not start with a valid gzip member header.
    #[error("invalid gzip body: {0}")]
    Gzip(#[source] std::io::Error),

    /// A JSON object in the stream is malformed, or the stream could not be read.
    #[error("failed to unmarshal event: {0}")]
    Unmarshal(#[from] serde_json::Error),
}
