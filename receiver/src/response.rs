//! Canned HEC responses.
//!
//! Every outcome of a request maps to a fixed status code and a fixed JSON
//! string body. Senders of the HEC protocol match on these bodies, so they
//! never carry request specific detail.

use axum::{
    body::{Body, Bytes},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};

/// Named outcome of a HEC request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResponseKind {
    /// Empty body, nothing to do.
    Ok,
    /// Events were handed to the consumers.
    Accepted,
    /// The request path does not match.
    NotFound,
    /// The method is not POST.
    InvalidMethod,
    /// The content encoding is not supported.
    InvalidEncoding,
    /// The gzip reader could not be created.
    GzipReaderError,
    /// The body is not a stream of JSON objects.
    UnmarshalBodyError,
    /// A consumer failed.
    InternalServerError,
    /// A metric event arrived without a metrics route.
    UnsupportedMetricEvent,
    /// A log event arrived without a logs route.
    UnsupportedLogEvent,
}

impl ResponseKind {
    /// Every kind, in catalog order.
    pub const ALL: [Self; 10] = [
        Self::Ok,
        Self::Accepted,
        Self::NotFound,
        Self::InvalidMethod,
        Self::InvalidEncoding,
        Self::GzipReaderError,
        Self::UnmarshalBodyError,
        Self::InternalServerError,
        Self::UnsupportedMetricEvent,
        Self::UnsupportedLogEvent,
    ];

    /// HTTP status code of this outcome.
    #[must_use]
    pub const fn status(self) -> StatusCode {
        match self {
            Self::Ok => StatusCode::OK,
            Self::Accepted => StatusCode::ACCEPTED,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::InvalidEncoding => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Self::InternalServerError => StatusCode::INTERNAL_SERVER_ERROR,
            Self::InvalidMethod
            | Self::GzipReaderError
            | Self::UnmarshalBodyError
            | Self::UnsupportedMetricEvent
            | Self::UnsupportedLogEvent => StatusCode::BAD_REQUEST,
        }
    }

    /// Message carried in the body, before JSON encoding.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::Ok | Self::Accepted => "OK",
            Self::NotFound => "Not found",
            Self::InvalidMethod => r#"Only "POST" method is supported"#,
            Self::InvalidEncoding => r#""Content-Encoding" must be "gzip" or empty"#,
            Self::GzipReaderError => "Error on gzip body",
            Self::UnmarshalBodyError => "Failed to unmarshal message body",
            Self::InternalServerError => "Internal Server Error",
            Self::UnsupportedMetricEvent => "Unsupported metric event",
            Self::UnsupportedLogEvent => "Unsupported log event",
        }
    }

    /// Whether this outcome is a success.
    #[must_use]
    pub const fn is_success(self) -> bool {
        matches!(self, Self::Ok | Self::Accepted)
    }
}

/// Status code and encoded body of one outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseDescriptor {
    /// HTTP status code.
    pub status: StatusCode,
    /// JSON encoded body.
    pub body: Bytes,
}

impl ResponseDescriptor {
    /// Builds an HTTP response from this descriptor.
    #[must_use]
    pub fn to_response(&self) -> Response {
        (
            self.status,
            [(
                header::CONTENT_TYPE,
                HeaderValue::from_static("application/json"),
            )],
            Body::from(self.body.clone()),
        )
            .into_response()
    }
}

/// Immutable table of every response the gateway can send.
///
/// Built once and shared by all requests.
#[derive(Debug, Clone)]
pub struct ResponseCatalog {
    entries: [ResponseDescriptor; ResponseKind::ALL.len()],
}

impl ResponseCatalog {
    /// Encodes every message and builds the table.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: ResponseKind::ALL.map(|kind| ResponseDescriptor {
                status: kind.status(),
                body: Bytes::from(
                    serde_json::Value::String(kind.message().to_string()).to_string(),
                ),
            }),
        }
    }

    /// Returns the descriptor of `kind`.
    #[must_use]
    pub fn get(&self, kind: ResponseKind) -> &ResponseDescriptor {
        &self.entries[kind as usize]
    }

    /// Returns the HTTP response of `kind`.
    #[must_use]
    pub fn respond(&self, kind: ResponseKind) -> Response {
        self.get(kind).to_response()
    }
}

impl Default for ResponseCatalog {
    fn default() -> Self {
        Self::new()
    }
}
