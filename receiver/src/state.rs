//! Application state module.
//!
//! Defines the shared state that is passed to the HEC request handler.

use crate::config::{ConfigError, GatewayConfig};
use crate::gateway::WRITE_TIMEOUT;
use crate::response::ResponseCatalog;
use shared::consumer::{LogsConsumer, MetricsConsumer};
use shared::hec::HecToOtelAttrs;
use std::sync::Arc;
use std::time::Duration;

/// The downstream consumer of a gateway.
///
/// A gateway serves exactly one route; events of the other kind are rejected.
/// Deployments that ingest both kinds run one gateway per route.
#[derive(Clone)]
pub enum Route {
    /// Receives metrics batches.
    Metrics(Arc<dyn MetricsConsumer>),
    /// Receives logs batches.
    Logs(Arc<dyn LogsConsumer>),
}

impl Route {
    /// Routes metric events to `consumer`.
    #[must_use]
    pub fn metrics(consumer: Arc<dyn MetricsConsumer>) -> Self {
        Self::Metrics(consumer)
    }

    /// Routes log events to `consumer`.
    #[must_use]
    pub fn logs(consumer: Arc<dyn LogsConsumer>) -> Self {
        Self::Logs(consumer)
    }

    /// Name of the route, for logs.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Metrics(_) => "metrics",
            Self::Logs(_) => "logs",
        }
    }
}

impl std::fmt::Debug for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Route").field(&self.name()).finish()
    }
}

/// State shared across all HEC requests of one gateway.
#[derive(Clone, Debug)]
pub struct ReceiverState {
    responses: Arc<ResponseCatalog>,
    route: Route,
    path: Option<Arc<glob::Pattern>>,
    access_token_passthrough: bool,
    attrs: Arc<HecToOtelAttrs>,
    max_request_body_bytes: usize,
    request_timeout: Duration,
}

impl ReceiverState {
    /// Creates the state from a configuration and its consumer.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured path glob is invalid.
    pub fn new(config: &GatewayConfig, route: Route) -> Result<Self, ConfigError> {
        Ok(Self {
            responses: Arc::new(ResponseCatalog::new()),
            route,
            path: config.path_pattern()?.map(Arc::new),
            access_token_passthrough: config.access_token_passthrough,
            attrs: Arc::new(config.hec_metadata_to_otel_attrs.clone()),
            max_request_body_bytes: config.max_request_body_bytes,
            request_timeout: WRITE_TIMEOUT,
        })
    }

    #[cfg(test)]
    pub(crate) fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Returns the response catalog.
    #[must_use]
    pub fn responses(&self) -> &ResponseCatalog {
        &self.responses
    }

    /// Returns the consumer.
    #[must_use]
    pub fn route(&self) -> &Route {
        &self.route
    }

    /// Whether `path` is served by this gateway.
    #[must_use]
    pub fn matches_path(&self, path: &str) -> bool {
        self.path.as_ref().is_none_or(|pattern| pattern.matches(path))
    }

    /// Whether the sender's token is forwarded.
    #[must_use]
    pub fn access_token_passthrough(&self) -> bool {
        self.access_token_passthrough
    }

    /// Resource attribute keys for HEC metadata.
    #[must_use]
    pub fn attrs(&self) -> &HecToOtelAttrs {
        &self.attrs
    }

    /// Request body size limit in bytes.
    #[must_use]
    pub fn max_request_body_bytes(&self) -> usize {
        self.max_request_body_bytes
    }

    /// Time allowed to handle a request and write its response.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }
}
