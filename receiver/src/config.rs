//! Gateway configuration module.
//!
//! Handles loading configuration from environment variables with sensible defaults.

use serde::{Deserialize, Serialize};
use shared::hec::HecToOtelAttrs;
use thiserror::Error;
use validator::Validate;

/// Default listening endpoint of the HEC protocol.
pub const DEFAULT_ENDPOINT: &str = "0.0.0.0:8088";

/// Default limit on the size of a request body, before decompression.
pub const DEFAULT_MAX_REQUEST_BODY_BYTES: usize = 20 * 1024 * 1024;

/// Errors that can occur while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An environment variable holds a value that cannot be parsed.
    #[error("Invalid value '{value}' for {var}")]
    InvalidValue {
        /// The environment variable name.
        var: &'static str,
        /// The offending value.
        value: String,
    },

    /// The path glob does not compile.
    #[error("Invalid path glob '{path}': {source}")]
    InvalidPathGlob {
        /// The configured path.
        path: String,
        /// The underlying pattern error.
        #[source]
        source: glob::PatternError,
    },

    /// Only one of the TLS certificate and key files is set.
    #[error("TLS requires both a certificate file and a key file")]
    IncompleteTls,

    /// The logs and metrics listeners are configured on the same address.
    #[error("Logs and metrics listeners cannot share endpoint '{0}'")]
    SharedEndpoint(String),

    /// Field validation failed.
    #[error("Validation failed: {0}")]
    ValidationError(#[from] validator::ValidationErrors),
}

/// TLS settings for the listener.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct TlsSettings {
    /// Path to the PEM encoded certificate chain.
    #[validate(length(min = 1, message = "Certificate file cannot be empty"))]
    pub cert_file: String,

    /// Path to the PEM encoded private key.
    #[validate(length(min = 1, message = "Key file cannot be empty"))]
    pub key_file: String,
}

/// Gateway configuration.
///
/// Configuration values can be set via environment variables:
/// - `HEC_RECEIVER_ENDPOINT`: The address to listen on (default: "0.0.0.0:8088")
/// - `HEC_RECEIVER_PATH`: Glob the request path must match (default: any path)
/// - `HEC_RECEIVER_ACCESS_TOKEN_PASSTHROUGH`: Forward the `Authorization`
///   header as a resource attribute (default: false)
/// - `HEC_RECEIVER_TLS_CERT_FILE` / `HEC_RECEIVER_TLS_KEY_FILE`: Enable TLS
/// - `HEC_RECEIVER_MAX_BODY_BYTES`: Request body size limit (default: 20 MiB)
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct GatewayConfig {
    /// The address to listen on.
    #[validate(length(min = 1, message = "Endpoint cannot be empty"))]
    pub endpoint: String,

    /// TLS settings; plain HTTP when absent.
    #[validate(nested)]
    pub tls: Option<TlsSettings>,

    /// Glob the request path must match; every path matches when absent.
    pub path: Option<String>,

    /// Whether to forward the sender's token as a resource attribute.
    pub access_token_passthrough: bool,

    /// Resource attribute keys for HEC metadata.
    pub hec_metadata_to_otel_attrs: HecToOtelAttrs,

    /// Request body size limit in bytes.
    #[validate(range(min = 1, message = "Body limit must be positive"))]
    pub max_request_body_bytes: usize,
}

impl GatewayConfig {
    /// Creates a new configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - A boolean or numeric variable cannot be parsed
    /// - Only one of the TLS file variables is set
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let endpoint =
            std::env::var("HEC_RECEIVER_ENDPOINT").unwrap_or_else(|_| defaults.endpoint.clone());
        let path = std::env::var("HEC_RECEIVER_PATH")
            .ok()
            .filter(|p| !p.is_empty());

        let access_token_passthrough = parse_env("HEC_RECEIVER_ACCESS_TOKEN_PASSTHROUGH")?
            .unwrap_or(defaults.access_token_passthrough);
        let max_request_body_bytes = parse_env("HEC_RECEIVER_MAX_BODY_BYTES")?
            .unwrap_or(defaults.max_request_body_bytes);

        let tls = match (
            std::env::var("HEC_RECEIVER_TLS_CERT_FILE").ok(),
            std::env::var("HEC_RECEIVER_TLS_KEY_FILE").ok(),
        ) {
            (Some(cert_file), Some(key_file)) => Some(TlsSettings {
                cert_file,
                key_file,
            }),
            (None, None) => None,
            _ => return Err(ConfigError::IncompleteTls),
        };

        Ok(Self {
            endpoint,
            tls,
            path,
            access_token_passthrough,
            max_request_body_bytes,
            ..defaults
        })
    }

    /// Compiles the path glob, if one is configured.
    ///
    /// # Errors
    ///
    /// Returns an error if the glob is invalid.
    pub fn path_pattern(&self) -> Result<Option<glob::Pattern>, ConfigError> {
        self.path
            .as_deref()
            .map(|path| {
                glob::Pattern::new(path).map_err(|source| ConfigError::InvalidPathGlob {
                    path: path.to_string(),
                    source,
                })
            })
            .transpose()
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The endpoint is empty
    /// - A TLS file path is empty
    /// - The path glob is invalid
    /// - The body limit is zero
    pub fn validate_config(&self) -> Result<(), ConfigError> {
        self.validate()?;
        self.path_pattern()?;
        Ok(())
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            tls: None,
            path: None,
            access_token_passthrough: false,
            hec_metadata_to_otel_attrs: HecToOtelAttrs::default(),
            max_request_body_bytes: DEFAULT_MAX_REQUEST_BODY_BYTES,
        }
    }
}

/// Listeners of the standalone receiver.
///
/// Each route gets its own gateway. The logs listener uses the
/// `HEC_RECEIVER_*` variables of [`GatewayConfig`]; setting
/// `HEC_RECEIVER_METRICS_ENDPOINT` adds a metrics listener on that address
/// with the same remaining settings.
#[derive(Debug, Clone)]
pub struct ReceiverConfig {
    /// The logs listener.
    pub logs: GatewayConfig,
    /// The metrics listener, if enabled.
    pub metrics: Option<GatewayConfig>,
}

impl ReceiverConfig {
    /// Creates the listener configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if the logs listener configuration cannot be loaded.
    pub fn from_env() -> Result<Self, ConfigError> {
        let logs = GatewayConfig::from_env()?;
        let metrics_endpoint = std::env::var("HEC_RECEIVER_METRICS_ENDPOINT")
            .ok()
            .filter(|e| !e.is_empty());

        Ok(Self::with_metrics_endpoint(logs, metrics_endpoint))
    }

    fn with_metrics_endpoint(logs: GatewayConfig, metrics_endpoint: Option<String>) -> Self {
        let metrics = metrics_endpoint.map(|endpoint| GatewayConfig {
            endpoint,
            ..logs.clone()
        });
        Self { logs, metrics }
    }

    /// Validates every listener.
    ///
    /// # Errors
    ///
    /// Returns an error if a listener is invalid or both listeners name the
    /// same fixed address.
    pub fn validate_config(&self) -> Result<(), ConfigError> {
        self.logs.validate_config()?;
        if let Some(metrics) = &self.metrics {
            metrics.validate_config()?;
            if metrics.endpoint == self.logs.endpoint && !metrics.endpoint.ends_with(":0") {
                return Err(ConfigError::SharedEndpoint(metrics.endpoint.clone()));
            }
        }
        Ok(())
    }
}

impl From<GatewayConfig> for ReceiverConfig {
    fn from(logs: GatewayConfig) -> Self {
        Self {
            logs,
            metrics: None,
        }
    }
}

/// Reads and parses an optional environment variable.
fn parse_env<T: std::str::FromStr>(var: &'static str) -> Result<Option<T>, ConfigError> {
    std::env::var(var)
        .ok()
        .map(|value| {
            value
                .trim()
                .parse::<T>()
                .map_err(|_| ConfigError::InvalidValue { var, value })
        })
        .transpose()
}
