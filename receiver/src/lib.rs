//! HEC Receiver
//!
//! This crate provides an ingestion gateway for the Splunk HTTP Event Collector
//! (HEC) protocol. It accepts metric and log events over HTTP, optionally gzip
//! compressed and streamed as concatenated JSON objects, converts them into
//! the internal batch model and hands the batches to downstream consumers.
//!
//! # Architecture
//!
//! The gateway is built on Axum, Hyper and Tokio:
//! - [`Gateway`] owns the listening socket and the accept loop
//! - A single HEC handler runs path, method and encoding checks, decodes the
//!   body and hands the events to the gateway's metrics or logs consumer
//! - Each gateway serves one [`Route`]; the standalone binary runs one gateway
//!   per route
//! - [`ResponseCatalog`] holds the fixed responses HEC senders expect
//!
//! # Example
//!
//! ```no_run
//! use hec_receiver::{Gateway, GatewayConfig, GatewayError, Route};
//! use shared::consumer::LoggingConsumer;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let route = Route::logs(Arc::new(LoggingConsumer));
//!     let mut gateway = Gateway::new(GatewayConfig::default(), route);
//!
//!     let (host, mut errors) = tokio::sync::mpsc::unbounded_channel::<GatewayError>();
//!     gateway.start(host).await?;
//!
//!     if let Some(error) = errors.recv().await {
//!         eprintln!("gateway failed: {error}");
//!     }
//!     gateway.shutdown().await?;
//!     Ok(())
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod config;
mod customizer;
mod gateway;
mod listener;
mod response;
mod routes;
mod state;

pub use config::{ConfigError, GatewayConfig, ReceiverConfig, TlsSettings};
pub use customizer::ResourceCustomizer;
pub use gateway::{Gateway, GatewayError, Host, HEADER_READ_TIMEOUT, WRITE_TIMEOUT};
pub use listener::{bind, build_tls_acceptor, BoundListener};
pub use response::{ResponseCatalog, ResponseDescriptor, ResponseKind};
pub use routes::{route_events, RequestError, RoutedEvents};
pub use state::{ReceiverState, Route};

use anyhow::Result;
use axum::Router;
use shared::consumer::LoggingConsumer;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Runs the HEC receiver.
///
/// This function loads configuration from environment variables, starts one
/// gateway per configured route, each logging every batch it receives, and
/// runs until a shutdown signal or a fatal gateway error.
///
/// # Errors
///
/// Returns an error if:
/// - Configuration cannot be loaded from environment or is invalid
/// - A gateway fails to bind to its configured address
/// - An accept loop fails while running
pub async fn run_gateway() -> Result<()> {
    let config = ReceiverConfig::from_env()?;
    run_gateway_with_config(config).await
}

/// Runs the HEC receiver with the provided configuration.
///
/// # Errors
///
/// Returns an error if:
/// - The configuration is invalid
/// - A gateway fails to bind to its configured address
/// - An accept loop fails while running
pub async fn run_gateway_with_config(config: ReceiverConfig) -> Result<()> {
    config.validate_config()?;

    tracing::info!(
        logs_endpoint = %config.logs.endpoint,
        metrics_endpoint = config.metrics.as_ref().map(|m| m.endpoint.as_str()),
        access_token_passthrough = config.logs.access_token_passthrough,
        "HEC receiver starting"
    );

    let mut gateways = vec![Gateway::new(
        config.logs,
        Route::logs(Arc::new(LoggingConsumer)),
    )];
    if let Some(metrics) = config.metrics {
        gateways.push(Gateway::new(
            metrics,
            Route::metrics(Arc::new(LoggingConsumer)),
        ));
    }

    let (host, mut errors) = tokio::sync::mpsc::unbounded_channel::<GatewayError>();
    let fatal = match start_all(&mut gateways, &host).await {
        Err(error) => Some(error),
        Ok(()) => tokio::select! {
            () = shutdown_signal() => None,
            error = errors.recv() => error,
        },
    };

    for gateway in &mut gateways {
        gateway.shutdown().await?;
    }

    if let Some(error) = fatal {
        return Err(error.into());
    }

    tracing::info!("Receiver shutdown complete");
    Ok(())
}

async fn start_all(
    gateways: &mut [Gateway],
    host: &tokio::sync::mpsc::UnboundedSender<GatewayError>,
) -> Result<(), GatewayError> {
    for gateway in gateways {
        gateway.start(host.clone()).await?;
    }
    Ok(())
}

/// Creates the HEC router with its middleware.
///
/// This function is public to allow testing the router without binding a socket.
pub fn create_router(state: ReceiverState) -> Router {
    routes::hec_routes(state).layer(TraceLayer::new_for_http())
}

/// Waits for a shutdown signal (SIGTERM or SIGINT).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = tokio::signal::ctrl_c().await {
            tracing::error!(%error, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(error) => {
                tracing::error!(%error, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, starting shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting shutdown");
        }
    }
}
