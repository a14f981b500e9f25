//! Gateway lifecycle.
//!
//! A [`Gateway`] owns the listening socket of one HEC endpoint. `start` binds
//! it and spawns the accept loop; later accept failures go to the [`Host`]
//! instead of a caller. `shutdown` closes the socket. Connections that were
//! already accepted keep running until they finish or hit a timeout.

use crate::config::{ConfigError, GatewayConfig};
use crate::listener::{self, BoundListener};
use crate::state::{ReceiverState, Route};
use axum::Router;
use hyper_util::rt::{TokioExecutor, TokioIo, TokioTimer};
use hyper_util::server::conn::auto::Builder;
use hyper_util::service::TowerToHyperService;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

/// Time allowed for a client to send the request headers.
pub const HEADER_READ_TIMEOUT: Duration = Duration::from_secs(20);

/// Time allowed to handle a request and write its response.
pub const WRITE_TIMEOUT: Duration = Duration::from_secs(20);

/// Errors raised by the gateway lifecycle.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The endpoint could not be bound.
    #[error("Failed to bind {endpoint}: {source}")]
    Bind {
        /// The configured endpoint.
        endpoint: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The TLS material could not be loaded.
    #[error("TLS error: {0}")]
    Tls(String),

    /// The configuration is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// `start` was called on a running gateway.
    #[error("Gateway already started")]
    AlreadyStarted,

    /// The accept loop failed.
    #[error("Failed to accept connections: {0}")]
    Serve(#[source] std::io::Error),

    /// The accept loop task panicked or was cancelled.
    #[error("Accept loop task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Receives errors the gateway cannot return to a caller.
pub trait Host: Send + Sync + 'static {
    /// Reports a failure that stopped the gateway.
    fn report_fatal_error(&self, error: GatewayError);
}

impl Host for mpsc::UnboundedSender<GatewayError> {
    fn report_fatal_error(&self, error: GatewayError) {
        if let Err(mpsc::error::SendError(error)) = self.send(error) {
            tracing::error!(%error, "Fatal gateway error with no host listening");
        }
    }
}

struct Running {
    local_addr: SocketAddr,
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

/// One HEC endpoint and its consumer.
pub struct Gateway {
    config: GatewayConfig,
    route: Route,
    running: Option<Running>,
}

impl Gateway {
    /// Creates a stopped gateway.
    #[must_use]
    pub fn new(config: GatewayConfig, route: Route) -> Self {
        Self {
            config,
            route,
            running: None,
        }
    }

    /// Binds the endpoint and starts accepting connections in the background.
    ///
    /// Returns the bound address, which differs from the configured one when
    /// the configured port is `0`.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The gateway is already running
    /// - The configuration is invalid
    /// - The TLS material cannot be loaded or the endpoint cannot be bound
    pub async fn start<H: Host>(&mut self, host: H) -> Result<SocketAddr, GatewayError> {
        if self.is_running() {
            return Err(GatewayError::AlreadyStarted);
        }
        // A loop stopped by a fatal error has already been reported.
        self.running = None;

        self.config.validate_config()?;
        let state = ReceiverState::new(&self.config, self.route.clone())?;
        let router = crate::create_router(state);

        let listener = listener::bind(&self.config).await?;
        let local_addr = listener.local_addr().map_err(GatewayError::Serve)?;

        tracing::info!(
            %local_addr,
            tls = listener.tls.is_some(),
            path = self.config.path.as_deref().unwrap_or("*"),
            route = self.route.name(),
            "HEC gateway listening"
        );

        let (shutdown, shutdown_rx) = oneshot::channel();
        let task = tokio::spawn(accept_loop(listener, router, shutdown_rx, host));

        self.running = Some(Running {
            local_addr,
            shutdown,
            task,
        });

        Ok(local_addr)
    }

    /// The bound address, while running.
    #[must_use]
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.running.as_ref().map(|running| running.local_addr)
    }

    /// Whether the accept loop is running.
    ///
    /// Turns false once the loop stops, including after a fatal accept error.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running
            .as_ref()
            .is_some_and(|running| !running.task.is_finished())
    }

    /// Closes the listening socket.
    ///
    /// Does nothing if the gateway is not running.
    ///
    /// # Errors
    ///
    /// Returns an error if the accept loop task panicked.
    pub async fn shutdown(&mut self) -> Result<(), GatewayError> {
        let Some(running) = self.running.take() else {
            return Ok(());
        };

        // The loop may already be gone after a fatal error.
        let _ = running.shutdown.send(());
        running.task.await?;

        tracing::info!(local_addr = %running.local_addr, "HEC gateway stopped");
        Ok(())
    }
}

impl std::fmt::Debug for Gateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gateway")
            .field("endpoint", &self.config.endpoint)
            .field("route", &self.route)
            .field("local_addr", &self.local_addr())
            .finish()
    }
}

/// Accept errors that only concern one connection.
fn is_connection_error(error: &std::io::Error) -> bool {
    matches!(
        error.kind(),
        std::io::ErrorKind::ConnectionAborted
            | std::io::ErrorKind::ConnectionReset
            | std::io::ErrorKind::ConnectionRefused
            | std::io::ErrorKind::Interrupted
    )
}

async fn accept_loop<H: Host>(
    listener: BoundListener,
    router: Router,
    mut shutdown: oneshot::Receiver<()>,
    host: H,
) {
    let BoundListener { tcp, tls } = listener;
    let service = TowerToHyperService::new(router);

    let timer = TokioTimer::new();
    let mut builder = Builder::new(TokioExecutor::new());
    builder
        .http1()
        .header_read_timeout(Some(HEADER_READ_TIMEOUT))
        .timer(timer.clone());
    builder.http2().timer(timer);
    let builder = Arc::new(builder);

    loop {
        let (stream, peer) = tokio::select! {
            _ = &mut shutdown => break,
            accepted = tcp.accept() => match accepted {
                Ok(accepted) => accepted,
                Err(error) if is_connection_error(&error) => {
                    tracing::debug!(%error, "Dropped connection during accept");
                    continue;
                }
                Err(error) => {
                    tracing::error!(%error, "HEC accept loop failed");
                    host.report_fatal_error(GatewayError::Serve(error));
                    break;
                }
            },
        };

        let builder = Arc::clone(&builder);
        let service = service.clone();
        let tls = tls.clone();

        tokio::spawn(async move {
            let served = match tls {
                Some(acceptor) => {
                    match tokio::time::timeout(HEADER_READ_TIMEOUT, acceptor.accept(stream)).await
                    {
                        Ok(Ok(stream)) => {
                            builder
                                .serve_connection(TokioIo::new(stream), service)
                                .await
                        }
                        Ok(Err(error)) => {
                            tracing::debug!(%peer, %error, "TLS handshake failed");
                            return;
                        }
                        Err(_) => {
                            tracing::debug!(%peer, "TLS handshake timed out");
                            return;
                        }
                    }
                }
                None => {
                    builder
                        .serve_connection(TokioIo::new(stream), service)
                        .await
                }
            };

            if let Err(error) = served {
                tracing::debug!(%peer, %error, "Connection closed with error");
            }
        });
    }

    tracing::debug!("HEC accept loop stopped");
}
