//! Listener construction.
//!
//! Binds the TCP socket of a gateway and, when TLS is configured, builds the
//! rustls acceptor used on every accepted connection.

use crate::config::{GatewayConfig, TlsSettings};
use crate::gateway::GatewayError;
use rustls::ServerConfig;
use std::io::BufReader;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_rustls::TlsAcceptor;

/// A bound socket, ready to accept connections.
pub struct BoundListener {
    /// The TCP listener.
    pub tcp: TcpListener,
    /// TLS acceptor, when TLS is configured.
    pub tls: Option<TlsAcceptor>,
}

impl BoundListener {
    /// Address the socket is bound to.
    ///
    /// # Errors
    ///
    /// Returns an error if the socket address cannot be read.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.tcp.local_addr()
    }
}

impl std::fmt::Debug for BoundListener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundListener")
            .field("tcp", &self.tcp)
            .field("tls", &self.tls.is_some())
            .finish()
    }
}

/// Binds the configured endpoint.
///
/// TLS material is loaded before the socket is bound, so a bad certificate
/// never leaves a half-started listener behind.
///
/// # Errors
///
/// Returns an error if the TLS material cannot be loaded or the endpoint
/// cannot be bound.
pub async fn bind(config: &GatewayConfig) -> Result<BoundListener, GatewayError> {
    let tls = config.tls.as_ref().map(build_tls_acceptor).transpose()?;

    let tcp = TcpListener::bind(&config.endpoint)
        .await
        .map_err(|source| GatewayError::Bind {
            endpoint: config.endpoint.clone(),
            source,
        })?;

    Ok(BoundListener { tcp, tls })
}

/// Build a TLS acceptor from certificate and key files.
///
/// # Errors
///
/// Returns an error if a file cannot be read or does not hold usable PEM data.
pub fn build_tls_acceptor(settings: &TlsSettings) -> Result<TlsAcceptor, GatewayError> {
    let server_config = build_server_config(settings)?;
    Ok(TlsAcceptor::from(Arc::new(server_config)))
}

fn build_server_config(settings: &TlsSettings) -> Result<ServerConfig, GatewayError> {
    let cert_path = Path::new(&settings.cert_file);
    let key_path = Path::new(&settings.key_file);

    let cert_file = std::fs::File::open(cert_path).map_err(|e| {
        GatewayError::Tls(format!(
            "Failed to open certificate file {}: {e}",
            cert_path.display()
        ))
    })?;
    let certs = rustls_pemfile::certs(&mut BufReader::new(cert_file))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| GatewayError::Tls(format!("Failed to parse certificate: {e}")))?;

    if certs.is_empty() {
        return Err(GatewayError::Tls(
            "No certificates found in certificate file".to_string(),
        ));
    }

    let key_file = std::fs::File::open(key_path).map_err(|e| {
        GatewayError::Tls(format!(
            "Failed to open key file {}: {e}",
            key_path.display()
        ))
    })?;
    let key = rustls_pemfile::private_key(&mut BufReader::new(key_file))
        .map_err(|e| GatewayError::Tls(format!("Failed to parse private key: {e}")))?
        .ok_or_else(|| GatewayError::Tls("No private key found in key file".to_string()))?;

    ServerConfig::builder_with_provider(Arc::new(rustls::crypto::ring::default_provider()))
        .with_safe_default_protocol_versions()
        .map_err(|e| GatewayError::Tls(format!("TLS configuration error: {e}")))?
        .with_no_client_auth()
        .with_single_cert(certs, key)
        .map_err(|e| GatewayError::Tls(format!("TLS configuration error: {e}")))
}
