//! TLS setup for both ends of a connection.
//!
//! The server side is an [`Upgrade`] that runs the rustls handshake on
//! each accepted socket. The client side connects and handshakes in one
//! call. Both use the ring crypto provider explicitly.

use std::fs::File;
use std::io::{self, BufReader};
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use rustls::pki_types::{CertificateDer, PrivateKeyDer, ServerName};
use rustls::{ClientConfig, RootCertStore, ServerConfig};
use tokio::net::{TcpStream, ToSocketAddrs};
use tokio_rustls::{client, server, TlsAcceptor, TlsConnector};

use filesync_protocol::Plain;

use crate::config::TlsConfig;
use crate::error::{Result, ServerError};
use crate::listener::Upgrade;

fn provider() -> Arc<rustls::crypto::CryptoProvider> {
    Arc::new(rustls::crypto::ring::default_provider())
}

/// Read every certificate from a PEM file.
pub fn load_certs(path: &Path) -> Result<Vec<CertificateDer<'static>>> {
    let mut reader = BufReader::new(File::open(path)?);
    let certs = rustls_pemfile::certs(&mut reader).collect::<io::Result<Vec<_>>>()?;
    if certs.is_empty() {
        return Err(ServerError::Tls(format!(
            "no certificates in {}",
            path.display()
        )));
    }
    Ok(certs)
}

/// Read the first private key from a PEM file.
pub fn load_private_key(path: &Path) -> Result<PrivateKeyDer<'static>> {
    let mut reader = BufReader::new(File::open(path)?);
    rustls_pemfile::private_key(&mut reader)?
        .ok_or_else(|| ServerError::Tls(format!("no private key in {}", path.display())))
}

/// Build a root store trusting the certificates in a PEM file.
pub fn load_root_store(path: &Path) -> Result<RootCertStore> {
    let mut roots = RootCertStore::empty();
    for cert in load_certs(path)? {
        roots.add(cert)?;
    }
    Ok(roots)
}

/// Server-side TLS handshake.
#[derive(Clone)]
pub struct TlsUpgrade {
    acceptor: TlsAcceptor,
}

impl TlsUpgrade {
    /// Build from an in-memory certificate chain and key.
    pub fn new(cert_chain: Vec<CertificateDer<'static>>, key: PrivateKeyDer<'static>) -> Result<Self> {
        let mut config = ServerConfig::builder_with_provider(provider())
            .with_safe_default_protocol_versions()?
            .with_no_client_auth()
            .with_single_cert(cert_chain, key)?;
        // Tickets arrive unprompted after the handshake; keep the stream
        // quiet so nothing is in flight when the client reads raw bytes.
        config.send_tls13_tickets = 0;

        Ok(Self {
            acceptor: TlsAcceptor::from(Arc::new(config)),
        })
    }

    /// Build from the PEM files named in `config`.
    pub fn from_config(config: &TlsConfig) -> Result<Self> {
        let certs = load_certs(&config.cert_chain)?;
        let key = load_private_key(&config.private_key)?;
        Self::new(certs, key)
    }
}

#[async_trait]
impl Upgrade for TlsUpgrade {
    type Stream = server::TlsStream<TcpStream>;

    async fn upgrade(&self, stream: TcpStream) -> io::Result<Self::Stream> {
        self.acceptor.accept(stream).await
    }
}

/// Connect to a TLS server, verifying it against `roots`.
pub async fn connect_tls<A>(
    addr: A,
    server_name: &str,
    roots: RootCertStore,
) -> Result<client::TlsStream<TcpStream>>
where
    A: ToSocketAddrs,
{
    let config = ClientConfig::builder_with_provider(provider())
        .with_safe_default_protocol_versions()?
        .with_root_certificates(roots)
        .with_no_client_auth();
    let connector = TlsConnector::from(Arc::new(config));
    let name = ServerName::try_from(server_name.to_string())
        .map_err(|e| ServerError::Tls(format!("invalid server name {}: {}", server_name, e)))?;

    let stream = TcpStream::connect(addr).await?;
    stream.set_nodelay(true)?;
    Ok(connector.connect(name, stream).await?)
}

/// Connect without TLS; both channels share the plain socket.
pub async fn connect_plain<A>(addr: A) -> Result<Plain<TcpStream>>
where
    A: ToSocketAddrs,
{
    let stream = TcpStream::connect(addr).await?;
    stream.set_nodelay(true)?;
    Ok(Plain::new(stream))
}
