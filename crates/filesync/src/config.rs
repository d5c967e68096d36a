//! Server configuration.

use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;

use filesync_protocol::SessionConfig;

/// Default listening port.
pub const DEFAULT_PORT: u16 = 3333;

/// Where credentials are kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialsConfig {
    /// In-process map, lost on exit.
    Memory,
    /// SQLite database file.
    Sqlite(PathBuf),
}

/// PEM files for the TLS listener.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsConfig {
    /// Certificate chain, leaf first.
    pub cert_chain: PathBuf,
    /// Private key matching the leaf certificate.
    pub private_key: PathBuf,
}

/// Configuration for a [`Server`](crate::Server).
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to listen on.
    pub bind_addr: SocketAddr,
    /// Managed directory served to clients.
    pub data_dir: PathBuf,
    /// Credential backend.
    pub credentials: CredentialsConfig,
    /// TLS material; `None` serves plain TCP.
    pub tls: Option<TlsConfig>,
    /// Runtime worker threads.
    pub worker_threads: usize,
    /// Per-connection limits.
    pub session: SessionConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)),
            data_dir: PathBuf::from("data"),
            credentials: CredentialsConfig::Memory,
            tls: None,
            worker_threads: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(2),
            session: SessionConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Build the multi-thread runtime this configuration asks for.
    pub fn runtime(&self) -> io::Result<tokio::runtime::Runtime> {
        tokio::runtime::Builder::new_multi_thread()
            .worker_threads(self.worker_threads.max(1))
            .thread_name("filesync-worker")
            .enable_all()
            .build()
    }
}
