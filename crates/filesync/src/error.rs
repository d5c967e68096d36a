//! Error types for the server facade.

use filesync_core::ValidationError;
use filesync_protocol::ProtocolError;
use filesync_store::StoreError;
use thiserror::Error;

/// Errors that can occur while setting up or running a server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Storage error.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    /// Protocol error.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Credential format error.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// TLS configuration error.
    #[error("TLS error: {0}")]
    Tls(String),

    /// Socket or filesystem error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A background task failed to complete.
    #[error("task failed: {0}")]
    Task(String),
}

impl From<rustls::Error> for ServerError {
    fn from(e: rustls::Error) -> Self {
        ServerError::Tls(e.to_string())
    }
}

/// Result type for server operations.
pub type Result<T> = std::result::Result<T, ServerError>;
