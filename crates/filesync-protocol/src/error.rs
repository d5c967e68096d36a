//! Error types for the protocol module.

use std::io;

use thiserror::Error;

/// Errors that end a session or a client call.
///
/// Anything the peer can be told about is turned into a
/// [`Response`](filesync_core::Response) instead; these are the failures
/// after which the two ends can no longer agree on where they are in the
/// byte stream.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Transport-level error.
    #[error("transport error: {0}")]
    Io(#[from] io::Error),

    /// A control payload could not be decoded.
    #[error("codec error: {0}")]
    Codec(#[from] filesync_core::CodecError),

    /// The peer announced a frame larger than we accept.
    #[error("frame of {len} bytes exceeds limit of {max}")]
    FrameTooLarge { len: usize, max: usize },

    /// The peer announced a transfer chunk larger than we accept.
    #[error("chunk of {len} bytes exceeds limit of {max}")]
    ChunkTooLarge { len: usize, max: usize },

    /// A file name on the transfer stream was not acceptable.
    #[error("invalid file name: {0}")]
    InvalidFileName(String),
}

impl ProtocolError {
    /// Whether this error is the peer going away rather than a fault.
    pub fn is_disconnect(&self) -> bool {
        match self {
            ProtocolError::Io(e) => matches!(
                e.kind(),
                io::ErrorKind::UnexpectedEof
                    | io::ErrorKind::ConnectionReset
                    | io::ErrorKind::ConnectionAborted
                    | io::ErrorKind::BrokenPipe
            ),
            _ => false,
        }
    }
}

/// Result type for protocol operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;
