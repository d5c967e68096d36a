//! Transport abstraction for the session and client.
//!
//! A connection exposes two byte channels over one socket: the secure
//! channel carries control frames, file names and chunk handshakes, and
//! the raw channel carries chunk payloads. Code using a [`Transport`]
//! borrows one channel at a time, so the two can never be interleaved
//! by accident.
//!
//! Every write on the secure channel must be flushed before the next raw
//! write. A TLS stream buffers records until flushed, and a payload that
//! overtakes them would land in the peer's record parser.

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;

/// The two channels of one connection.
pub trait Transport: Send {
    /// Channel for control traffic.
    type Secure: AsyncRead + AsyncWrite + Unpin + Send;
    /// Channel for bulk chunk payloads.
    type Raw: AsyncRead + AsyncWrite + Unpin + Send;

    /// Borrow the secure channel.
    fn secure(&mut self) -> &mut Self::Secure;

    /// Borrow the raw channel.
    fn raw(&mut self) -> &mut Self::Raw;
}

impl Transport for tokio_rustls::server::TlsStream<TcpStream> {
    type Secure = Self;
    type Raw = TcpStream;

    fn secure(&mut self) -> &mut Self::Secure {
        self
    }

    fn raw(&mut self) -> &mut Self::Raw {
        self.get_mut().0
    }
}

impl Transport for tokio_rustls::client::TlsStream<TcpStream> {
    type Secure = Self;
    type Raw = TcpStream;

    fn secure(&mut self) -> &mut Self::Secure {
        self
    }

    fn raw(&mut self) -> &mut Self::Raw {
        self.get_mut().0
    }
}

/// A single stream used as both channels.
///
/// The chunk handshakes still run; they just travel on the same bytes
/// as the payload.
#[derive(Debug)]
pub struct Plain<S> {
    stream: S,
}

impl<S> Plain<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    pub fn new(stream: S) -> Self {
        Self { stream }
    }

    pub fn into_inner(self) -> S {
        self.stream
    }
}

impl<S> Transport for Plain<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    type Secure = S;
    type Raw = S;

    fn secure(&mut self) -> &mut S {
        &mut self.stream
    }

    fn raw(&mut self) -> &mut S {
        &mut self.stream
    }
}

/// An in-memory transport for testing.
///
/// Both ends of a [`tokio::io::duplex`] pipe, wrapped as [`Plain`]
/// transports.
pub mod memory {
    use super::Plain;
    use tokio::io::DuplexStream;

    /// A memory transport endpoint.
    pub type MemoryTransport = Plain<DuplexStream>;

    /// Create a connected pair of transports.
    ///
    /// `buffer` bounds the bytes in flight in each direction.
    pub fn pair(buffer: usize) -> (MemoryTransport, MemoryTransport) {
        let (a, b) = tokio::io::duplex(buffer);
        (Plain::new(a), Plain::new(b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    #[tokio::test]
    async fn test_memory_pair_channels_share_bytes() {
        let (mut a, mut b) = memory::pair(64);

        a.secure().write_all(b"ctl").await.unwrap();
        a.raw().write_all(b"raw").await.unwrap();
        a.secure().flush().await.unwrap();

        let mut buf = [0u8; 6];
        b.raw().read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"ctlraw");
    }
}
