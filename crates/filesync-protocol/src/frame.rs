//! Length-prefixed framing for the control channel.
//!
//! A frame is a little-endian `u32` byte count followed by that many
//! payload bytes. There is no type tag: both ends know from the protocol
//! state whether the next frame is a request or a response.

use std::io;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use filesync_core::{decode_response, encode_request, encode_response, Request, Response};

use crate::error::{ProtocolError, Result};

/// Read one frame, refusing declared lengths above `max_len`.
pub async fn read_frame<R>(reader: &mut R, max_len: usize) -> Result<Vec<u8>>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let len = reader.read_u32_le().await? as usize;
    if len > max_len {
        return Err(ProtocolError::FrameTooLarge { len, max: max_len });
    }

    // Grow with the bytes that actually arrive, not the declared length.
    let mut payload = Vec::new();
    let read = (&mut *reader)
        .take(len as u64)
        .read_to_end(&mut payload)
        .await?;
    if read < len {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!("frame ended after {} of {} bytes", read, len),
        )
        .into());
    }
    Ok(payload)
}

/// Write one frame and flush it.
pub async fn write_frame<W>(writer: &mut W, payload: &[u8]) -> Result<()>
where
    W: AsyncWrite + Unpin + ?Sized,
{
    let len = u32::try_from(payload.len()).map_err(|_| ProtocolError::FrameTooLarge {
        len: payload.len(),
        max: u32::MAX as usize,
    })?;

    writer.write_u32_le(len).await?;
    writer.write_all(payload).await?;
    writer.flush().await?;
    Ok(())
}

/// Encode and send a request.
pub async fn write_request<W>(writer: &mut W, request: &Request) -> Result<()>
where
    W: AsyncWrite + Unpin + ?Sized,
{
    write_frame(writer, &encode_request(request)).await
}

/// Encode and send a response.
pub async fn write_response<W>(writer: &mut W, response: &Response) -> Result<()>
where
    W: AsyncWrite + Unpin + ?Sized,
{
    write_frame(writer, &encode_response(response)).await
}

/// Receive and decode a response.
pub async fn read_response<R>(reader: &mut R, max_len: usize) -> Result<Response>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let payload = read_frame(reader, max_len).await?;
    Ok(decode_response(&payload)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use filesync_core::Status;

    #[tokio::test]
    async fn test_frame_layout() {
        let mut buf = Vec::new();
        write_frame(&mut buf, b"abc").await.unwrap();
        assert_eq!(buf, vec![3, 0, 0, 0, b'a', b'b', b'c']);
    }

    #[tokio::test]
    async fn test_empty_frame() {
        let mut buf = Vec::new();
        write_frame(&mut buf, b"").await.unwrap();
        assert_eq!(buf, vec![0, 0, 0, 0]);

        let payload = read_frame(&mut &buf[..], 16).await.unwrap();
        assert!(payload.is_empty());
    }

    #[tokio::test]
    async fn test_oversized_frame_rejected() {
        let bytes = [0x00u8, 0x01, 0x00, 0x00]; // 256
        let err = read_frame(&mut &bytes[..], 255).await.unwrap_err();
        assert!(matches!(err, ProtocolError::FrameTooLarge { len: 256, max: 255 }));
    }

    #[tokio::test]
    async fn test_truncated_frame_is_disconnect() {
        let bytes = [5u8, 0, 0, 0, b'a', b'b'];
        let err = read_frame(&mut &bytes[..], 64).await.unwrap_err();
        assert!(err.is_disconnect());
    }

    #[tokio::test]
    async fn test_declared_length_is_not_preallocated() {
        let (mut a, mut b) = tokio::io::duplex(64);
        let max = 64 << 20;

        a.write_u32_le(max as u32).await.unwrap();
        a.write_all(b"short").await.unwrap();
        drop(a);

        let err = read_frame(&mut b, max).await.unwrap_err();
        assert!(err.is_disconnect());
        assert!(err.to_string().contains("5 of 67108864"));
    }

    #[tokio::test]
    async fn test_response_over_duplex() {
        let (mut a, mut b) = tokio::io::duplex(64);
        let sent = Response::new(Status::HashMiss, "stale");

        write_response(&mut a, &sent).await.unwrap();
        let got = read_response(&mut b, 1024).await.unwrap();

        assert_eq!(got, sent);
    }
}
