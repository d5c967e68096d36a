//! Chunked file transfer over the two channels.
//!
//! For each file the server writes the name and a NUL on the secure
//! channel, then one round per chunk:
//!
//! ```text
//! server                               client
//!   |--- u32 length (secure) ------------>|
//!   |<-- token (secure) ------------------|
//!   |--- payload (raw) ------------------>|
//!   |<-- token (secure) ------------------|
//! ```
//!
//! A length of `0` ends the file. After the last file the server writes
//! [`STOP_SENTINEL`] and a NUL in place of a name, then the final
//! response as an ordinary frame.

use std::path::Path;

use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use filesync_core::{limits, validate_file_name, FileRecord, STOP_SENTINEL};

use crate::error::{ProtocolError, Result};
use crate::transport::Transport;

/// Byte the client writes to acknowledge each half of a chunk round.
pub const HANDSHAKE_TOKEN: u8 = 1;

/// Longest file name accepted while reading the transfer stream.
pub const MAX_NAME_LEN: usize = 4096;

/// Totals for one transfer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransferSummary {
    /// File names in the order they were transferred.
    pub files: Vec<String>,
    /// Payload bytes transferred.
    pub bytes: u64,
}

/// Stream `records` to the client, then the stop marker.
///
/// `chunk_size` is clamped to [`limits::MAX_CHUNK_LEN`], the largest
/// chunk a client accepts.
pub async fn send_files<T>(
    transport: &mut T,
    records: &[&FileRecord],
    chunk_size: usize,
) -> Result<TransferSummary>
where
    T: Transport + ?Sized,
{
    let chunk_size = chunk_size.clamp(1, limits::MAX_CHUNK_LEN);
    let mut buf = vec![0u8; chunk_size];
    let mut summary = TransferSummary::default();

    for record in records {
        let bytes = send_file(transport, record, &mut buf).await?;
        tracing::debug!("sent {} ({} bytes)", record.name, bytes);
        summary.files.push(record.name.clone());
        summary.bytes += bytes;
    }

    send_stop(transport).await?;
    Ok(summary)
}

/// Write the stop marker that ends the file list.
pub async fn send_stop<T>(transport: &mut T) -> Result<()>
where
    T: Transport + ?Sized,
{
    write_name(transport.secure(), STOP_SENTINEL).await
}

async fn send_file<T>(transport: &mut T, record: &FileRecord, buf: &mut [u8]) -> Result<u64>
where
    T: Transport + ?Sized,
{
    // Open before announcing the name so a missing file never leaves the
    // client with a half-created entry.
    let mut file = File::open(&record.path).await?;
    let size = file.metadata().await?.len();

    write_name(transport.secure(), &record.name).await?;

    let mut remaining = size;
    while remaining > 0 {
        let n = remaining.min(buf.len() as u64) as usize;
        let chunk = &mut buf[..n];
        file.read_exact(chunk).await?;

        let secure = transport.secure();
        secure.write_u32_le(n as u32).await?;
        secure.flush().await?;
        secure.read_u8().await?;

        let raw = transport.raw();
        raw.write_all(chunk).await?;
        raw.flush().await?;

        transport.secure().read_u8().await?;
        remaining -= n as u64;
    }

    let secure = transport.secure();
    secure.write_u32_le(0).await?;
    secure.flush().await?;
    Ok(size)
}

async fn write_name<W>(writer: &mut W, name: &str) -> Result<()>
where
    W: AsyncWrite + Unpin + ?Sized,
{
    writer.write_all(name.as_bytes()).await?;
    writer.write_u8(0).await?;
    writer.flush().await?;
    Ok(())
}

/// Read a NUL-terminated name one byte at a time.
///
/// Byte-wise reads keep the secure channel from buffering past the
/// delimiter.
pub async fn read_name<R>(reader: &mut R) -> Result<String>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let mut bytes = Vec::new();
    loop {
        let byte = reader.read_u8().await?;
        if byte == 0 {
            break;
        }
        if bytes.len() == MAX_NAME_LEN {
            return Err(ProtocolError::InvalidFileName(format!(
                "name exceeds {} bytes",
                MAX_NAME_LEN
            )));
        }
        bytes.push(byte);
    }

    String::from_utf8(bytes)
        .map_err(|_| ProtocolError::InvalidFileName("name is not valid UTF-8".into()))
}

/// Receive files into `dir` until the stop marker.
///
/// Every name is checked before anything is created; a name that could
/// escape `dir` ends the transfer with an error.
pub async fn receive_files<T>(transport: &mut T, dir: &Path) -> Result<TransferSummary>
where
    T: Transport + ?Sized,
{
    let mut buf = vec![0u8; limits::MAX_CHUNK_LEN];
    let mut summary = TransferSummary::default();

    loop {
        let name = read_name(transport.secure()).await?;
        if name == STOP_SENTINEL {
            break;
        }
        validate_file_name(&name).map_err(|e| ProtocolError::InvalidFileName(e.to_string()))?;

        let mut file = File::create(dir.join(&name)).await?;
        let mut bytes = 0u64;

        loop {
            let len = transport.secure().read_u32_le().await? as usize;
            if len == 0 {
                break;
            }
            if len > buf.len() {
                return Err(ProtocolError::ChunkTooLarge {
                    len,
                    max: buf.len(),
                });
            }

            let secure = transport.secure();
            secure.write_u8(HANDSHAKE_TOKEN).await?;
            secure.flush().await?;

            let chunk = &mut buf[..len];
            transport.raw().read_exact(chunk).await?;

            let secure = transport.secure();
            secure.write_u8(HANDSHAKE_TOKEN).await?;
            secure.flush().await?;

            file.write_all(chunk).await?;
            bytes += len as u64;
        }

        file.flush().await?;
        tracing::debug!("received {} ({} bytes)", name, bytes);
        summary.files.push(name);
        summary.bytes += bytes;
    }

    Ok(summary)
}
