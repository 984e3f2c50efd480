//! Reading and writing framed SMB2 messages on a byte stream

use crate::error::{Error, Result};
use crate::netbios::{NetBiosHeader, NetBiosMessageType};
use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::trace;

/// Frames larger than this are treated as a protocol violation
pub const MAX_FRAME_SIZE: usize = 8 * 1024 * 1024;

/// Prefix `payload` with a session message header
pub fn encode_frame(payload: &[u8]) -> Result<Bytes> {
    let header = NetBiosHeader::session_message(payload.len() as u32)?;
    let mut buf = BytesMut::with_capacity(NetBiosHeader::SIZE + payload.len());
    header.write_to(&mut buf);
    buf.extend_from_slice(payload);
    Ok(buf.freeze())
}

/// Write one already-framed buffer and flush
pub async fn write_frame<W: AsyncWrite + Unpin>(writer: &mut W, frame: &[u8]) -> Result<()> {
    writer.write_all(frame).await?;
    writer.flush().await?;
    Ok(())
}

/// Read the next session message payload.
///
/// Keepalives are skipped. Returns `Ok(None)` when the peer closes the
/// stream cleanly between frames.
pub async fn read_frame<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Option<Bytes>> {
    loop {
        let mut header_bytes = [0u8; NetBiosHeader::SIZE];
        match reader.read_exact(&mut header_bytes).await {
            Ok(_) => {}
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
            Err(e) => return Err(e.into()),
        }

        let header = NetBiosHeader::parse(&header_bytes)?;
        let length = header.length as usize;
        if length > MAX_FRAME_SIZE {
            return Err(Error::Protocol(format!(
                "Frame of {} bytes exceeds limit of {}",
                length, MAX_FRAME_SIZE
            )));
        }

        let mut payload = BytesMut::zeroed(length);
        reader.read_exact(&mut payload).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::UnexpectedEof {
                Error::ConnectionClosed
            } else {
                Error::Io(e)
            }
        })?;

        match header.message_type {
            NetBiosMessageType::Keepalive => trace!("Skipping keepalive"),
            NetBiosMessageType::SessionMessage => return Ok(Some(payload.freeze())),
        }
    }
}
