//! Reading and writing framed messages over a byte stream.
//!
//! Every message on the wire is `header || body`: exactly
//! [`HEADER_LEN`](crate::protocol::HEADER_LEN) header bytes followed by
//! exactly `body_len` body bytes, back-to-back with no other delimiter.

use crate::protocol::{Header, Message, HEADER_LEN, MAX_BODY_LEN};
use std::io;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Reads one complete framed message. A short read at either boundary
/// (socket closed mid-header or mid-body) surfaces as an error and is fatal
/// to the connection.
pub async fn read_message<R>(reader: &mut R) -> io::Result<Message>
where
    R: AsyncRead + Unpin,
{
    let mut header_buf = [0u8; HEADER_LEN];
    reader.read_exact(&mut header_buf).await?;
    let header = Header::decode(&header_buf)?;

    if header.body_len > MAX_BODY_LEN {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("declared body length {} exceeds limit", header.body_len),
        ));
    }

    let mut body = vec![0u8; header.body_len as usize];
    reader.read_exact(&mut body).await?;

    Ok(Message { header, body })
}

/// Writes one complete framed message. The header is fully written before
/// any body byte; callers must not interleave writes for the same stream.
pub async fn write_message<W>(writer: &mut W, msg: &Message) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(&msg.header.encode()).await?;
    writer.write_all(&msg.body).await?;
    Ok(())
}
