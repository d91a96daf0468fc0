//! Length-prefixed message links over turmoil TCP.
//!
//! The connecting side writes its [`Party`] tag as the first byte so the
//! accepting side knows which link a stream is. Each message travels in one
//! frame from `hopseal_proto::stream`.

use std::{
    io::{self, ErrorKind},
    time::Duration,
};

use bytes::{Bytes, BytesMut};
use hopseal_proto::{
    Party,
    stream::{LENGTH_PREFIX_SIZE, encode_frame, parse_length},
};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use turmoil::net::{TcpListener, TcpStream};

/// Pause between attempts while the peer has not bound its listener yet
pub const CONNECT_RETRY: Duration = Duration::from_millis(10);

/// Connect `me` to the host named after `peer`, retrying until it listens.
///
/// # Errors
///
/// Any I/O error other than a refused connection.
pub async fn connect(me: Party, peer: Party, port: u16) -> io::Result<TcpStream> {
    let addr = format!("{}:{port}", peer.name());
    loop {
        match TcpStream::connect(addr.as_str()).await {
            Ok(mut stream) => {
                stream.write_u8(me.to_u8()).await?;
                tracing::debug!(%me, %peer, "link connected");
                return Ok(stream);
            },
            Err(e) if e.kind() == ErrorKind::ConnectionRefused => {
                tokio::time::sleep(CONNECT_RETRY).await;
            },
            Err(e) => return Err(e),
        }
    }
}

/// Accept the next link and read the peer's tag.
///
/// # Errors
///
/// I/O failures, or `InvalidData` if the tag names no party.
pub async fn accept(listener: &TcpListener) -> io::Result<(Party, TcpStream)> {
    let (mut stream, _addr) = listener.accept().await?;
    let tag = stream.read_u8().await?;
    let peer = Party::from_u8(tag).map_err(|e| io::Error::new(ErrorKind::InvalidData, e))?;
    Ok((peer, stream))
}

/// Write one framed message.
///
/// # Errors
///
/// `InvalidData` if the message exceeds the frame limit, or I/O failures.
pub async fn write_message<W>(writer: &mut W, message: &[u8]) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let mut frame = BytesMut::with_capacity(LENGTH_PREFIX_SIZE + message.len());
    encode_frame(message, &mut frame).map_err(|e| io::Error::new(ErrorKind::InvalidData, e))?;
    writer.write_all(&frame).await?;
    writer.flush().await
}

/// Read one framed message.
///
/// # Errors
///
/// `InvalidData` if the announced length exceeds the frame limit,
/// `UnexpectedEof` if the stream ends mid-frame.
pub async fn read_message<R>(reader: &mut R) -> io::Result<Bytes>
where
    R: AsyncRead + Unpin,
{
    let mut prefix = [0u8; LENGTH_PREFIX_SIZE];
    reader.read_exact(&mut prefix).await?;
    let len = parse_length(prefix).map_err(|e| io::Error::new(ErrorKind::InvalidData, e))?;

    let mut message = vec![0u8; len];
    reader.read_exact(&mut message).await?;
    Ok(Bytes::from(message))
}

#[cfg(test)]
mod tests {
    use hopseal_proto::MAX_MESSAGE_SIZE;

    use super::*;

    #[tokio::test]
    async fn message_crosses_a_duplex_pipe() {
        let (mut a, mut b) = tokio::io::duplex(1024);

        write_message(&mut a, b"sealed").await.unwrap();
        write_message(&mut a, b"").await.unwrap();

        assert_eq!(read_message(&mut b).await.unwrap().as_ref(), b"sealed");
        assert!(read_message(&mut b).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn oversized_length_is_invalid_data() {
        let (mut a, mut b) = tokio::io::duplex(64);
        let prefix = u32::try_from(MAX_MESSAGE_SIZE + 1).unwrap().to_be_bytes();
        a.write_all(&prefix).await.unwrap();

        let err = read_message(&mut b).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidData);
    }

    #[tokio::test]
    async fn truncated_frame_is_eof() {
        let (mut a, mut b) = tokio::io::duplex(64);
        a.write_all(&[0, 0, 0, 9, 1, 2]).await.unwrap();
        drop(a);

        let err = read_message(&mut b).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnexpectedEof);
    }
}
