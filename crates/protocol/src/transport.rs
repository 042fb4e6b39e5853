//! Moving whole records over streams and datagram sockets.
//!
//! A record is always transferred whole. On a stream, a clean end of stream
//! between records is a normal disconnect; anything that ends mid-record is
//! a transport fault. On a datagram socket, a datagram of any size other
//! than `RECORD_SIZE` is a transport fault.

use crate::error::{DecodeError, ExchangeError, Result};
use crate::record::{Frame, RECORD_SIZE};
use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::{ToSocketAddrs, UdpSocket};

/// Read the next record from a stream.
///
/// Returns `Ok(None)` when the peer closed the stream before sending any
/// byte of a new record.
pub async fn read_frame<R>(reader: &mut R) -> Result<Option<Frame>>
where
    R: AsyncRead + Unpin,
{
    let mut frame = [0u8; RECORD_SIZE];
    let mut filled = 0;

    while filled < RECORD_SIZE {
        let n = reader.read(&mut frame[filled..]).await?;
        if n == 0 {
            if filled == 0 {
                return Ok(None);
            }
            return Err(DecodeError::LengthMismatch {
                expected: RECORD_SIZE,
                actual: filled,
            }
            .into());
        }
        filled += n;
    }

    Ok(Some(frame))
}

/// Write one record to a stream and flush it.
pub async fn write_frame<W>(writer: &mut W, frame: &Frame) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(frame).await?;
    writer.flush().await?;
    Ok(())
}

/// Receive one datagram and check it carries exactly one record.
pub async fn recv_frame(socket: &UdpSocket) -> Result<(Frame, SocketAddr)> {
    // One spare byte so oversized datagrams are noticed instead of truncated silently
    let mut buf = [0u8; RECORD_SIZE + 1];
    let (len, from) = socket.recv_from(&mut buf).await?;

    if len != RECORD_SIZE {
        return Err(DecodeError::LengthMismatch {
            expected: RECORD_SIZE,
            actual: len,
        }
        .into());
    }

    let mut frame = [0u8; RECORD_SIZE];
    frame.copy_from_slice(&buf[..RECORD_SIZE]);
    Ok((frame, from))
}

/// Send one record as a single datagram.
pub async fn send_frame<A>(socket: &UdpSocket, frame: &Frame, to: A) -> Result<()>
where
    A: ToSocketAddrs,
{
    let sent = socket.send_to(frame, to).await?;
    if sent != RECORD_SIZE {
        return Err(DecodeError::LengthMismatch {
            expected: RECORD_SIZE,
            actual: sent,
        }
        .into());
    }
    Ok(())
}

/// Await `fut`, giving up after `limit` when one is set.
pub async fn within<F, T>(limit: Option<Duration>, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match limit {
        Some(limit) => tokio::time::timeout(limit, fut)
            .await
            .map_err(|_| ExchangeError::Timeout)?,
        None => fut.await,
    }
}
