// Connection-oriented server: one worker task per accepted connection

use anyhow::Result;
use protocol::transport::{read_frame, write_frame};
use std::net::SocketAddr;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpListener;
use tokio::task::JoinSet;

/// Accept connections forever, spawning an isolated worker for each.
///
/// Workers are tracked in a `JoinSet` and reaped as they finish, so a
/// worker that fails or panics never affects the others or the accept loop.
pub async fn serve(listener: TcpListener) -> Result<()> {
    tracing::info!("TCP Server running on {}", listener.local_addr()?);

    let mut workers = JoinSet::new();

    loop {
        tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    tracing::info!("New TCP connection: {}", peer);
                    workers.spawn(async move {
                        let served = handle_connection(stream, peer).await;
                        tracing::info!(
                            "TCP connection closed: {} ({} records served)",
                            peer,
                            served
                        );
                    });
                }
                Err(e) => {
                    tracing::warn!("TCP accept failed: {}", e);
                }
            },

            Some(joined) = workers.join_next(), if !workers.is_empty() => {
                if let Err(e) = joined {
                    tracing::error!("TCP worker terminated abnormally: {}", e);
                }
            }
        }
    }
}

/// Serve records from one connection until the peer disconnects.
///
/// Each record is answered before the next is read, so replies come back
/// in request order. A transport fault ends the connection. Returns the
/// number of records answered.
pub async fn handle_connection<S>(mut stream: S, peer: SocketAddr) -> u64
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut served = 0;

    loop {
        let frame = match read_frame(&mut stream).await {
            Ok(Some(frame)) => frame,
            Ok(None) => break,
            Err(e) => {
                tracing::warn!("Failed to receive operation from {}: {}", peer, e);
                break;
            }
        };

        let reply = crate::answer(&frame, peer);

        if let Err(e) = write_frame(&mut stream, &reply).await {
            tracing::warn!("Failed to send reply to {}: {}", peer, e);
            break;
        }
        served += 1;
    }

    served
}
