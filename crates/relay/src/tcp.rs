// Connection-oriented relay
//
// Serves one requester connection at a time; the next client is accepted
// only after the current one disconnects. Every record gets its own fresh
// connection to the server (connect, send, receive, close).

use crate::Relay;
use anyhow::Result;
use protocol::error::ExchangeError;
use protocol::transport::{read_frame, within, write_frame};
use protocol::Frame;
use std::net::SocketAddr;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::{TcpListener, TcpStream};

pub async fn serve(listener: TcpListener, relay: &mut Relay) -> Result<()> {
    tracing::info!(
        "TCP Middle Man running on {} (error probability: {}, server: {})",
        listener.local_addr()?,
        relay.probability(),
        relay.upstream()
    );

    loop {
        let (stream, client) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                tracing::warn!("TCP accept failed: {}", e);
                continue;
            }
        };

        tracing::info!("TCP Client connected: {}", client);
        handle_client(stream, client, relay).await;
        tracing::info!("TCP Client disconnected: {} ({:?})", client, relay.stats());
    }
}

/// Relay every record of one client connection until it disconnects.
///
/// A failed upstream exchange closes the client connection: no reply is
/// invented on the server's behalf.
pub async fn handle_client<S>(mut stream: S, client: SocketAddr, relay: &mut Relay)
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    loop {
        let mut frame = match read_frame(&mut stream).await {
            Ok(Some(frame)) => frame,
            Ok(None) => break,
            Err(e) => {
                tracing::warn!("Failed to receive from client {}: {}", client, e);
                break;
            }
        };

        relay.degrade(&mut frame, client);

        let reply = match within(relay.upstream_timeout, forward(relay.upstream, &frame)).await {
            Ok(reply) => reply,
            Err(e) => {
                relay.stats.failed += 1;
                tracing::warn!("Exchange with server {} failed: {}", relay.upstream, e);
                break;
            }
        };

        if let Err(e) = write_frame(&mut stream, &reply).await {
            relay.stats.failed += 1;
            tracing::warn!("Failed to send reply to client {}: {}", client, e);
            break;
        }
        relay.stats.relayed += 1;
    }
}

/// One full round trip on a dedicated server connection.
async fn forward(upstream: SocketAddr, frame: &Frame) -> protocol::error::Result<Frame> {
    let mut server = TcpStream::connect(upstream).await?;
    write_frame(&mut server, frame).await?;
    read_frame(&mut server).await?.ok_or(ExchangeError::Closed)
}
