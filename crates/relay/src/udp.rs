// Connectionless relay: one socket for both sides, one request in flight

use crate::Relay;
use anyhow::Result;
use protocol::error::ExchangeError;
use protocol::transport::{recv_frame, send_frame, within};
use protocol::Frame;
use std::collections::VecDeque;
use std::net::SocketAddr;
use tokio::net::UdpSocket;

/// Client requests that arrived while a round trip was in flight.
type Backlog = VecDeque<(Frame, SocketAddr)>;

/// Relay datagrams forever, each round trip finished before the next read.
///
/// Requests that reach the socket while the relay waits for the server are
/// held back and served next, in arrival order.
pub async fn serve(socket: UdpSocket, relay: &mut Relay) -> Result<()> {
    tracing::info!(
        "UDP Middle Man running on {} (error probability: {}, server: {})",
        socket.local_addr()?,
        relay.probability(),
        relay.upstream()
    );

    let mut backlog = Backlog::new();

    loop {
        let (mut frame, client) = match backlog.pop_front() {
            Some(queued) => queued,
            None => match recv_frame(&socket).await {
                Ok(received) => received,
                Err(e) => {
                    tracing::warn!("Failed to receive from client: {}", e);
                    continue;
                }
            },
        };

        if client == relay.upstream {
            tracing::warn!("Dropping late reply from server {}", client);
            continue;
        }

        relay.degrade(&mut frame, client);

        let exchange = forward(&socket, relay.upstream, &frame, &mut backlog);
        let reply = match within(relay.upstream_timeout, exchange).await {
            Ok(reply) => reply,
            Err(e) => {
                relay.stats.failed += 1;
                tracing::warn!("Exchange with server {} failed: {}", relay.upstream, e);
                continue;
            }
        };

        if let Err(e) = send_frame(&socket, &reply, client).await {
            relay.stats.failed += 1;
            tracing::warn!("Failed to send reply to client {}: {}", client, e);
            continue;
        }
        relay.stats.relayed += 1;
    }
}

/// Send to the server and wait for its answer.
///
/// Client datagrams received meanwhile go to `backlog` untouched.
async fn forward(
    socket: &UdpSocket,
    upstream: SocketAddr,
    frame: &Frame,
    backlog: &mut Backlog,
) -> protocol::error::Result<Frame> {
    send_frame(socket, frame, upstream).await?;

    loop {
        match recv_frame(socket).await {
            Ok((reply, from)) if from == upstream => return Ok(reply),
            Ok((request, from)) => {
                tracing::debug!("Holding request from {} until the server replies", from);
                backlog.push_back((request, from));
            }
            Err(ExchangeError::Decode(e)) => {
                tracing::warn!("Dropping malformed datagram while waiting for server: {}", e);
            }
            Err(e) => return Err(e),
        }
    }
}
