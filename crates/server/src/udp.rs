// Connectionless server: one shared socket, one request at a time

use anyhow::Result;
use protocol::transport::{recv_frame, send_frame};
use tokio::net::UdpSocket;

/// Answer datagrams forever, strictly in arrival order.
///
/// Malformed datagrams are logged and dropped; the loop keeps waiting.
pub async fn serve(socket: UdpSocket) -> Result<()> {
    tracing::info!("UDP Server running on {}", socket.local_addr()?);

    loop {
        let (frame, peer) = match recv_frame(&socket).await {
            Ok(received) => received,
            Err(e) => {
                tracing::warn!("Failed to receive operation: {}", e);
                continue;
            }
        };

        let reply = crate::answer(&frame, peer);

        if let Err(e) = send_frame(&socket, &reply, peer).await {
            tracing::warn!("Failed to send reply to {}: {}", peer, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use protocol::{OperationKind, OperationRecord, RECORD_SIZE};
    use std::time::Duration;

    async fn spawn_server() -> std::net::SocketAddr {
        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let addr = socket.local_addr().unwrap();
        tokio::spawn(serve(socket));
        addr
    }

    async fn exchange(client: &UdpSocket, server: std::net::SocketAddr, bytes: &[u8]) -> OperationRecord {
        client.send_to(bytes, server).await.unwrap();
        let mut buf = [0u8; RECORD_SIZE];
        let (len, _) = tokio::time::timeout(Duration::from_secs(5), client.recv_from(&mut buf))
            .await
            .unwrap()
            .unwrap();
        OperationRecord::decode(&buf[..len]).unwrap()
    }

    #[tokio::test]
    async fn test_answers_datagrams() {
        let server = spawn_server().await;
        let client = UdpSocket::bind("127.0.0.1:0").await.unwrap();

        let request = OperationRecord::request(OperationKind::Sub, 10, 4);
        let reply = exchange(&client, server, &request.encode()).await;
        assert_eq!(reply.result, 6);
        assert!(!reply.error);

        let mut corrupted = OperationRecord::request(OperationKind::Add, 1, 1).encode();
        corrupted[8] ^= 0xFF;
        let reply = exchange(&client, server, &corrupted).await;
        assert!(reply.error);
    }

    #[tokio::test]
    async fn test_short_datagram_is_dropped() {
        let server = spawn_server().await;
        let client = UdpSocket::bind("127.0.0.1:0").await.unwrap();

        client.send_to(&[0u8; 5], server).await.unwrap();

        // The garbage gets no reply; the next valid request is still served
        let request = OperationRecord::request(OperationKind::Mul, 3, 3);
        let reply = exchange(&client, server, &request.encode()).await;
        assert_eq!(reply.result, 9);
    }
}
