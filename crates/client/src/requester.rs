// One handle per session with the relay, for either transport

use protocol::error::{ExchangeError, Result};
use protocol::transport::{read_frame, recv_frame, send_frame, write_frame};
use protocol::{OperationRecord, Protocol};
use std::fmt;
use std::net::SocketAddr;
use tokio::net::{TcpStream, UdpSocket};

/// A reply as received, plus whether its own checksum held.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reply {
    pub record: OperationRecord,
    pub intact: bool,
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.record)?;
        if !self.intact {
            write!(f, " (reply checksum mismatch)")?;
        }
        Ok(())
    }
}

pub enum Requester {
    /// Long-lived connection to the relay
    Tcp(TcpStream),
    /// Unconnected socket plus the relay's address
    Udp { socket: UdpSocket, relay: SocketAddr },
}

impl Requester {
    pub async fn connect(protocol: Protocol, relay: &str) -> Result<Self> {
        match protocol {
            Protocol::Tcp => {
                let stream = TcpStream::connect(relay).await?;
                tracing::debug!("TCP connected to relay {}", stream.peer_addr()?);
                Ok(Requester::Tcp(stream))
            }
            Protocol::Udp => {
                let relay = tokio::net::lookup_host(relay).await?.next().ok_or_else(|| {
                    std::io::Error::new(
                        std::io::ErrorKind::NotFound,
                        format!("no address for {relay}"),
                    )
                })?;
                let local = if relay.is_ipv4() { "0.0.0.0:0" } else { "[::]:0" };
                let socket = UdpSocket::bind(local).await?;
                Ok(Requester::Udp { socket, relay })
            }
        }
    }

    /// Seal `request`, send it and wait for the single matching reply.
    pub async fn exchange(&mut self, request: &OperationRecord) -> Result<Reply> {
        let mut request = *request;
        request.seal();
        let frame = request.encode();

        let reply = match self {
            Requester::Tcp(stream) => {
                write_frame(stream, &frame).await?;
                read_frame(stream).await?.ok_or(ExchangeError::Closed)?
            }
            Requester::Udp { socket, relay } => {
                send_frame(socket, &frame, *relay).await?;
                loop {
                    match recv_frame(socket).await {
                        Ok((reply, from)) if from == *relay => break reply,
                        Ok((_, from)) => tracing::warn!("Ignoring datagram from {}", from),
                        Err(ExchangeError::Decode(e)) => {
                            tracing::warn!("Ignoring malformed datagram: {}", e);
                        }
                        Err(e) => return Err(e),
                    }
                }
            }
        };

        let record = OperationRecord::from_frame(&reply);
        Ok(Reply {
            record,
            intact: record.is_intact(),
        })
    }
}
