// Lossy relay between requesters and the authoritative server
//
// The relay never checks or rewrites the checksum: whatever it corrupts
// reaches the server with the requester's original crc, so the server can
// always tell.

pub mod injector;
pub mod tcp;
pub mod udp;

use injector::ErrorInjector;
use protocol::{Frame, OperationRecord};
use std::net::SocketAddr;
use std::time::Duration;

pub use injector::{Corruption, Probability, ProbabilityError};

/// Counters for what passed through the relay.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelayStats {
    /// Records received from requesters
    pub received: u64,

    /// Records where a corruption attempt fired
    pub corrupted: u64,

    /// Replies delivered back to requesters
    pub relayed: u64,

    /// Exchanges abandoned on a transport fault
    pub failed: u64,
}

/// State shared by both relay loops.
pub struct Relay {
    injector: ErrorInjector,
    upstream: SocketAddr,
    upstream_timeout: Option<Duration>,
    stats: RelayStats,
}

impl Relay {
    pub fn new(injector: ErrorInjector, upstream: SocketAddr) -> Self {
        Relay {
            injector,
            upstream,
            upstream_timeout: None,
            stats: RelayStats::default(),
        }
    }

    /// Give up on the server's reply after `timeout`.
    pub fn with_upstream_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.upstream_timeout = timeout;
        self
    }

    pub fn upstream(&self) -> SocketAddr {
        self.upstream
    }

    pub fn probability(&self) -> Probability {
        self.injector.probability()
    }

    pub fn stats(&self) -> RelayStats {
        self.stats
    }

    /// Log the incoming record and apply channel noise to it.
    fn degrade(&mut self, frame: &mut Frame, client: SocketAddr) {
        self.stats.received += 1;
        tracing::debug!(
            "Received from client {}: {:#}",
            client,
            OperationRecord::from_frame(frame)
        );

        let corruption = self.injector.corrupt(frame);
        if corruption.attempted() {
            self.stats.corrupted += 1;
            tracing::warn!(
                "Corrupted record from {} at payload offsets {:?}",
                client,
                corruption.offsets()
            );
        }
    }
}
