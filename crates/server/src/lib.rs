// Authoritative server: verifies every record and computes the result

pub mod tcp;
pub mod udp;
pub mod verify;

use protocol::{Frame, OperationRecord};
use std::net::SocketAddr;

pub use verify::{respond, verify, InvalidReason, Outcome};

/// Answer one received frame, logging the terminal state it reached.
pub fn answer(frame: &Frame, peer: SocketAddr) -> Frame {
    tracing::debug!(
        "Received operation from {}: {:#}",
        peer,
        OperationRecord::from_frame(frame)
    );

    let (outcome, reply) = respond(frame);
    match outcome {
        Outcome::Computed(_) => {
            tracing::info!("Operation computed for {}: {}", peer, reply);
        }
        Outcome::Corrupted { received, computed } => {
            tracing::warn!(
                "Error detected from {}: crc 0x{:08X} != computed 0x{:08X}",
                peer,
                received,
                computed
            );
        }
        Outcome::Invalid(reason) => {
            tracing::warn!("Invalid operation from {}: {}", peer, reason);
        }
    }

    reply.encode()
}
