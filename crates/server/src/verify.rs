//! Verification and compute state machine of the authoritative server.
//!
//! Every received frame walks Verify -> Classify -> Reply and ends in one of
//! three terminal states:
//!
//! - `Corrupted`: the payload no longer matches its checksum; no arithmetic
//! - `Invalid`: intact, but the operation cannot be carried out
//! - `Computed`: intact and evaluated
//!
//! Arithmetic is two's-complement wrapping: `i32::MAX + 1 == i32::MIN` and
//! `i32::MIN / -1 == i32::MIN`. Division truncates toward zero.

use protocol::record::{frame_checksum, frame_crc};
use protocol::{Frame, OperationKind, OperationRecord};
use thiserror::Error;

/// Why an intact record could not be computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InvalidReason {
    #[error("division by zero")]
    DivisionByZero,

    #[error("unsupported operation")]
    UnsupportedOperation,
}

/// Terminal state of one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Computed(i32),
    Corrupted { received: u32, computed: u32 },
    Invalid(InvalidReason),
}

impl Outcome {
    /// Whether the reply must carry the error flag.
    pub fn is_error(&self) -> bool {
        !matches!(self, Outcome::Computed(_))
    }
}

/// Verify a frame exactly as received and, if intact, classify it.
///
/// Pure: calling it again on the same frame gives the same outcome.
pub fn verify(frame: &Frame) -> Outcome {
    let received = frame_crc(frame);
    let computed = frame_checksum(frame);
    if received != computed {
        return Outcome::Corrupted { received, computed };
    }

    classify(&OperationRecord::from_frame(frame))
}

/// Classify step for a record whose checksum already matched.
pub fn classify(record: &OperationRecord) -> Outcome {
    let (a, b) = (record.operand1, record.operand2);
    match record.operation {
        OperationKind::Add => Outcome::Computed(a.wrapping_add(b)),
        OperationKind::Sub => Outcome::Computed(a.wrapping_sub(b)),
        OperationKind::Mul => Outcome::Computed(a.wrapping_mul(b)),
        OperationKind::Div if b == 0 => Outcome::Invalid(InvalidReason::DivisionByZero),
        OperationKind::Div => Outcome::Computed(a.wrapping_div(b)),
        OperationKind::Invalid => Outcome::Invalid(InvalidReason::UnsupportedOperation),
    }
}

/// Run the state machine and build the reply record.
///
/// On any error state the result is zeroed. The reply is resealed so its
/// checksum covers the reply's own payload.
pub fn respond(frame: &Frame) -> (Outcome, OperationRecord) {
    let outcome = verify(frame);
    let mut reply = OperationRecord::from_frame(frame);

    match outcome {
        Outcome::Computed(value) => {
            reply.result = value;
            reply.error = false;
        }
        Outcome::Corrupted { .. } | Outcome::Invalid(_) => {
            reply.result = 0;
            reply.error = true;
        }
    }
    reply.seal();

    (outcome, reply)
}
