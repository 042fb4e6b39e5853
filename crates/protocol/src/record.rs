//! Fixed-layout operation record exchanged by requester, relay and server.
//!
//! # Wire Format
//!
//! ```text
//! +--------------------+
//! | operation (4)      |  u32 ordinal of OperationKind
//! +--------------------+
//! | operand1 (4)       |  i32
//! +--------------------+
//! | operand2 (4)       |  i32
//! +--------------------+
//! | result (4)         |  i32
//! +--------------------+
//! | error (1) + pad(3) |  0 or 1, padding always zero when sent
//! +--------------------+
//! | crc (4)            |  u32 CRC-32 over the 20 bytes above
//! +--------------------+
//! ```
//!
//! All integers are little-endian. The checksum is always computed with the
//! error byte cleared, so it guards {operation, operand1, operand2, result}
//! and the padding, never the error flag itself.

use crate::crc;
use crate::error::DecodeError;
use std::fmt;

/// Size of an encoded record in bytes.
pub const RECORD_SIZE: usize = 24;

/// Bytes covered by the checksum (everything before `crc`).
pub const PAYLOAD_SIZE: usize = 20;

/// Offset of the error flag within the payload.
pub const ERROR_OFFSET: usize = 16;

/// Offset of the checksum field.
pub const CRC_OFFSET: usize = PAYLOAD_SIZE;

/// A raw record as it travels on the wire.
pub type Frame = [u8; RECORD_SIZE];

/// Arithmetic operator requested by the client.
///
/// The ordinal is the wire encoding: Add=0, Sub=1, Mul=2, Div=3, Invalid=4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum OperationKind {
    Add = 0,
    Sub = 1,
    Mul = 2,
    Div = 3,
    Invalid = 4,
}

impl OperationKind {
    /// Map a wire code to an operation. Unknown codes become `Invalid`.
    pub fn from_wire(code: u32) -> Self {
        match code {
            0 => OperationKind::Add,
            1 => OperationKind::Sub,
            2 => OperationKind::Mul,
            3 => OperationKind::Div,
            _ => OperationKind::Invalid,
        }
    }

    pub fn to_wire(self) -> u32 {
        self as u32
    }

    /// Parse a console operator (`+`, `-`, `*`, `/`).
    pub fn from_symbol(symbol: &str) -> Self {
        match symbol {
            "+" => OperationKind::Add,
            "-" => OperationKind::Sub,
            "*" => OperationKind::Mul,
            "/" => OperationKind::Div,
            _ => OperationKind::Invalid,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            OperationKind::Add => "+",
            OperationKind::Sub => "-",
            OperationKind::Mul => "*",
            OperationKind::Div => "/",
            OperationKind::Invalid => "?",
        }
    }
}

/// The unit of exchange: one arithmetic request or its reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperationRecord {
    pub operation: OperationKind,
    pub operand1: i32,
    pub operand2: i32,
    pub result: i32,
    pub error: bool,
    pub crc: u32,
}

impl OperationRecord {
    /// Build a request ready for transmission (result 0, error clear, sealed).
    pub fn request(operation: OperationKind, operand1: i32, operand2: i32) -> Self {
        let mut record = OperationRecord {
            operation,
            operand1,
            operand2,
            result: 0,
            error: false,
            crc: 0,
        };
        record.seal();
        record
    }

    /// Checksum of this record's payload as it would be transmitted.
    pub fn payload_checksum(&self) -> u32 {
        frame_checksum(&self.encode())
    }

    /// Recompute `crc` from the current payload. Call right before sending.
    pub fn seal(&mut self) {
        self.crc = self.payload_checksum();
    }

    /// Whether `crc` matches the payload.
    pub fn is_intact(&self) -> bool {
        self.crc == self.payload_checksum()
    }

    pub fn encode(&self) -> Frame {
        let mut frame = [0u8; RECORD_SIZE];
        frame[0..4].copy_from_slice(&self.operation.to_wire().to_le_bytes());
        frame[4..8].copy_from_slice(&self.operand1.to_le_bytes());
        frame[8..12].copy_from_slice(&self.operand2.to_le_bytes());
        frame[12..16].copy_from_slice(&self.result.to_le_bytes());
        frame[ERROR_OFFSET] = u8::from(self.error);
        frame[CRC_OFFSET..].copy_from_slice(&self.crc.to_le_bytes());
        frame
    }

    /// Decode a received byte sequence.
    ///
    /// # Errors
    /// `DecodeError::LengthMismatch` if `bytes` is not exactly `RECORD_SIZE` long.
    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        let frame = as_frame(bytes)?;
        Ok(Self::from_frame(frame))
    }

    /// Decode a frame. Padding bytes are ignored and any non-zero error
    /// byte reads as `true`.
    pub fn from_frame(frame: &Frame) -> Self {
        let word = |at: usize| [frame[at], frame[at + 1], frame[at + 2], frame[at + 3]];

        OperationRecord {
            operation: OperationKind::from_wire(u32::from_le_bytes(word(0))),
            operand1: i32::from_le_bytes(word(4)),
            operand2: i32::from_le_bytes(word(8)),
            result: i32::from_le_bytes(word(12)),
            error: frame[ERROR_OFFSET] != 0,
            crc: u32::from_le_bytes(word(CRC_OFFSET)),
        }
    }
}

/// Borrow `bytes` as a frame, checking the fixed size.
pub fn as_frame(bytes: &[u8]) -> Result<&Frame, DecodeError> {
    bytes.try_into().map_err(|_| DecodeError::LengthMismatch {
        expected: RECORD_SIZE,
        actual: bytes.len(),
    })
}

/// Checksum over the payload bytes of a raw frame, error byte cleared.
///
/// Works on the bytes exactly as received, so corrupted padding or an
/// out-of-range operation code is still covered.
pub fn frame_checksum(frame: &Frame) -> u32 {
    let mut payload = [0u8; PAYLOAD_SIZE];
    payload.copy_from_slice(&frame[..PAYLOAD_SIZE]);
    payload[ERROR_OFFSET] = 0;
    crc::checksum(&payload)
}

/// The `crc` field carried by a raw frame.
pub fn frame_crc(frame: &Frame) -> u32 {
    let mut word = [0u8; 4];
    word.copy_from_slice(&frame[CRC_OFFSET..]);
    u32::from_le_bytes(word)
}

impl fmt::Display for OperationRecord {
    /// `[+, 1, 2, 3]`, or `[/, 5, 0, Error]` when the error flag is set.
    /// The alternate form appends the checksum.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = self.operation.symbol();
        if self.error {
            write!(f, "[{}, {}, {}, Error]", symbol, self.operand1, self.operand2)?;
        } else {
            write!(
                f,
                "[{}, {}, {}, {}]",
                symbol, self.operand1, self.operand2, self.result
            )?;
        }
        if f.alternate() {
            write!(f, " (CRC: 0x{:08X})", self.crc)?;
        }
        Ok(())
    }
}
