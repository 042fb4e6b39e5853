// Error types shared by every role

use thiserror::Error;

/// A received byte sequence could not be turned into a record.
///
/// Any size other than the fixed record size is a transport fault, not a
/// protocol outcome: the exchange is abandoned instead of answered.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("record length mismatch: expected {expected} bytes, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },
}

/// Command-line and configuration values that failed to parse.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("invalid protocol '{0}', use 'tcp' or 'udp'")]
    Protocol(String),

    #[error("invalid port '{0}'")]
    Port(String),

    #[error("invalid timeout '{0}'")]
    Timeout(String),
}

/// Failure of one request/reply round trip over a transport.
#[derive(Debug, Error)]
pub enum ExchangeError {
    #[error("peer closed the connection")]
    Closed,

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("timed out waiting for reply")]
    Timeout,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ExchangeError>;
