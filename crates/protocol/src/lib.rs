// Wire protocol for the corrupted-channel arithmetic service
//
// Shared by the requester, the relay and the authoritative server:
// - `record`: fixed-layout operation record and its codec
// - `crc`: bitwise CRC-32 guarding the record payload
// - `transport`: whole-record reads/writes over TCP streams and UDP sockets
// - `config`: endpoints and protocol selection

pub mod config;
pub mod crc;
pub mod error;
pub mod record;
pub mod transport;

pub use config::{Config, Protocol};
pub use error::{DecodeError, ExchangeError, ParseError};
pub use record::{Frame, OperationKind, OperationRecord, PAYLOAD_SIZE, RECORD_SIZE};
