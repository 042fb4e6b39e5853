// Endpoint configuration shared by the three executables

use crate::error::ParseError;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Well-known requester<->relay port. The server listens one above it.
pub const DEFAULT_PORT: u16 = 8080;

pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Transport binding selected on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    /// Connection-oriented (TCP)
    Tcp,
    /// Connectionless datagrams (UDP)
    Udp,
}

impl FromStr for Protocol {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tcp" => Ok(Protocol::Tcp),
            "udp" => Ok(Protocol::Udp),
            other => Err(ParseError::Protocol(other.to_string())),
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Protocol::Tcp => write!(f, "TCP"),
            Protocol::Udp => write!(f, "UDP"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Host the relay and server are reached at
    pub host: String,

    /// Base port `P`: relay listens on `P`, server on `P + 1`
    pub port: u16,

    /// How long the relay waits for the server's reply. `None` blocks forever.
    pub upstream_timeout: Option<Duration>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            upstream_timeout: None,
        }
    }
}

impl Config {
    /// Read overrides from `ARITH_HOST`, `ARITH_PORT` and
    /// `ARITH_UPSTREAM_TIMEOUT_MS`, falling back to the defaults.
    pub fn from_env() -> Result<Self, ParseError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ParseError> {
        let host = lookup("ARITH_HOST").unwrap_or_else(|| DEFAULT_HOST.to_string());

        let port = match lookup("ARITH_PORT") {
            Some(raw) => match raw.parse::<u16>() {
                // The server needs P + 1 to exist as well
                Ok(port) if port < u16::MAX => port,
                _ => return Err(ParseError::Port(raw)),
            },
            None => DEFAULT_PORT,
        };

        let upstream_timeout = match lookup("ARITH_UPSTREAM_TIMEOUT_MS") {
            Some(raw) => {
                let ms = raw
                    .parse::<u64>()
                    .map_err(|_| ParseError::Timeout(raw.clone()))?;
                Some(Duration::from_millis(ms))
            }
            None => None,
        };

        Ok(Config {
            host,
            port,
            upstream_timeout,
        })
    }

    pub fn relay_port(&self) -> u16 {
        self.port
    }

    /// `P + 1`. Fails when `P` is the last port.
    pub fn server_port(&self) -> Result<u16, ParseError> {
        self.port
            .checked_add(1)
            .ok_or_else(|| ParseError::Port(self.port.to_string()))
    }

    /// Address requesters connect to.
    pub fn relay_addr(&self) -> String {
        format!("{}:{}", self.host, self.relay_port())
    }

    /// Address the relay forwards to.
    pub fn server_addr(&self) -> Result<String, ParseError> {
        Ok(format!("{}:{}", self.host, self.server_port()?))
    }

    /// Wildcard listen address for the relay.
    pub fn relay_bind_addr(&self) -> String {
        format!("0.0.0.0:{}", self.relay_port())
    }

    /// Wildcard listen address for the server.
    pub fn server_bind_addr(&self) -> Result<String, ParseError> {
        Ok(format!("0.0.0.0:{}", self.server_port()?))
    }
}
