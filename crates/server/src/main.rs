// Main entry point for the authoritative server

use anyhow::{Context, Result};
use clap::Parser;
use protocol::{Config, Protocol};
use tokio::net::{TcpListener, UdpSocket};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "server")]
#[command(about = "Authoritative arithmetic server listening on port P + 1")]
struct Cli {
    /// Transport: tcp or udp
    protocol: Protocol,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Usage errors exit with 1, not clap's default of 2
    let Cli { protocol } = Cli::try_parse().unwrap_or_else(|e| {
        let _ = e.print();
        std::process::exit(if e.use_stderr() { 1 } else { 0 });
    });

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,server=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().context("Invalid configuration")?;
    let addr = config.server_bind_addr().context("Invalid configuration")?;

    tracing::info!("Starting {} authoritative server on {}", protocol, addr);

    match protocol {
        Protocol::Tcp => {
            let listener = TcpListener::bind(&addr)
                .await
                .with_context(|| format!("TCP bind failed on {addr}"))?;
            server::tcp::serve(listener).await
        }
        Protocol::Udp => {
            let socket = UdpSocket::bind(&addr)
                .await
                .with_context(|| format!("UDP bind failed on {addr}"))?;
            server::udp::serve(socket).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_either_transport() {
        assert_eq!(Cli::try_parse_from(["server", "tcp"]).unwrap().protocol, Protocol::Tcp);
        assert_eq!(Cli::try_parse_from(["server", "udp"]).unwrap().protocol, Protocol::Udp);
    }

    #[test]
    fn test_rejects_bad_arguments() {
        assert!(Cli::try_parse_from(["server"]).is_err());
        assert!(Cli::try_parse_from(["server", "sctp"]).is_err());
        assert!(Cli::try_parse_from(["server", "tcp", "extra"]).is_err());
    }
}
