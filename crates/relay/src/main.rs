// Main entry point for the lossy relay

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use protocol::{Config, Protocol};
use relay::injector::ErrorInjector;
use relay::{Probability, Relay};
use tokio::net::{TcpListener, UdpSocket};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "relay")]
#[command(about = "Lossy relay between requesters on port P and the server on P + 1")]
struct Cli {
    /// Transport: tcp or udp
    protocol: Protocol,

    /// Chance of corrupting each record, in percent (0-100)
    error_probability: Probability,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Usage errors exit with 1, not clap's default of 2
    let Cli {
        protocol,
        error_probability: probability,
    } = Cli::try_parse().unwrap_or_else(|e| {
        let _ = e.print();
        std::process::exit(if e.use_stderr() { 1 } else { 0 });
    });

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,relay=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().context("Invalid configuration")?;

    let server_addr = config.server_addr().context("Invalid configuration")?;
    let upstream = tokio::net::lookup_host(&server_addr)
        .await
        .with_context(|| format!("Failed to resolve server address {server_addr}"))?
        .next()
        .ok_or_else(|| anyhow!("No address found for {server_addr}"))?;

    let mut relay = Relay::new(ErrorInjector::from_entropy(probability), upstream)
        .with_upstream_timeout(config.upstream_timeout);

    let addr = config.relay_bind_addr();
    tracing::info!("Starting {} relay on {}", protocol, addr);

    match protocol {
        Protocol::Tcp => {
            let listener = TcpListener::bind(&addr)
                .await
                .with_context(|| format!("TCP bind failed on {addr}"))?;
            relay::tcp::serve(listener, &mut relay).await
        }
        Protocol::Udp => {
            let socket = UdpSocket::bind(&addr)
                .await
                .with_context(|| format!("UDP bind failed on {addr}"))?;
            relay::udp::serve(socket, &mut relay).await
        }
    }
}
