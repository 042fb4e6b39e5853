// Interactive requester
// Reads an operator and two operands, sends them through the relay and
// prints whatever comes back, error flag included.

use anyhow::{Context, Result};
use clap::Parser;
use client::Requester;
use protocol::{Config, OperationKind, OperationRecord, Protocol};
use std::io::{self, BufRead, Write};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "client")]
#[command(about = "Interactive requester talking to the relay on port P")]
struct Cli {
    /// Transport: tcp or udp
    protocol: Protocol,
}

/// Print `message` and read one trimmed line. `None` on end of input.
fn prompt(lines: &mut impl BufRead, message: &str) -> Option<String> {
    print!("{}", message);
    io::stdout().flush().ok();

    let mut input = String::new();
    match lines.read_line(&mut input) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(input.trim().to_string()),
    }
}

/// Keep asking until a valid 32-bit integer is entered.
fn prompt_operand(lines: &mut impl BufRead, label: &str) -> Option<i32> {
    loop {
        let input = prompt(lines, label)?;
        match input.parse::<i32>() {
            Ok(value) => return Some(value),
            Err(_) => println!("[error] '{}' is not a 32-bit integer", input),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Usage errors exit with 1, not clap's default of 2
    let Cli { protocol } = Cli::try_parse().unwrap_or_else(|e| {
        let _ = e.print();
        std::process::exit(if e.use_stderr() { 1 } else { 0 });
    });

    // Console output is the interface here, so default to warnings only
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let config = Config::from_env().context("Invalid configuration")?;
    let relay_addr = config.relay_addr();

    let mut requester = Requester::connect(protocol, &relay_addr)
        .await
        .with_context(|| format!("{} connection to relay {} failed", protocol, relay_addr))?;

    println!("{} Client connected to middle man at {}", protocol, relay_addr);

    let stdin = io::stdin();
    let mut lines = stdin.lock();

    loop {
        let Some(op) = prompt(&mut lines, "Enter operation (+, -, *, /) or 'exit': ") else {
            break;
        };
        if op == "exit" {
            break;
        }
        if op.is_empty() {
            continue;
        }

        let operation = OperationKind::from_symbol(&op);
        if operation == OperationKind::Invalid {
            println!("Invalid operation");
            continue;
        }

        let Some(operand1) = prompt_operand(&mut lines, "Enter first operand: ") else {
            break;
        };
        let Some(operand2) = prompt_operand(&mut lines, "Enter second operand: ") else {
            break;
        };

        let request = OperationRecord::request(operation, operand1, operand2);
        let reply = requester
            .exchange(&request)
            .await
            .context("Exchange with relay failed")?;

        println!("Server response: {}", reply);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_cli() {
        assert_eq!(Cli::try_parse_from(["client", "udp"]).unwrap().protocol, Protocol::Udp);
        assert!(Cli::try_parse_from(["client"]).is_err());
        assert!(Cli::try_parse_from(["client", "http"]).is_err());
    }

    #[test]
    fn test_prompt_operand_retries_until_valid() {
        let mut input = Cursor::new("seven\n99999999999\n-12\n");
        assert_eq!(prompt_operand(&mut input, ""), Some(-12));
        assert_eq!(prompt_operand(&mut input, ""), None);
    }
}
