//! serial-fwd command-line entry point
//!
//! Prints forwarder events to stdout, one tagged line each, and diagnostics
//! to stderr through `tracing` (filtered by `RUST_LOG`, default `warn`).

use clap::Parser;
use serial_fwd::{Config, Event, Forwarder, HttpForwarder, serial, shutdown_signal};
use std::path::PathBuf;
use std::process::ExitCode;
use tokio::sync::broadcast::error::RecvError;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Forward URLs printed on a serial console to their HTTPS endpoints
#[derive(Debug, Parser)]
#[command(name = "serial-fwd", version, about)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Serial port to listen on (overrides the configuration file)
    #[arg(short, long)]
    port: Option<String>,

    /// Baud rate (overrides the configuration file)
    #[arg(short, long)]
    baud: Option<u32>,

    /// List available serial ports and exit
    #[arg(long)]
    list_ports: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if cli.list_ports {
        return list_ports();
    }

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => return fatal(&e),
    };

    let port = match serial::open(&config.serial) {
        Ok(port) => port,
        Err(e) => return fatal(&e),
    };
    let sink = match HttpForwarder::new(&config.http) {
        Ok(sink) => sink,
        Err(e) => return fatal(&e),
    };
    let forwarder = match Forwarder::new(config, port, sink) {
        Ok(forwarder) => forwarder,
        Err(e) => return fatal(&e),
    };

    let mut events = forwarder.subscribe();
    let printer = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => println!("{event}"),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "console output fell behind, events dropped");
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        trigger.cancel();
    });

    let reason = forwarder.run(cancel).await;
    // The forwarder is gone, so the printer drains what is left and stops
    printer.await.ok();
    tracing::debug!(%reason, "exiting");
    ExitCode::SUCCESS
}

fn load_config(cli: &Cli) -> serial_fwd::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    if let Some(port) = &cli.port {
        config.serial.port = port.clone();
    }
    if let Some(baud) = cli.baud {
        config.serial.baud_rate = baud;
    }
    config.validate()?;
    Ok(config)
}

fn list_ports() -> ExitCode {
    match serial::list_ports() {
        Ok(ports) if ports.is_empty() => {
            println!("[INFO] No serial ports found");
            ExitCode::SUCCESS
        }
        Ok(ports) => {
            for port in ports {
                println!("[INFO] {port}");
            }
            ExitCode::SUCCESS
        }
        Err(e) => fatal(&e),
    }
}

fn fatal(e: &serial_fwd::Error) -> ExitCode {
    tracing::error!(error = %e, "startup failed");
    println!(
        "{}",
        Event::Error {
            error: e.to_string()
        }
    );
    ExitCode::FAILURE
}
