//! # serial-fwd
//!
//! Bridges a serial console to HTTPS: watches the log lines a microcontroller
//! (typically an ESP32) prints over its UART, picks out URLs announced with an
//! optional `[SERIALFWD]` marker, upgrades them to `https://` and issues a GET
//! for each one.
//!
//! ## Design Philosophy
//!
//! - **One sequential loop** - read, split lines, match, request, report
//! - **Nothing stops the loop** - per-line and per-request failures are
//!   reported and skipped; only startup failures are fatal
//! - **Event-driven output** - every console line is an [`Event`] that
//!   consumers subscribe to
//!
//! ## Quick Start
//!
//! ```no_run
//! use serial_fwd::{Config, Forwarder, HttpForwarder, serial, shutdown_signal};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut config = Config::default();
//!     config.serial.port = "/dev/ttyACM0".to_string();
//!
//!     let port = serial::open(&config.serial)?;
//!     let sink = HttpForwarder::new(&config.http)?;
//!     let forwarder = Forwarder::new(config, port, sink)?;
//!
//!     let mut events = forwarder.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             println!("{event}");
//!         }
//!     });
//!
//!     let cancel = CancellationToken::new();
//!     let trigger = cancel.clone();
//!     tokio::spawn(async move {
//!         shutdown_signal().await;
//!         trigger.cancel();
//!     });
//!
//!     forwarder.run(cancel).await;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// The forwarding loop
pub mod forwarder;
/// Outbound HTTP client
pub mod http;
/// Line reassembly from raw serial bytes
pub mod line_buffer;
/// URL extraction
pub mod matcher;
/// Serial port access
pub mod serial;
/// Core types and events
pub mod types;

// Re-export commonly used types
pub use config::{Config, HttpConfig, LoopConfig, MatchConfig, SerialConfig};
pub use error::{Error, Recovery, Result};
pub use forwarder::Forwarder;
pub use http::{ForwardResponse, HttpForwarder, HttpSink};
pub use line_buffer::LineBuffer;
pub use matcher::{UrlMatcher, upgrade_scheme};
pub use types::{Event, ExitReason};

/// Resolve once the operator asks the process to stop
///
/// Ctrl+C (SIGINT) works everywhere; on Unix SIGTERM does too. A listener
/// that cannot be installed is logged and simply never fires.
pub async fn shutdown_signal() {
    let interrupt = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "cannot listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = interrupt => tracing::info!("interrupt received"),
        _ = terminate => tracing::info!("terminate received"),
    }
}
