//! Shared helpers for serial-fwd integration tests

#![allow(dead_code)]

use std::net::SocketAddr;
use std::time::Duration;
use serial_fwd::{Config, Event};
use tokio::net::TcpListener;
use tokio::sync::broadcast;

/// Configuration tuned for fast tests, forwarding URLs under `prefix`
pub fn test_config(prefix: &str) -> Config {
    let mut config = Config::default();
    config.serial.port = "/dev/ttyESP".to_string();
    config.serial.read_timeout = Duration::from_millis(50);
    config.http.timeout = Duration::from_millis(300);
    config.matcher.url_prefix = prefix.to_string();
    config.pacing.idle_delay = Duration::from_millis(5);
    config.pacing.error_backoff = Duration::from_millis(10);
    config
}

/// A TCP peer that accepts connections and never answers
///
/// TLS handshakes against it stall until the client gives up.
pub async fn silent_peer() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });
    addr
}

/// Receive the next event, failing the test after five seconds
pub async fn next_event(events: &mut broadcast::Receiver<Event>) -> Event {
    tokio::time::timeout(Duration::from_secs(5), events.recv())
        .await
        .expect("timed out waiting for event")
        .expect("event channel closed")
}
