//! Core types and events

use std::fmt;

/// Why the forwarder loop stopped
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExitReason {
    /// The operator asked the process to stop (Ctrl+C, SIGINT, SIGTERM)
    Interrupted,
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitReason::Interrupted => write!(f, "Interrupted"),
        }
    }
}

/// Event emitted by the forwarder
///
/// The `Display` implementation renders the console line for the event,
/// prefixed with its bracketed tag (`[FORWARD]`, `[RESP]`, ...).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// The serial port is open and the loop is about to start
    Listening {
        /// Port identifier
        port: String,
        /// Configured baud rate
        baud_rate: u32,
    },

    /// A matching line produced a URL that is about to be requested
    Forwarding {
        /// The rewritten https:// URL
        url: String,
    },

    /// The forwarded request completed
    Response {
        /// The URL that was requested
        url: String,
        /// HTTP status code of the final response (after redirects)
        status: u16,
        /// Escaped leading part of the response body
        body_preview: String,
    },

    /// The forwarded request failed and was abandoned
    HttpError {
        /// The URL that was requested
        url: String,
        /// Error message
        error: String,
        /// Whether the request timed out
        timed_out: bool,
    },

    /// An unexpected error interrupted one loop iteration
    Error {
        /// Error message
        error: String,
    },

    /// The loop has stopped
    Exit {
        /// Why it stopped
        reason: ExitReason,
    },
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::Listening { port, baud_rate } => {
                write!(f, "[INFO] Listening on {} @ {}", port, baud_rate)
            }
            Event::Forwarding { url } => write!(f, "[FORWARD] {}", url),
            Event::Response {
                status,
                body_preview,
                ..
            } => write!(f, "[RESP] {} | {}", status, body_preview),
            Event::HttpError { error, .. } => write!(f, "[HTTP ERROR] {}", error),
            Event::Error { error } => write!(f, "[ERROR] {}", error),
            Event::Exit { reason } => write!(f, "[EXIT] {}", reason),
        }
    }
}
