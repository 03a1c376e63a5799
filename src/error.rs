//! Error types for serial-fwd
//!
//! Every failure the forwarder can hit is one variant of [`Error`]. Each variant
//! maps to exactly one [`Recovery`] policy, so the loop handles errors by
//! explicit branches instead of a catch-all:
//! - fatal errors stop the process before the loop starts
//! - request-level errors abandon a single forwarded request
//! - serial read errors are transient and retried after a short pause

use thiserror::Error;

/// Result type alias for serial-fwd operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for serial-fwd
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "serial.baud_rate")
        key: Option<String>,
    },

    /// The serial port could not be opened
    #[error("could not open serial port {port}: {source}")]
    SerialOpen {
        /// The port identifier that was requested
        port: String,
        /// The underlying serial driver error
        #[source]
        source: tokio_serial::Error,
    },

    /// Enumerating serial ports failed
    #[error("could not list serial ports: {0}")]
    PortEnumeration(#[source] tokio_serial::Error),

    /// Reading from an already open serial port failed
    #[error("serial read failed: {0}")]
    SerialRead(#[source] std::io::Error),

    /// A captured URL did not parse after the scheme upgrade
    #[error("invalid forward URL {url}: {source}")]
    InvalidUrl {
        /// The rewritten URL that failed to parse
        url: String,
        /// The parser error
        #[source]
        source: url::ParseError,
    },

    /// The HTTP client could not be constructed
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),

    /// A forwarded GET request failed (connect, DNS, timeout, body read)
    #[error("{0}")]
    Request(#[from] reqwest::Error),
}

/// How the forwarder reacts to an [`Error`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Recovery {
    /// Report and terminate the process with a non-zero status
    Fatal,
    /// Report the failure, abandon this request, keep reading
    AbandonRequest,
    /// Report, pause for the error backoff, then resume the loop
    Transient,
}

impl Error {
    /// Build a configuration error for a specific key
    pub fn config(key: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.into()),
        }
    }

    /// Classify this error into the recovery policy the loop applies to it
    pub fn recovery(&self) -> Recovery {
        match self {
            // Nothing can run without a valid config, a port, or a client
            Error::Config { .. } => Recovery::Fatal,
            Error::SerialOpen { .. } => Recovery::Fatal,
            Error::PortEnumeration(_) => Recovery::Fatal,
            Error::HttpClient(_) => Recovery::Fatal,
            // A URL that cannot be requested fails like any other request
            Error::InvalidUrl { .. } => Recovery::AbandonRequest,
            Error::Request(_) => Recovery::AbandonRequest,
            Error::SerialRead(_) => Recovery::Transient,
        }
    }

    /// Whether the request error was caused by the request timeout elapsing
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Request(e) if e.is_timeout())
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    fn builder_error() -> reqwest::Error {
        reqwest::Client::new()
            .get("not a url")
            .build()
            .expect_err("relative URL must not build")
    }

    #[test]
    fn every_variant_has_the_expected_recovery() {
        let cases = vec![
            (Error::config("serial.baud_rate", "must be > 0"), Recovery::Fatal),
            (
                Error::SerialOpen {
                    port: "/dev/ttyUSB9".into(),
                    source: tokio_serial::Error::new(
                        tokio_serial::ErrorKind::NoDevice,
                        "no such device",
                    ),
                },
                Recovery::Fatal,
            ),
            (
                Error::PortEnumeration(tokio_serial::Error::new(
                    tokio_serial::ErrorKind::Unknown,
                    "sysfs unavailable",
                )),
                Recovery::Fatal,
            ),
            (Error::HttpClient(builder_error()), Recovery::Fatal),
            (
                Error::InvalidUrl {
                    url: "https://script.google.com:bad".into(),
                    source: url::ParseError::InvalidPort,
                },
                Recovery::AbandonRequest,
            ),
            (Error::Request(builder_error()), Recovery::AbandonRequest),
            (
                Error::SerialRead(std::io::Error::new(
                    std::io::ErrorKind::BrokenPipe,
                    "device unplugged",
                )),
                Recovery::Transient,
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(error.recovery(), expected, "{error:?} should be {expected:?}");
        }
    }

    #[test]
    fn config_error_carries_key_and_message() {
        let err = Error::config("http.timeout", "must not be zero");
        match &err {
            Error::Config { message, key } => {
                assert_eq!(message, "must not be zero");
                assert_eq!(key.as_deref(), Some("http.timeout"));
            }
            other => panic!("expected Config, got {other:?}"),
        }
        assert_eq!(err.to_string(), "configuration error: must not be zero");
    }

    #[test]
    fn serial_open_message_names_the_port() {
        let err = Error::SerialOpen {
            port: "COM23".into(),
            source: tokio_serial::Error::new(tokio_serial::ErrorKind::NoDevice, "not found"),
        };
        let msg = err.to_string();
        assert!(msg.contains("COM23"), "message should name the port: {msg}");
        assert!(msg.contains("not found"), "message should carry the cause: {msg}");
    }

    #[test]
    fn builder_and_parse_errors_are_not_timeouts() {
        assert!(!Error::Request(builder_error()).is_timeout());
        assert!(
            !Error::InvalidUrl {
                url: "https://script.google.com:99999/x".into(),
                source: url::ParseError::InvalidPort,
            }
            .is_timeout()
        );
    }
}
