//! Configuration types for serial-fwd
//!
//! Every field has a default equal to the constant the forwarder was designed
//! around (115200 baud, 200 ms read timeout, 12 s HTTP timeout, 512-byte
//! chunks), so `Config::default()` is a complete, working configuration.
//! Durations are (de)serialized as milliseconds.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Serial connection settings
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerialConfig {
    /// Serial port identifier (default: "COM23" on Windows, "/dev/ttyUSB0" elsewhere)
    #[serde(default = "default_port")]
    pub port: String,

    /// Baud rate (default: 115200)
    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,

    /// Upper bound on a single read before it counts as idle (default: 200ms)
    #[serde(default = "default_read_timeout", with = "duration_millis")]
    pub read_timeout: Duration,

    /// Maximum number of bytes requested per read (default: 512)
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            baud_rate: default_baud_rate(),
            read_timeout: default_read_timeout(),
            chunk_size: default_chunk_size(),
        }
    }
}

/// Outbound HTTP settings
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Total request timeout (default: 12 seconds)
    #[serde(default = "default_http_timeout", with = "duration_millis")]
    pub timeout: Duration,

    /// Maximum number of redirects followed per request (default: 10)
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,

    /// Skip TLS certificate verification for every forwarded request (default: true)
    ///
    /// The forwarder talks to one fixed, trusted host. Turn this off before
    /// pointing `url_prefix` anywhere else.
    #[serde(default = "default_true")]
    pub danger_accept_invalid_certs: bool,

    /// Number of body characters included in the response report (default: 120)
    #[serde(default = "default_body_preview_chars")]
    pub body_preview_chars: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: default_http_timeout(),
            max_redirects: default_max_redirects(),
            danger_accept_invalid_certs: true,
            body_preview_chars: default_body_preview_chars(),
        }
    }
}

/// URL extraction settings
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchConfig {
    /// Literal tag that may precede the URL (default: "[SERIALFWD]")
    #[serde(default = "default_marker")]
    pub marker: String,

    /// Literal the captured URL must start with, matched case-insensitively
    /// (default: "http://script.google.com")
    #[serde(default = "default_url_prefix")]
    pub url_prefix: String,

    /// Only forward lines where the marker directly precedes the URL (default: false)
    #[serde(default)]
    pub require_marker: bool,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            marker: default_marker(),
            url_prefix: default_url_prefix(),
            require_marker: false,
        }
    }
}

/// Read-loop pacing
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoopConfig {
    /// Pause after a read that returned nothing (default: 20ms)
    #[serde(default = "default_idle_delay", with = "duration_millis")]
    pub idle_delay: Duration,

    /// Pause after an unexpected error before resuming (default: 300ms)
    #[serde(default = "default_error_backoff", with = "duration_millis")]
    pub error_backoff: Duration,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            idle_delay: default_idle_delay(),
            error_backoff: default_error_backoff(),
        }
    }
}

/// Main configuration for the forwarder
///
/// Loaded from TOML with one table per concern:
///
/// ```toml
/// [serial]
/// port = "/dev/ttyACM0"
/// baud_rate = 115200
///
/// [http]
/// timeout = 12000
/// danger_accept_invalid_certs = true
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Serial connection settings
    #[serde(default)]
    pub serial: SerialConfig,

    /// Outbound HTTP settings
    #[serde(default)]
    pub http: HttpConfig,

    /// URL extraction settings
    #[serde(default, rename = "match")]
    pub matcher: MatchConfig,

    /// Read-loop pacing
    #[serde(default, rename = "loop")]
    pub pacing: LoopConfig,
}

impl Config {
    /// Parse a configuration from TOML text and validate it
    pub fn from_toml(text: &str) -> Result<Self> {
        let config: Config = toml::from_str(text).map_err(|e| Error::Config {
            message: e.to_string(),
            key: None,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file from disk
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| Error::Config {
            message: format!("cannot read {}: {}", path.display(), e),
            key: None,
        })?;
        Self::from_toml(&text)
    }

    /// Reject settings the forwarder cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.serial.port.trim().is_empty() {
            return Err(Error::config("serial.port", "port must not be empty"));
        }
        if self.serial.baud_rate == 0 {
            return Err(Error::config("serial.baud_rate", "baud rate must be > 0"));
        }
        if self.serial.chunk_size == 0 {
            return Err(Error::config("serial.chunk_size", "chunk size must be > 0"));
        }
        if self.serial.read_timeout.is_zero() {
            return Err(Error::config(
                "serial.read_timeout",
                "read timeout must not be zero",
            ));
        }
        if self.http.timeout.is_zero() {
            return Err(Error::config("http.timeout", "timeout must not be zero"));
        }
        if !starts_with_http(&self.matcher.url_prefix) {
            return Err(Error::config(
                "match.url_prefix",
                format!(
                    "prefix must start with http:// (got {:?})",
                    self.matcher.url_prefix
                ),
            ));
        }
        if self.matcher.require_marker && self.matcher.marker.is_empty() {
            return Err(Error::config(
                "match.marker",
                "require_marker is set but the marker is empty",
            ));
        }
        Ok(())
    }
}

fn starts_with_http(prefix: &str) -> bool {
    prefix
        .get(..HTTP_SCHEME.len())
        .is_some_and(|scheme| scheme.eq_ignore_ascii_case(HTTP_SCHEME))
}

pub(crate) const HTTP_SCHEME: &str = "http://";

fn default_port() -> String {
    if cfg!(windows) {
        "COM23".to_string()
    } else {
        "/dev/ttyUSB0".to_string()
    }
}

fn default_baud_rate() -> u32 {
    115_200
}

fn default_read_timeout() -> Duration {
    Duration::from_millis(200)
}

fn default_chunk_size() -> usize {
    512
}

fn default_http_timeout() -> Duration {
    Duration::from_secs(12)
}

fn default_max_redirects() -> usize {
    10
}

fn default_body_preview_chars() -> usize {
    120
}

fn default_marker() -> String {
    "[SERIALFWD]".to_string()
}

fn default_url_prefix() -> String {
    "http://script.google.com".to_string()
}

fn default_idle_delay() -> Duration {
    Duration::from_millis(20)
}

fn default_error_backoff() -> Duration {
    Duration::from_millis(300)
}

fn default_true() -> bool {
    true
}

// Duration serialization helper (milliseconds)
mod duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}
