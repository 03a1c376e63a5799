//! The serial → HTTPS forwarding loop
//!
//! [`Forwarder`] owns everything the loop needs: the byte source, the rolling
//! line buffer, the compiled URL pattern and the HTTP sink. It runs strictly
//! sequentially: one read, then every complete line in that read, one request
//! at a time.
//!
//! # Example
//!
//! ```no_run
//! use serial_fwd::{Config, Forwarder, HttpForwarder, serial};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> serial_fwd::Result<()> {
//! let config = Config::default();
//! let port = serial::open(&config.serial)?;
//! let sink = HttpForwarder::new(&config.http)?;
//! let forwarder = Forwarder::new(config, port, sink)?;
//!
//! let mut events = forwarder.subscribe();
//! tokio::spawn(async move {
//!     while let Ok(event) = events.recv().await {
//!         println!("{event}");
//!     }
//! });
//!
//! forwarder.run(CancellationToken::new()).await;
//! # Ok(())
//! # }
//! ```

use crate::config::Config;
use crate::error::{Error, Recovery, Result};
use crate::http::{HttpSink, body_preview};
use crate::line_buffer::{LineBuffer, decode_line};
use crate::matcher::UrlMatcher;
use crate::types::{Event, ExitReason};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::broadcast;
use tokio::time::{sleep, timeout};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, trace, warn};
use url::Url;

/// Capacity of the event broadcast channel
const EVENT_CHANNEL_CAPACITY: usize = 1024;

/// Reads lines from a serial byte source and forwards matching URLs
pub struct Forwarder<R, S> {
    source: R,
    buffer: LineBuffer,
    lines: LineHandler<S>,
}

/// Per-line state, kept apart from the byte source so a running loop only
/// needs the source to be `Send`
struct LineHandler<S> {
    config: Config,
    sink: S,
    matcher: UrlMatcher,
    event_tx: broadcast::Sender<Event>,
}

impl<R, S> Forwarder<R, S>
where
    R: AsyncRead + Unpin,
    S: HttpSink,
{
    /// Assemble a forwarder from a validated configuration
    ///
    /// `source` is usually the stream returned by [`crate::serial::open`] and
    /// `sink` an [`HttpForwarder`](crate::http::HttpForwarder).
    pub fn new(config: Config, source: R, sink: S) -> Result<Self> {
        config.validate()?;
        let matcher = UrlMatcher::new(&config.matcher)?;
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        Ok(Self {
            source,
            buffer: LineBuffer::new(),
            lines: LineHandler {
                config,
                sink,
                matcher,
                event_tx,
            },
        })
    }

    /// Subscribe to forwarder events
    ///
    /// Only events emitted after subscribing are received.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.lines.event_tx.subscribe()
    }

    /// Run the read loop until `cancel` fires
    ///
    /// Cancellation is observed at every await point, so an in-flight read,
    /// request or pause is abandoned as soon as it fires. Errors never end the
    /// loop: each one is handled according to its [`Recovery`] policy.
    pub async fn run(mut self, cancel: CancellationToken) -> ExitReason {
        let serial = &self.lines.config.serial;
        let read_timeout = serial.read_timeout;
        let idle_delay = self.lines.config.pacing.idle_delay;
        let error_backoff = self.lines.config.pacing.error_backoff;
        let mut chunk = vec![0u8; serial.chunk_size];

        info!(port = %serial.port, baud_rate = serial.baud_rate, "forwarder started");
        self.lines.emit(Event::Listening {
            port: serial.port.clone(),
            baud_rate: serial.baud_rate,
        });

        loop {
            let read = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                read = timeout(read_timeout, self.source.read(&mut chunk)) => read,
            };

            let outcome = match read {
                // Nothing arrived within the read timeout, or the source is at EOF
                Err(_) | Ok(Ok(0)) => {
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => break,
                        _ = sleep(idle_delay) => {}
                    }
                    continue;
                }
                Ok(Ok(n)) => {
                    trace!(bytes = n, "serial chunk received");
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => break,
                        outcome = self.handle_chunk(&chunk[..n]) => outcome,
                    }
                }
                Ok(Err(e)) => Err(Error::SerialRead(e)),
            };

            if let Err(e) = outcome {
                self.lines.report_unexpected(&e);
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => break,
                    _ = sleep(error_backoff) => {}
                }
            }
        }

        let reason = ExitReason::Interrupted;
        info!(reason = %reason, "forwarder stopped");
        self.lines.emit(Event::Exit { reason });
        reason
    }

    /// Append one read chunk and process every line it completes
    ///
    /// If a line fails with an error that is not handled per line or per
    /// request, processing stops there and the error is returned; lines still
    /// buffered are picked up with the next chunk.
    pub async fn handle_chunk(&mut self, bytes: &[u8]) -> Result<()> {
        self.buffer.extend(bytes);
        while let Some(raw) = self.buffer.next_line() {
            let line = decode_line(&raw);
            self.lines.handle(&line).await?;
        }
        Ok(())
    }

    /// Forward the URL on a single decoded line, if it has one
    ///
    /// Returns the outcome event (`Response` or `HttpError`) for a matching
    /// line, `None` when the line carries no URL.
    pub async fn handle_line(&self, line: &str) -> Result<Option<Event>> {
        self.lines.handle(line).await
    }
}

impl<S: HttpSink> LineHandler<S> {
    async fn handle(&self, line: &str) -> Result<Option<Event>> {
        let Some(forward_url) = self.matcher.forward_url(line) else {
            return Ok(None);
        };

        info!(url = %forward_url, "forwarding");
        self.emit(Event::Forwarding {
            url: forward_url.clone(),
        });

        let outcome = match Url::parse(&forward_url) {
            Ok(url) => self.sink.get(&url).await,
            Err(source) => Err(Error::InvalidUrl {
                url: forward_url.clone(),
                source,
            }),
        };

        let event = match outcome {
            Ok(response) => Event::Response {
                url: forward_url,
                status: response.status,
                body_preview: body_preview(&response.body, self.config.http.body_preview_chars),
            },
            Err(e) => match e.recovery() {
                Recovery::AbandonRequest => {
                    warn!(url = %forward_url, error = %e, "forwarded request failed");
                    Event::HttpError {
                        url: forward_url,
                        timed_out: e.is_timeout(),
                        error: e.to_string(),
                    }
                }
                Recovery::Transient | Recovery::Fatal => return Err(e),
            },
        };

        self.emit(event.clone());
        Ok(Some(event))
    }

    fn report_unexpected(&self, e: &Error) {
        match e.recovery() {
            Recovery::Fatal => error!(error = %e, "fatal error inside loop, resuming after backoff"),
            Recovery::Transient | Recovery::AbandonRequest => {
                error!(error = %e, "loop iteration failed")
            }
        }
        self.emit(Event::Error {
            error: e.to_string(),
        });
    }

    fn emit(&self, event: Event) {
        // No subscribers is fine
        self.event_tx.send(event).ok();
    }
}
