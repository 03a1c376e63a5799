//! Outbound HTTP for forwarded URLs
//!
//! One [`HttpForwarder`] is built at startup and reused for every request, so
//! connections to the target host are pooled for the life of the process.

use crate::config::HttpConfig;
use crate::error::{Error, Result};
use async_trait::async_trait;
use url::Url;

/// Outcome of a forwarded GET request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForwardResponse {
    /// Status code of the final response (after redirects)
    pub status: u16,
    /// Response body decoded as text
    pub body: String,
}

/// Destination for forwarded URLs
///
/// The forwarder loop only depends on this trait, so tests can observe which
/// URLs would have been requested without touching the network.
#[async_trait]
pub trait HttpSink: Send + Sync {
    /// Issue a GET request for `url` and return the final response
    async fn get(&self, url: &Url) -> Result<ForwardResponse>;
}

/// reqwest-backed [`HttpSink`]
#[derive(Debug, Clone)]
pub struct HttpForwarder {
    client: reqwest::Client,
}

impl HttpForwarder {
    /// Build the shared client: request timeout, redirect limit, and the
    /// certificate verification setting all apply to every request it sends
    pub fn new(config: &HttpConfig) -> Result<Self> {
        if config.danger_accept_invalid_certs {
            tracing::warn!("TLS certificate verification is disabled for forwarded requests");
        }

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .danger_accept_invalid_certs(config.danger_accept_invalid_certs)
            .build()
            .map_err(Error::HttpClient)?;

        Ok(Self { client })
    }
}

#[async_trait]
impl HttpSink for HttpForwarder {
    async fn get(&self, url: &Url) -> Result<ForwardResponse> {
        let response = self.client.get(url.clone()).send().await?;
        let status = response.status().as_u16();
        tracing::debug!(url = %url, final_url = %response.url(), status, "forwarded request completed");

        let body = response.text().await?;
        Ok(ForwardResponse { status, body })
    }
}

/// Escaped leading `max_chars` characters of a response body
///
/// The result is quoted, with control characters and quotes escaped, so
/// multi-line or binary bodies stay on one console line.
pub fn body_preview(body: &str, max_chars: usize) -> String {
    let head: String = body.chars().take(max_chars).collect();
    format!("{:?}", head)
}
