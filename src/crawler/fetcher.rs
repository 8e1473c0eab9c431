//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building the shared HTTP client (connection pooling, timeouts, TLS policy)
//! - GET requests returning the raw response body
//! - Bounded retry for transient failures
//! - Error classification
//!
//! Any HTTP response counts as fetched, whatever its status: an error page
//! still has a body worth extracting. Only failures to get a response at all
//! are [`FetchError`]s.

use crate::config::Config;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use thiserror::Error;

/// Reasons a single fetch can fail
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request timed out: {0}")]
    Timeout(#[source] reqwest::Error),

    #[error("connection failed: {0}")]
    Connect(#[source] reqwest::Error),

    #[error("transport error: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("fetch cancelled")]
    Cancelled,
}

impl FetchError {
    /// Whether another attempt may succeed
    ///
    /// Timeouts and connection failures are retried; other transport errors
    /// and cancellation are not.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Timeout(_) | Self::Connect(_))
    }

    fn from_reqwest(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout(error)
        } else if error.is_connect() {
            Self::Connect(error)
        } else {
            Self::Transport(Box::new(error))
        }
    }
}

/// A capability that performs a GET and returns the raw body
#[async_trait]
pub trait Fetch: Send + Sync {
    async fn fetch(&self, uri: &str) -> Result<Vec<u8>, FetchError>;
}

/// Builds an HTTP client with proper configuration
///
/// One client is shared by every worker so connections are pooled and
/// reused; idle connections are torn down when the last clone is dropped.
///
/// Certificate validation stays on unless `accept-invalid-certs` is set.
///
/// # Example
///
/// ```no_run
/// use kwcrawl::config::Config;
/// use kwcrawl::crawler::build_http_client;
///
/// let client = build_http_client(&Config::default()).unwrap();
/// ```
pub fn build_http_client(config: &Config) -> Result<Client, reqwest::Error> {
    if config.crawler.accept_invalid_certs {
        tracing::warn!("TLS certificate validation is DISABLED for this crawl");
    }

    Client::builder()
        .user_agent(config.user_agent.header_value())
        .timeout(Duration::from_secs(config.crawler.request_timeout))
        .connect_timeout(Duration::from_secs(config.crawler.connect_timeout))
        .danger_accept_invalid_certs(config.crawler.accept_invalid_certs)
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches pages over HTTP(S) with reqwest
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    max_retries: u32,
    retry_delay: Duration,
}

impl HttpFetcher {
    /// Creates a fetcher from the crawl configuration
    pub fn new(config: &Config) -> Result<Self, reqwest::Error> {
        Ok(Self::with_client(
            build_http_client(config)?,
            config.crawler.max_retries,
            Duration::from_millis(config.crawler.retry_delay),
        ))
    }

    pub fn with_client(client: Client, max_retries: u32, retry_delay: Duration) -> Self {
        Self {
            client,
            max_retries,
            retry_delay,
        }
    }

    async fn fetch_once(&self, uri: &str) -> Result<(StatusCode, Vec<u8>), FetchError> {
        let response = self
            .client
            .get(uri)
            .send()
            .await
            .map_err(FetchError::from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            tracing::debug!("{} answered {}", uri, status);
        }

        let body = response.bytes().await.map_err(FetchError::from_reqwest)?;
        Ok((status, body.to_vec()))
    }
}

#[async_trait]
impl Fetch for HttpFetcher {
    /// Fetches a URI, retrying up to `max_retries` times
    ///
    /// Timeouts, connection failures and 5xx responses are retried. When the
    /// retries run out on a 5xx, that last response's body is returned.
    async fn fetch(&self, uri: &str) -> Result<Vec<u8>, FetchError> {
        let mut attempt = 0;
        loop {
            let outcome = self.fetch_once(uri).await;
            let reason = match &outcome {
                Ok((status, _)) if status.is_server_error() => Some(status.to_string()),
                Ok(_) => None,
                Err(e) if e.is_transient() => Some(e.to_string()),
                Err(_) => None,
            };

            match reason {
                Some(reason) if attempt < self.max_retries => {
                    attempt += 1;
                    tracing::debug!(
                        "Retrying {} after {} (attempt {}/{})",
                        uri,
                        reason,
                        attempt,
                        self.max_retries
                    );
                    tokio::time::sleep(self.retry_delay).await;
                }
                _ => return outcome.map(|(_, body)| body),
            }
        }
    }
}
