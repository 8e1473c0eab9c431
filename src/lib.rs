//! kwcrawl: a concurrent breadth-first keyword crawler
//!
//! Starting from a single seed URI, this crate fetches pages, collects their
//! absolute outbound links and visible text, and appends one
//! `{"webpage":{"uri":..,"keywords":[..]}}` record per page to an output log.
//! Every URI is fetched at most once per crawl.

pub mod config;
pub mod crawler;
pub mod output;

use thiserror::Error;

/// Main error type for crawl operations
///
/// Per-URI fetch and parse failures never surface here; they end only the
/// task for that URI (see [`crawler::TaskOutcome`]).
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Usage error: {0}")]
    Usage(String),

    #[error("Failed to write record for {uri}: {source}")]
    Sink {
        uri: String,
        source: output::SinkError,
    },

    #[error("Failed to open output {path}: {source}")]
    Output {
        path: String,
        source: output::SinkError,
    },

    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),

    #[error("Worker task failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid seed URI: {0}")]
    InvalidSeed(String),
}

/// Result type alias for crawl operations
pub type Result<T> = std::result::Result<T, CrawlError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

pub use config::Config;
pub use crawler::{Coordinator, Frontier};
pub use output::{CrawlSummary, JsonLogSink, PageRecord, Sink};
