use serde::Deserialize;

/// Main configuration structure for kwcrawl
///
/// Every section and key is optional in the TOML file; missing values fall
/// back to the defaults below.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent", default)]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Number of worker tasks pulling from the frontier
    pub workers: u32,

    /// Whole-request timeout (seconds)
    #[serde(rename = "request-timeout")]
    pub request_timeout: u64,

    /// Connection establishment timeout (seconds)
    #[serde(rename = "connect-timeout")]
    pub connect_timeout: u64,

    /// Additional attempts for transient fetch failures
    #[serde(rename = "max-retries")]
    pub max_retries: u32,

    /// Delay between fetch attempts (milliseconds)
    #[serde(rename = "retry-delay")]
    pub retry_delay: u64,

    /// Skip TLS certificate validation
    #[serde(rename = "accept-invalid-certs")]
    pub accept_invalid_certs: bool,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            workers: 16,
            request_timeout: 30,
            connect_timeout: 10,
            max_retries: 0,
            retry_delay: 500,
            accept_invalid_certs: false,
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: env!("CARGO_PKG_NAME").to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

impl UserAgentConfig {
    /// Formats the `User-Agent` header value
    pub fn header_value(&self) -> String {
        format!("{}/{}", self.crawler_name, self.crawler_version)
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Path of the append-only record log
    pub path: String,

    /// Treat a failed record write as fatal to the whole crawl
    #[serde(rename = "abort-on-write-error")]
    pub abort_on_write_error: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: "output.txt".to_string(),
            abort_on_write_error: false,
        }
    }
}
