//! Configuration module for kwcrawl
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Command-line flags are applied on top of the loaded values by the binary.
//!
//! # Example
//!
//! ```no_run
//! use kwcrawl::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("kwcrawl.toml")).unwrap();
//! println!("Crawler will use {} workers", config.crawler.workers);
//! ```

mod parser;
mod types;
mod validation;

pub use types::{Config, CrawlerConfig, OutputConfig, UserAgentConfig};

pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::{validate, validate_seed, MAX_RETRIES, MAX_WORKERS};
