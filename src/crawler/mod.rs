//! Crawler module for web page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - The frontier: visited set, pending queue, in-flight accounting
//! - HTTP fetching with bounded retry
//! - HTML link and text extraction
//! - The bounded worker pool and crawl coordination

mod coordinator;
mod extractor;
mod fetcher;
mod frontier;
mod worker;

pub use coordinator::{run_crawl, Coordinator};
pub use extractor::{
    collect_links, collect_text, extract_page, normalize_spaces, parse_document,
    sanitize_fragment, ExtractedPage,
};
pub use fetcher::{build_http_client, Fetch, FetchError, HttpFetcher};
pub use frontier::{Frontier, Lease, UriState};
pub use worker::{TaskOutcome, Worker};
