//! Output module for persisting crawl results
//!
//! This module handles:
//! - The page record type and its JSON exchange form
//! - Append-only record sinks
//! - Crawl statistics and the final summary

mod record;
mod sink;
pub mod stats;

pub use record::{read_records, PageRecord};
pub use sink::{JsonLogSink, MemorySink, Sink, SinkError};
pub use stats::{print_summary, CrawlStatistics, CrawlSummary};
