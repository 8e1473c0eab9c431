//! Crawl statistics
//!
//! Worker tasks bump lock-free counters as they finish; the coordinator turns
//! them into a [`CrawlSummary`] once the frontier has closed.

use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicU64, Ordering};

/// Live counters shared by all worker tasks
#[derive(Debug, Default)]
pub struct CrawlStatistics {
    pages_written: AtomicU64,
    fetch_failures: AtomicU64,
    parse_failures: AtomicU64,
    write_failures: AtomicU64,
    duplicates_skipped: AtomicU64,
    links_discovered: AtomicU64,
}

impl CrawlStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of pages written so far, this one included
    pub fn record_page_written(&self) -> u64 {
        self.pages_written.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn record_fetch_failure(&self) {
        self.fetch_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_parse_failure(&self) {
        self.parse_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_write_failure(&self) {
        self.write_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_duplicate(&self) {
        self.duplicates_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_links(&self, count: usize) {
        self.links_discovered
            .fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn pages_written(&self) -> u64 {
        self.pages_written.load(Ordering::Relaxed)
    }

    /// Freezes the counters into a summary
    ///
    /// # Arguments
    ///
    /// * `uris_discovered` - Distinct URIs the frontier has seen
    /// * `uris_visited` - Distinct URIs that were claimed for fetching
    /// * `started_at` - When the crawl began
    /// * `interrupted` - Whether the crawl was cancelled before completion
    pub fn summarize(
        &self,
        uris_discovered: usize,
        uris_visited: usize,
        started_at: DateTime<Utc>,
        interrupted: bool,
    ) -> CrawlSummary {
        let finished_at = Utc::now();
        CrawlSummary {
            started_at,
            finished_at,
            duration_ms: (finished_at - started_at).num_milliseconds().max(0) as u64,
            uris_discovered: uris_discovered as u64,
            uris_visited: uris_visited as u64,
            pages_written: self.pages_written.load(Ordering::Relaxed),
            fetch_failures: self.fetch_failures.load(Ordering::Relaxed),
            parse_failures: self.parse_failures.load(Ordering::Relaxed),
            write_failures: self.write_failures.load(Ordering::Relaxed),
            duplicates_skipped: self.duplicates_skipped.load(Ordering::Relaxed),
            links_discovered: self.links_discovered.load(Ordering::Relaxed),
            interrupted,
        }
    }
}

/// Final report of a crawl run
#[derive(Debug, Clone)]
pub struct CrawlSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub duration_ms: u64,

    pub uris_discovered: u64,
    pub uris_visited: u64,
    pub pages_written: u64,

    pub fetch_failures: u64,
    pub parse_failures: u64,
    pub write_failures: u64,

    pub duplicates_skipped: u64,
    pub links_discovered: u64,

    /// The crawl was cancelled before the frontier drained
    pub interrupted: bool,
}

impl CrawlSummary {
    /// Pages that were claimed but produced no record
    pub fn total_errors(&self) -> u64 {
        self.fetch_failures + self.parse_failures + self.write_failures
    }
}

/// Prints a summary to stdout in a formatted manner
pub fn print_summary(summary: &CrawlSummary) {
    println!("=== Crawl Summary ===\n");

    println!(
        "Started:  {}",
        summary.started_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    println!(
        "Finished: {}",
        summary.finished_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    println!("Duration: {:.2}s", summary.duration_ms as f64 / 1000.0);
    if summary.interrupted {
        println!("Status:   interrupted");
    } else {
        println!("Status:   completed");
    }
    println!();

    println!("URIs:");
    println!("  Discovered: {}", summary.uris_discovered);
    println!("  Visited: {}", summary.uris_visited);
    println!("  Links followed: {}", summary.links_discovered);
    println!("  Duplicate claims skipped: {}", summary.duplicates_skipped);
    println!();

    println!("Pages:");
    println!("  Written: {}", summary.pages_written);
    println!("  Fetch failures: {}", summary.fetch_failures);
    println!("  Parse failures: {}", summary.parse_failures);
    println!("  Write failures: {}", summary.write_failures);
    println!();

    let success_rate = if summary.uris_visited > 0 {
        (summary.pages_written as f64 / summary.uris_visited as f64) * 100.0
    } else {
        0.0
    };

    println!(
        "Success Rate: {:.1}% ({} / {} visited pages written)",
        success_rate, summary.pages_written, summary.uris_visited
    );
}
