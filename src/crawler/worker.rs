//! Worker tasks
//!
//! Each worker pulls URIs from the frontier until it closes. For every URI it
//! runs one task: claim, fetch, extract, push the discovered links back into
//! the frontier, and emit the page record. The URI's lease is dropped only
//! after all of that, which is what keeps the frontier from closing while a
//! task may still discover links.

use crate::crawler::extractor::extract_page;
use crate::crawler::fetcher::{Fetch, FetchError};
use crate::crawler::frontier::{Frontier, Lease};
use crate::output::{CrawlStatistics, PageRecord, Sink, SinkError};
use crate::CrawlError;
use std::sync::Arc;

/// How often (in written pages) progress is logged
const PROGRESS_INTERVAL: u64 = 50;

/// How a single URI's task ended
#[derive(Debug)]
pub enum TaskOutcome {
    /// Another occurrence of the URI already won the claim
    Duplicate,

    /// The fetch failed; nothing was produced for this URI
    FetchFailed(FetchError),

    /// The body could not be parsed; nothing was produced for this URI
    ParseFailed(String),

    /// Links were dispatched but the record could not be written
    WriteFailed(SinkError),

    /// Links were dispatched and the record was written
    Completed { links: usize, keywords: usize },
}

/// One member of the bounded worker pool
pub struct Worker {
    id: usize,
    frontier: Frontier,
    fetcher: Arc<dyn Fetch>,
    sink: Arc<dyn Sink>,
    stats: Arc<CrawlStatistics>,
    abort_on_write_error: bool,
}

impl Worker {
    pub fn new(
        id: usize,
        frontier: Frontier,
        fetcher: Arc<dyn Fetch>,
        sink: Arc<dyn Sink>,
        stats: Arc<CrawlStatistics>,
        abort_on_write_error: bool,
    ) -> Self {
        Self {
            id,
            frontier,
            fetcher,
            sink,
            stats,
            abort_on_write_error,
        }
    }

    /// Processes URIs until the frontier closes
    ///
    /// Returns an error only when a record write fails and writes are
    /// configured to be fatal; in that case the frontier is closed first so
    /// the rest of the pool stops too.
    pub async fn run(self) -> Result<(), CrawlError> {
        tracing::trace!("Worker {} started", self.id);

        while let Some(lease) = self.frontier.dequeue().await {
            let outcome = self.process(&lease).await;

            if let TaskOutcome::WriteFailed(source) = outcome {
                if self.abort_on_write_error {
                    self.frontier.close();
                    return Err(CrawlError::Sink {
                        uri: lease.uri().to_string(),
                        source,
                    });
                }
            }
            // Lease dropped here: the task is no longer in flight
        }

        tracing::trace!("Worker {} stopped", self.id);
        Ok(())
    }

    /// Runs the task for one dequeued URI
    pub async fn process(&self, lease: &Lease) -> TaskOutcome {
        let uri = lease.uri();

        if !self.frontier.try_claim(uri) {
            tracing::trace!("Skipping already visited {}", uri);
            self.stats.record_duplicate();
            return TaskOutcome::Duplicate;
        }

        tracing::debug!("Worker {} fetching {}", self.id, uri);
        let fetched = tokio::select! {
            biased;
            _ = self.frontier.closed() => Err(FetchError::Cancelled),
            result = self.fetcher.fetch(uri) => result,
        };

        let body = match fetched {
            Ok(body) => body,
            Err(FetchError::Cancelled) => {
                tracing::debug!("Fetch of {} cancelled by shutdown", uri);
                return TaskOutcome::FetchFailed(FetchError::Cancelled);
            }
            Err(e) => {
                tracing::warn!("Failed to fetch {}: {}", uri, e);
                self.stats.record_fetch_failure();
                return TaskOutcome::FetchFailed(e);
            }
        };

        let page = match extract_page(&body) {
            Ok(page) => page,
            Err(e) => {
                tracing::warn!("Failed to parse {}: {}", uri, e);
                self.stats.record_parse_failure();
                return TaskOutcome::ParseFailed(e);
            }
        };

        let links = page.links.len();
        let keywords = page.keywords.len();
        tracing::debug!("{}: {} links, {} text fragments", uri, links, keywords);

        // Every occurrence goes back in; the next claimant dedups
        for link in page.links {
            self.frontier.enqueue(link);
        }
        self.stats.record_links(links);

        let record = PageRecord::new(uri, page.keywords);
        if let Err(e) = self.sink.append(&record) {
            tracing::error!("Failed to write record for {}: {}", uri, e);
            self.stats.record_write_failure();
            return TaskOutcome::WriteFailed(e);
        }

        let written = self.stats.record_page_written();
        if written % PROGRESS_INTERVAL == 0 {
            tracing::info!(
                "Progress: {} pages written, {} queued, {} in flight",
                written,
                self.frontier.pending_count(),
                self.frontier.in_flight_count()
            );
        }

        TaskOutcome::Completed { links, keywords }
    }
}
