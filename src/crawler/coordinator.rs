//! Crawler coordinator - main crawl orchestration logic
//!
//! This module wires the crawl together:
//! - Validating the seed and seeding the frontier
//! - Starting the bounded worker pool
//! - Running the termination watcher that closes the frontier once it drains
//! - Collecting worker results into the final summary

use crate::config::{validate_seed, Config};
use crate::crawler::fetcher::{Fetch, HttpFetcher};
use crate::crawler::frontier::Frontier;
use crate::crawler::worker::Worker;
use crate::output::{CrawlStatistics, CrawlSummary, JsonLogSink, Sink};
use crate::CrawlError;
use chrono::Utc;
use std::path::Path;
use std::sync::Arc;
use tokio::task::JoinSet;

/// Main crawler coordinator structure
///
/// A coordinator runs exactly one crawl; its frontier is created with it and
/// discarded with it.
pub struct Coordinator {
    config: Arc<Config>,
    frontier: Frontier,
    fetcher: Arc<dyn Fetch>,
    sink: Arc<dyn Sink>,
    stats: Arc<CrawlStatistics>,
}

impl Coordinator {
    /// Creates a coordinator that fetches over HTTP and appends to the
    /// configured output file
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Successfully created coordinator
    /// * `Err(CrawlError)` - The HTTP client or the output file could not be set up
    pub fn new(config: Config) -> Result<Self, CrawlError> {
        let fetcher = HttpFetcher::new(&config)?;

        let output_path = config.output.path.clone();
        let sink = JsonLogSink::open(Path::new(&output_path)).map_err(|source| {
            CrawlError::Output {
                path: output_path.clone(),
                source,
            }
        })?;
        tracing::info!("Appending records to {}", output_path);

        Ok(Self::with_components(config, Arc::new(fetcher), Arc::new(sink)))
    }

    /// Creates a coordinator around caller-supplied fetcher and sink
    pub fn with_components(config: Config, fetcher: Arc<dyn Fetch>, sink: Arc<dyn Sink>) -> Self {
        Self {
            config: Arc::new(config),
            frontier: Frontier::new(),
            fetcher,
            sink,
            stats: Arc::new(CrawlStatistics::new()),
        }
    }

    /// Returns a handle to this crawl's frontier
    ///
    /// Closing it from outside (e.g. on Ctrl-C) stops the crawl: idle workers
    /// return and in-flight fetches are cancelled.
    pub fn frontier(&self) -> Frontier {
        self.frontier.clone()
    }

    /// Runs the crawl from `seed` until the frontier drains or is closed
    ///
    /// This method:
    /// 1. Validates the seed URI
    /// 2. Seeds the frontier
    /// 3. Spawns the termination watcher
    /// 4. Spawns the worker pool and waits for every worker to stop
    /// 5. Builds the summary
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlSummary)` - The crawl finished (or was interrupted) cleanly
    /// * `Err(CrawlError)` - The seed was invalid, a worker failed, or a
    ///   fatal record write failed
    pub async fn run(self, seed: &str) -> Result<CrawlSummary, CrawlError> {
        let seed = validate_seed(seed).map_err(|e| CrawlError::Usage(e.to_string()))?;
        let started_at = Utc::now();
        let workers = self.config.crawler.workers.max(1) as usize;

        tracing::info!("Starting crawl from {} with {} workers", seed, workers);
        self.frontier.seed(seed);

        let watcher = {
            let frontier = self.frontier.clone();
            tokio::spawn(async move {
                if frontier.close_when_idle().await {
                    tracing::info!("Frontier drained, closing");
                }
            })
        };

        let mut pool = JoinSet::new();
        for id in 0..workers {
            let worker = Worker::new(
                id,
                self.frontier.clone(),
                Arc::clone(&self.fetcher),
                Arc::clone(&self.sink),
                Arc::clone(&self.stats),
                self.config.output.abort_on_write_error,
            );
            pool.spawn(worker.run());
        }

        let mut failure = None;
        while let Some(joined) = pool.join_next().await {
            let error = match joined {
                Ok(Ok(())) => continue,
                Ok(Err(e)) => e,
                Err(e) => CrawlError::Worker(e),
            };

            tracing::error!("Stopping crawl: {}", error);
            self.frontier.close();
            failure.get_or_insert(error);
        }

        // Every worker has returned, so the frontier is closed by now
        watcher.await?;

        if let Some(error) = failure {
            return Err(error);
        }

        let summary = self.stats.summarize(
            self.frontier.discovered_count(),
            self.frontier.visited_count(),
            started_at,
            self.frontier.closed_early(),
        );

        if summary.interrupted {
            tracing::warn!(
                "Crawl interrupted: {} pages written, {} URIs left unvisited",
                summary.pages_written,
                summary.uris_discovered - summary.uris_visited
            );
        } else {
            tracing::info!(
                "Crawl completed: {} pages written from {} visited URIs in {}ms",
                summary.pages_written,
                summary.uris_visited,
                summary.duration_ms
            );
        }

        Ok(summary)
    }
}

/// Runs a complete crawl with the production fetcher and sink
///
/// Ctrl-C closes the frontier, so an interrupted crawl still returns its
/// summary.
///
/// # Example
///
/// ```no_run
/// use kwcrawl::config::Config;
/// use kwcrawl::crawler::run_crawl;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let summary = run_crawl(Config::default(), "https://example.com/").await?;
/// println!("{} pages written", summary.pages_written);
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl(config: Config, seed: &str) -> Result<CrawlSummary, CrawlError> {
    // A bad seed must not leave an output file behind
    let seed = validate_seed(seed).map_err(|e| CrawlError::Usage(e.to_string()))?;
    let coordinator = Coordinator::new(config)?;

    let interrupt = {
        let frontier = coordinator.frontier();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Interrupt received, stopping crawl");
                frontier.close();
            }
        })
    };

    let result = coordinator.run(&seed).await;
    interrupt.abort();
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::FetchError;
    use crate::output::{MemorySink, PageRecord, SinkError};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Serves a fixed link graph from memory and counts fetches per URI
    #[derive(Default)]
    struct GraphFetcher {
        pages: HashMap<String, (String, Duration)>,
        fetches: Mutex<HashMap<String, usize>>,
    }

    impl GraphFetcher {
        fn page(mut self, uri: &str, body: &str) -> Self {
            self.pages
                .insert(uri.to_string(), (body.to_string(), Duration::ZERO));
            self
        }

        fn slow_page(mut self, uri: &str, body: &str, delay: Duration) -> Self {
            self.pages.insert(uri.to_string(), (body.to_string(), delay));
            self
        }

        fn fetch_count(&self, uri: &str) -> usize {
            self.fetches.lock().unwrap().get(uri).copied().unwrap_or(0)
        }
    }

    #[async_trait]
    impl Fetch for GraphFetcher {
        async fn fetch(&self, uri: &str) -> Result<Vec<u8>, FetchError> {
            *self
                .fetches
                .lock()
                .unwrap()
                .entry(uri.to_string())
                .or_default() += 1;

            let (body, delay) = self
                .pages
                .get(uri)
                .cloned()
                .ok_or_else(|| FetchError::Transport(format!("no route to {}", uri).into()))?;
            tokio::time::sleep(delay).await;
            Ok(body.into_bytes())
        }
    }

    fn links(targets: &[&str]) -> String {
        targets
            .iter()
            .map(|t| format!(r#"<a href="{}">{}</a>"#, t, t))
            .collect()
    }

    fn config(workers: u32) -> Config {
        let mut config = Config::default();
        config.crawler.workers = workers;
        config
    }

    async fn crawl(
        fetcher: Arc<GraphFetcher>,
        workers: u32,
        seed: &str,
    ) -> (CrawlSummary, Vec<PageRecord>) {
        let sink = Arc::new(MemorySink::new());
        let coordinator = Coordinator::with_components(config(workers), fetcher, sink.clone());
        let summary = tokio::time::timeout(Duration::from_secs(10), coordinator.run(seed))
            .await
            .expect("crawl should terminate")
            .expect("crawl should succeed");
        (summary, sink.records())
    }

    #[tokio::test]
    async fn test_single_page_record_shape() {
        let fetcher = Arc::new(GraphFetcher::default().page(
            "http://seed.test",
            r#"<html><head><title>Seed</title><script>var hidden = 1;</script></head>
               <body><h1>Welcome</h1><p>to the "seed"&nbsp;page</p></body></html>"#,
        ));

        let (summary, records) = crawl(fetcher, 4, "http://seed.test").await;

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].uri, "http://seed.test");
        assert_eq!(
            records[0].keywords,
            vec!["Seed", "Welcome", "to the  seed  page"]
        );
        assert_eq!(summary.pages_written, 1);
        assert_eq!(summary.uris_visited, 1);
        assert!(!summary.interrupted);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_cycle_visited_exactly_once() {
        let fetcher = Arc::new(
            GraphFetcher::default()
                .page("http://a.test", &links(&["http://b.test"]))
                .page("http://b.test", &links(&["http://c.test"]))
                .page("http://c.test", &links(&["http://a.test"])),
        );

        let (summary, records) = crawl(fetcher.clone(), 4, "http://a.test").await;

        for uri in ["http://a.test", "http://b.test", "http://c.test"] {
            assert_eq!(fetcher.fetch_count(uri), 1, "{} fetched once", uri);
        }
        assert_eq!(records.len(), 3);
        assert_eq!(summary.uris_visited, 3);
        assert_eq!(summary.duplicates_skipped, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_seed_rediscovered_by_many_pages_fetched_once() {
        let hubs: Vec<String> = (0..20).map(|i| format!("http://hub{}.test", i)).collect();
        let hub_refs: Vec<&str> = hubs.iter().map(String::as_str).collect();

        let mut fetcher = GraphFetcher::default().page("http://seed.test", &links(&hub_refs));
        for hub in &hubs {
            fetcher = fetcher.page(hub, &links(&["http://seed.test", "http://seed.test"]));
        }
        let fetcher = Arc::new(fetcher);

        let (summary, records) = crawl(fetcher.clone(), 8, "http://seed.test").await;

        assert_eq!(fetcher.fetch_count("http://seed.test"), 1);
        for hub in &hubs {
            assert_eq!(fetcher.fetch_count(hub), 1);
        }
        assert_eq!(records.len(), 21);
        assert_eq!(summary.duplicates_skipped, 40);
    }

    #[tokio::test]
    async fn test_late_discovery_still_visited() {
        // The seed takes a while, so the queue sits empty while it is in flight
        let fetcher = Arc::new(
            GraphFetcher::default()
                .slow_page(
                    "http://seed.test",
                    &links(&["http://late.test"]),
                    Duration::from_millis(200),
                )
                .page("http://late.test", "<p>late</p>"),
        );

        let (summary, records) = crawl(fetcher.clone(), 4, "http://seed.test").await;

        assert_eq!(fetcher.fetch_count("http://late.test"), 1);
        assert_eq!(records.len(), 2);
        assert!(records.iter().any(|r| r.uri == "http://late.test"));
        assert!(!summary.interrupted);
    }

    #[tokio::test]
    async fn test_fetch_failure_does_not_stop_crawl() {
        let fetcher = Arc::new(
            GraphFetcher::default()
                .page("http://seed.test", &links(&["http://gone.test", "http://ok.test"]))
                .page("http://ok.test", "<p>ok</p>"),
        );

        let (summary, records) = crawl(fetcher, 2, "http://seed.test").await;

        assert_eq!(records.len(), 2);
        assert_eq!(summary.fetch_failures, 1);
        assert_eq!(summary.uris_visited, 3);
    }

    #[tokio::test]
    async fn test_single_worker_terminates() {
        let fetcher = Arc::new(
            GraphFetcher::default()
                .page("http://a.test", &links(&["http://b.test", "http://a.test"]))
                .page("http://b.test", &links(&["http://a.test"])),
        );

        let (summary, records) = crawl(fetcher, 1, "http://a.test").await;
        assert_eq!(records.len(), 2);
        assert_eq!(summary.uris_visited, 2);
    }

    #[tokio::test]
    async fn test_invalid_seed_is_usage_error() {
        let coordinator = Coordinator::with_components(
            config(1),
            Arc::new(GraphFetcher::default()),
            Arc::new(MemorySink::new()),
        );

        let result = coordinator.run("not a uri").await;
        assert!(matches!(result, Err(CrawlError::Usage(_))));
    }

    #[tokio::test]
    async fn test_external_close_interrupts() {
        let fetcher = Arc::new(GraphFetcher::default().slow_page(
            "http://seed.test",
            "<p>slow</p>",
            Duration::from_secs(3600),
        ));
        let coordinator = Coordinator::with_components(
            config(2),
            fetcher,
            Arc::new(MemorySink::new()),
        );
        let frontier = coordinator.frontier();

        let handle = tokio::spawn(async move { coordinator.run("http://seed.test").await });
        tokio::time::sleep(Duration::from_millis(50)).await;
        frontier.close();

        let summary = tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("crawl should stop promptly")
            .unwrap()
            .unwrap();
        assert!(summary.interrupted);
        assert_eq!(summary.pages_written, 0);
    }

    struct FailingSink;

    impl Sink for FailingSink {
        fn append(&self, _record: &PageRecord) -> Result<(), SinkError> {
            Err(SinkError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "read-only file system",
            )))
        }
    }

    #[tokio::test]
    async fn test_fatal_write_error_aborts_crawl() {
        let fetcher = Arc::new(
            GraphFetcher::default()
                .page("http://seed.test", &links(&["http://next.test"]))
                .page("http://next.test", "<p>next</p>"),
        );
        let mut config = config(1);
        config.output.abort_on_write_error = true;

        let coordinator = Coordinator::with_components(config, fetcher, Arc::new(FailingSink));
        let result = coordinator.run("http://seed.test").await;

        assert!(matches!(result, Err(CrawlError::Sink { .. })));
    }

    #[tokio::test]
    async fn test_write_errors_isolated_by_default() {
        let fetcher = Arc::new(
            GraphFetcher::default()
                .page("http://seed.test", &links(&["http://next.test"]))
                .page("http://next.test", "<p>next</p>"),
        );

        let coordinator =
            Coordinator::with_components(config(2), fetcher.clone(), Arc::new(FailingSink));
        let summary = coordinator.run("http://seed.test").await.unwrap();

        assert_eq!(fetcher.fetch_count("http://next.test"), 1);
        assert_eq!(summary.write_failures, 2);
        assert_eq!(summary.pages_written, 0);
    }
}
