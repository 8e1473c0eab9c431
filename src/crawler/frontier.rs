//! The crawl frontier
//!
//! The frontier owns every piece of shared crawl state: the visited set, the
//! pending queue, and the in-flight task count. All of it sits behind one
//! mutex; callers only see the atomic operations below and never touch the
//! visited set directly.
//!
//! Deduplication happens when a URI is claimed, not when it is enqueued. The
//! queue may hold the same URI several times (concurrent discoverers race to
//! push it), and exactly one of those occurrences wins [`Frontier::try_claim`].
//!
//! Termination is explicit: the crawl is over when the queue is empty *and*
//! no task is in flight. A dequeued URI counts as in flight from the moment it
//! leaves the queue until its [`Lease`] is dropped, so a task that has not yet
//! pushed its discovered links keeps the frontier open.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::Notify;

/// Per-URI state in the visited set
///
/// A URI moves `Discovered -> Dispatched` at most once and is never removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UriState {
    /// Known, but not yet claimed by any task
    Discovered,

    /// Claimed by a task; never fetched again
    Dispatched,
}

#[derive(Debug, Default)]
struct FrontierState {
    visited: HashMap<String, UriState>,
    queue: VecDeque<String>,
    in_flight: usize,
    closed: bool,
    closed_early: bool,
}

impl FrontierState {
    fn is_idle(&self) -> bool {
        self.queue.is_empty() && self.in_flight == 0
    }

    fn record_discovered(&mut self, uri: &str) {
        if !self.visited.contains_key(uri) {
            self.visited.insert(uri.to_string(), UriState::Discovered);
        }
    }
}

#[derive(Debug, Default)]
struct Shared {
    state: Mutex<FrontierState>,
    /// One permit per pushed URI; wakes a single blocked `dequeue`
    work: Notify,
    /// Close and idle transitions; wakes every waiter
    changed: Notify,
}

/// Shared handle to the crawl frontier
///
/// Cloning is cheap; every clone refers to the same frontier.
#[derive(Debug, Clone, Default)]
pub struct Frontier {
    shared: Arc<Shared>,
}

/// A URI handed out by [`Frontier::dequeue`]
///
/// While the lease is alive the URI counts as in flight. Dropping it is the
/// task's last action and may let the frontier become idle.
#[derive(Debug)]
pub struct Lease {
    uri: String,
    frontier: Frontier,
}

impl Lease {
    pub fn uri(&self) -> &str {
        &self.uri
    }
}

impl Drop for Lease {
    fn drop(&mut self) {
        let now_idle = {
            let mut state = self.frontier.state();
            state.in_flight -= 1;
            state.is_idle()
        };

        if now_idle {
            self.frontier.shared.changed.notify_waiters();
        }
    }
}

impl Frontier {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, FrontierState> {
        self.shared
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Seeds the frontier with the start URI
    ///
    /// Called once at crawl start, before any worker runs.
    pub fn seed(&self, uri: impl Into<String>) {
        let uri = uri.into();
        tracing::debug!("Seeding frontier with {}", uri);
        self.enqueue(uri);
    }

    /// Pushes a URI onto the pending queue
    ///
    /// No deduplication happens here; a URI already dispatched is still
    /// queued and discarded later by [`Frontier::try_claim`]. Returns `false`
    /// if the frontier is closed and the URI was dropped.
    pub fn enqueue(&self, uri: impl Into<String>) -> bool {
        let uri = uri.into();
        {
            let mut state = self.state();
            if state.closed {
                return false;
            }
            state.record_discovered(&uri);
            state.queue.push_back(uri);
        }

        self.shared.work.notify_one();
        true
    }

    /// Atomically claims a URI for fetching
    ///
    /// Returns `true` exactly once per URI for the whole crawl; every later
    /// call for the same URI returns `false`.
    pub fn try_claim(&self, uri: &str) -> bool {
        let mut state = self.state();
        let entry = state
            .visited
            .entry(uri.to_string())
            .or_insert(UriState::Discovered);

        if *entry == UriState::Dispatched {
            return false;
        }
        *entry = UriState::Dispatched;
        true
    }

    /// Waits for the next pending URI
    ///
    /// Suspends until a URI is available or the frontier is closed. Returns
    /// `None` only once the frontier is closed; after closure any URIs still
    /// queued are abandoned.
    pub async fn dequeue(&self) -> Option<Lease> {
        let uri = self
            .wait_for(&self.shared.work, |state| {
                if state.closed {
                    return Some(None);
                }
                let uri = state.queue.pop_front()?;
                state.in_flight += 1;
                Some(Some(uri))
            })
            .await?;

        Some(Lease {
            uri,
            frontier: self.clone(),
        })
    }

    /// Closes the frontier
    ///
    /// Every blocked and future [`Frontier::dequeue`] returns `None`, and
    /// further enqueues are ignored. Returns `true` only for the call that
    /// actually closed it.
    pub fn close(&self) -> bool {
        {
            let mut state = self.state();
            if state.closed {
                return false;
            }
            state.closed = true;
            state.closed_early = !state.is_idle();
        }

        self.shared.changed.notify_waiters();
        self.shared.work.notify_waiters();
        true
    }

    /// Waits until the queue is empty and no task is in flight
    ///
    /// Also returns if the frontier is closed in the meantime.
    pub async fn wait_idle(&self) {
        self.wait_for(&self.shared.changed, |state| {
            (state.closed || state.is_idle()).then_some(())
        })
        .await
    }

    /// Waits until the frontier is closed
    pub async fn closed(&self) {
        self.wait_for(&self.shared.changed, |state| state.closed.then_some(()))
            .await
    }

    /// Closes the frontier as soon as the crawl has drained
    ///
    /// This is the termination watcher: it only fires once nothing is queued
    /// and nothing is in flight, so a momentarily empty queue never ends the
    /// crawl while a task may still discover links.
    pub async fn close_when_idle(&self) -> bool {
        self.wait_idle().await;
        self.close()
    }

    async fn wait_for<T>(
        &self,
        notify: &Notify,
        mut check: impl FnMut(&mut FrontierState) -> Option<T>,
    ) -> T {
        loop {
            let notified = notify.notified();
            tokio::pin!(notified);
            // Register before inspecting state so a notification sent in
            // between is not lost
            notified.as_mut().enable();

            let ready = {
                let mut state = self.state();
                check(&mut *state)
            };
            if let Some(value) = ready {
                return value;
            }

            notified.await;
        }
    }

    /// Returns the recorded state of a URI, if it has been seen
    pub fn state_of(&self, uri: &str) -> Option<UriState> {
        self.state().visited.get(uri).copied()
    }

    pub fn is_closed(&self) -> bool {
        self.state().closed
    }

    /// Whether the frontier was closed while work was still pending
    pub fn closed_early(&self) -> bool {
        self.state().closed_early
    }

    /// Number of distinct URIs seen so far
    pub fn discovered_count(&self) -> usize {
        self.state().visited.len()
    }

    /// Number of distinct URIs claimed for fetching
    pub fn visited_count(&self) -> usize {
        self.state()
            .visited
            .values()
            .filter(|state| **state == UriState::Dispatched)
            .count()
    }

    /// Number of queued occurrences, duplicates included
    pub fn pending_count(&self) -> usize {
        self.state().queue.len()
    }

    pub fn in_flight_count(&self) -> usize {
        self.state().in_flight
    }
}
