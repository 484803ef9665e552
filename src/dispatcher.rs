// WHY: Fans detection out per chunk without ever holding up the primary text stream
// Failures stay inside the task that hit them; join() is the only place anything waits

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::chunker::Chunk;
use crate::detector::Detector;
use crate::events::TurnEvent;
use crate::redaction_set::{RedactionSet, RedactionSetFrozen};

/// Configuration for detection fan-out
#[derive(Debug, Clone)]
pub struct DispatchConfig {
    /// Upper bound on detection calls running at the same time
    pub max_in_flight: usize,
    /// A call still running after this long counts as a failure
    pub detect_timeout: Duration,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            max_in_flight: 8,
            detect_timeout: Duration::from_secs(30),
        }
    }
}

/// Live counters shared by all detection tasks of a turn
#[derive(Debug, Default)]
pub struct DetectionCounters {
    dispatched: AtomicU64,
    succeeded: AtomicU64,
    failed: AtomicU64,
    timed_out: AtomicU64,
    discarded_items: AtomicU64,
    added_items: AtomicU64,
}

impl DetectionCounters {
    pub fn snapshot(&self) -> DetectionStats {
        DetectionStats {
            dispatched: self.dispatched.load(Ordering::Relaxed),
            succeeded: self.succeeded.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            timed_out: self.timed_out.load(Ordering::Relaxed),
            discarded_items: self.discarded_items.load(Ordering::Relaxed),
            added_items: self.added_items.load(Ordering::Relaxed),
        }
    }
}

/// Per-turn detection statistics
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct DetectionStats {
    /// Detection calls started
    pub dispatched: u64,
    /// Calls that returned a parseable result
    pub succeeded: u64,
    /// Calls that returned an error (transport, status, parse) or whose task died
    pub failed: u64,
    /// Calls abandoned after the per-call timeout
    pub timed_out: u64,
    /// Returned items dropped because they do not occur in the chunk
    pub discarded_items: u64,
    /// Items that were new to the redaction set
    pub added_items: u64,
}

/// Dispatches one detection call per chunk and merges results into the turn's redaction set
pub struct DetectionDispatcher {
    detector: Arc<dyn Detector>,
    redactions: RedactionSet,
    counters: Arc<DetectionCounters>,
    permits: Arc<Semaphore>,
    timeout: Duration,
    events: Option<mpsc::UnboundedSender<TurnEvent>>,
    pending: JoinSet<()>,
}

impl DetectionDispatcher {
    pub fn new(
        detector: Arc<dyn Detector>,
        redactions: RedactionSet,
        counters: Arc<DetectionCounters>,
        config: &DispatchConfig,
    ) -> Self {
        Self {
            detector,
            redactions,
            counters,
            permits: Arc::new(Semaphore::new(config.max_in_flight.max(1))),
            timeout: config.detect_timeout,
            events: None,
            pending: JoinSet::new(),
        }
    }

    /// Publish a [`TurnEvent::Redaction`] snapshot after every successful detection call
    pub fn with_events(mut self, events: mpsc::UnboundedSender<TurnEvent>) -> Self {
        self.events = Some(events);
        self
    }

    /// Start detection for a chunk and return immediately.
    ///
    /// The task waits for a concurrency permit itself, so this never blocks the caller.
    pub fn dispatch(&mut self, chunk: Chunk) {
        let index = self.counters.dispatched.fetch_add(1, Ordering::Relaxed);
        debug!(index, chars = chunk.char_count(), "Dispatching detection");

        let job = DetectionJob {
            index,
            chunk,
            detector: Arc::clone(&self.detector),
            redactions: self.redactions.clone(),
            counters: Arc::clone(&self.counters),
            permits: Arc::clone(&self.permits),
            timeout: self.timeout,
            events: self.events.clone(),
        };
        self.pending.spawn(job.run());
    }

    /// Detection calls dispatched but not yet joined
    pub fn in_flight(&self) -> usize {
        self.pending.len()
    }

    /// Wait for every dispatched call of the turn to finish, successfully or not
    pub async fn join(&mut self) {
        let outstanding = self.pending.len();
        let start_time = Instant::now();

        while let Some(result) = self.pending.join_next().await {
            if let Err(e) = result {
                self.counters.failed.fetch_add(1, Ordering::Relaxed);
                warn!("Detection task did not complete: {}", e);
            }
        }

        info!(
            outstanding,
            waited_ms = start_time.elapsed().as_millis() as u64,
            "All detection calls settled"
        );
    }

    pub fn stats(&self) -> DetectionStats {
        self.counters.snapshot()
    }
}

/// Everything one spawned detection call owns
struct DetectionJob {
    index: u64,
    chunk: Chunk,
    detector: Arc<dyn Detector>,
    redactions: RedactionSet,
    counters: Arc<DetectionCounters>,
    permits: Arc<Semaphore>,
    timeout: Duration,
    events: Option<mpsc::UnboundedSender<TurnEvent>>,
}

impl DetectionJob {
    async fn run(self) {
        // The semaphore is never closed, so acquisition only fails if that changes
        let Ok(_permit) = Arc::clone(&self.permits).acquire_owned().await else {
            self.counters.failed.fetch_add(1, Ordering::Relaxed);
            return;
        };

        let start_time = Instant::now();
        let outcome = tokio::time::timeout(self.timeout, self.detector.detect(self.chunk.as_str())).await;

        match outcome {
            Ok(Ok(found)) => {
                self.counters.succeeded.fetch_add(1, Ordering::Relaxed);
                debug!(
                    index = self.index,
                    detector = self.detector.name(),
                    elapsed_ms = start_time.elapsed().as_millis() as u64,
                    returned = found.len(),
                    "Detection succeeded"
                );
                self.merge(found);
            }
            Ok(Err(e)) => {
                self.counters.failed.fetch_add(1, Ordering::Relaxed);
                warn!(index = self.index, detector = self.detector.name(), "Detection failed, chunk dropped: {:#}", e);
            }
            Err(_) => {
                self.counters.timed_out.fetch_add(1, Ordering::Relaxed);
                warn!(
                    index = self.index,
                    detector = self.detector.name(),
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Detection timed out, chunk dropped"
                );
            }
        }
    }

    /// Merge the guarded items and publish the merged set, even when nothing was new
    fn merge(&self, found: Vec<String>) {
        let text = self.chunk.as_str();
        let (kept, discarded): (Vec<String>, Vec<String>) = found
            .into_iter()
            .partition(|item| !item.is_empty() && text.contains(item.as_str()));

        if !discarded.is_empty() {
            self.counters.discarded_items.fetch_add(discarded.len() as u64, Ordering::Relaxed);
            debug!(index = self.index, ?discarded, "Discarded items not present in chunk");
        }

        // Sending under the set's write lock keeps snapshots in merge order across tasks
        match self.redactions.try_merge(kept, |items| self.publish(items)) {
            Ok(added) => {
                self.counters.added_items.fetch_add(added as u64, Ordering::Relaxed);
            }
            Err(RedactionSetFrozen) => {
                warn!(index = self.index, "Detection finished after the turn completed, result dropped");
            }
        }
    }

    fn publish(&self, items: &BTreeSet<String>) {
        let Some(ref events) = self.events else {
            return;
        };
        let items = items.iter().cloned().collect();
        if events.send(TurnEvent::Redaction { items }).is_err() {
            debug!("Event receiver dropped, redaction update not delivered");
        }
    }
}
