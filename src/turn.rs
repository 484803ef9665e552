// WHY: Drives one generation turn end to end: forward, chunk, dispatch, join, freeze, apply
// Holds the per-turn context so nothing about a turn lives in global state

use anyhow::Result;
use futures::stream::{Stream, StreamExt};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::chunker::{ChunkerConfig, SentenceChunker};
use crate::detector::Detector;
use crate::dispatcher::{DetectionCounters, DetectionDispatcher, DetectionStats, DispatchConfig};
use crate::events::TurnEvent;
use crate::marker::MarkerCodec;
use crate::redaction_set::RedactionSet;

/// Configuration for one turn
#[derive(Debug, Clone, Default)]
pub struct TurnConfig {
    pub chunker: ChunkerConfig,
    pub dispatch: DispatchConfig,
}

/// State scoped to a single generation turn, created at turn start
#[derive(Debug, Clone)]
pub struct TurnContext {
    config: TurnConfig,
    redactions: RedactionSet,
    counters: Arc<DetectionCounters>,
}

impl TurnContext {
    pub fn new(config: TurnConfig) -> Self {
        Self {
            config,
            redactions: RedactionSet::new(),
            counters: Arc::new(DetectionCounters::default()),
        }
    }

    pub fn config(&self) -> &TurnConfig {
        &self.config
    }

    /// The turn's redaction set; clones observe every merge
    pub fn redactions(&self) -> &RedactionSet {
        &self.redactions
    }

    pub fn stats(&self) -> DetectionStats {
        self.counters.snapshot()
    }

    pub fn chunker(&self) -> Result<SentenceChunker> {
        SentenceChunker::new(self.config.chunker.clone())
    }

    pub fn dispatcher(&self, detector: Arc<dyn Detector>) -> DetectionDispatcher {
        DetectionDispatcher::new(
            detector,
            self.redactions.clone(),
            Arc::clone(&self.counters),
            &self.config.dispatch,
        )
    }
}

/// Result of a completed turn
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    /// Raw generated text, exactly as streamed
    pub text: String,
    /// Text with every frozen redaction item wrapped in markers
    pub redacted_text: String,
    /// Frozen redaction set
    pub items: BTreeSet<String>,
    pub stats: DetectionStats,
}

/// Run one turn over a stream of text deltas.
///
/// Every delta is forwarded as [`TurnEvent::Delta`] before it is chunked, so detection
/// never delays the primary text. Redaction updates arrive on the same channel as
/// detection calls complete. Returns once the stream has ended and every dispatched
/// detection call has settled; the redaction set is frozen at that point.
pub async fn run_turn<S>(
    deltas: S,
    detector: Arc<dyn Detector>,
    context: TurnContext,
    events: mpsc::UnboundedSender<TurnEvent>,
) -> Result<TurnOutcome>
where
    S: Stream<Item = String>,
{
    let start_time = Instant::now();
    let codec = MarkerCodec::new()?;
    let mut chunker = context.chunker()?;
    let mut dispatcher = context.dispatcher(detector).with_events(events.clone());

    info!(
        min_chunk_chars = context.config.chunker.min_chunk_chars,
        max_in_flight = context.config.dispatch.max_in_flight,
        "Turn started"
    );

    let mut text = String::new();
    let mut delta_count = 0u64;
    futures::pin_mut!(deltas);

    while let Some(delta) = deltas.next().await {
        if delta.is_empty() {
            continue;
        }
        delta_count += 1;

        if events.send(TurnEvent::Delta { text: delta.clone() }).is_err() {
            debug!("Event receiver dropped, continuing turn without a live consumer");
        }
        text.push_str(&delta);

        for chunk in chunker.feed(&delta) {
            dispatcher.dispatch(chunk);
        }
    }

    if let Some(chunk) = chunker.flush() {
        dispatcher.dispatch(chunk);
    }

    dispatcher.join().await;
    let items = context.redactions.freeze();
    let redacted_text = codec.apply_redactions(&text, &items);
    let stats = dispatcher.stats();

    let finish = TurnEvent::Finish {
        redacted_text: redacted_text.clone(),
        items: items.iter().cloned().collect(),
    };
    if events.send(finish).is_err() {
        debug!("Event receiver dropped, finish event not delivered");
    }

    info!(
        deltas = delta_count,
        chars = text.chars().count(),
        chunks = chunker.emitted(),
        items = items.len(),
        failed = stats.failed,
        timed_out = stats.timed_out,
        elapsed_ms = start_time.elapsed().as_millis() as u64,
        "Turn completed"
    );

    Ok(TurnOutcome {
        text,
        redacted_text,
        items,
        stats,
    })
}
