// Integration test utilities and common code
// WHY: Scripted detectors and delta streams are shared by every turn-level test

#![allow(dead_code)]

use anyhow::{bail, Result};
use async_trait::async_trait;
use futures::stream::{self, Stream};
use shroud::{Detector, TurnEvent};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;

/// Detector that answers by substring: every rule whose trigger appears in the chunk
/// contributes its items. Chunks containing a failure trigger return an error.
#[derive(Default)]
pub struct ScriptedDetector {
    rules: Vec<(String, Vec<String>)>,
    failures: Vec<String>,
    delay: Duration,
    calls: AtomicUsize,
}

impl ScriptedDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(mut self, trigger: &str, items: &[&str]) -> Self {
        self.rules
            .push((trigger.to_string(), items.iter().map(|item| item.to_string()).collect()));
        self
    }

    pub fn fail_on(mut self, trigger: &str) -> Self {
        self.failures.push(trigger.to_string());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Detector for ScriptedDetector {
    async fn detect(&self, text: &str) -> Result<Vec<String>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.failures.iter().any(|trigger| text.contains(trigger.as_str())) {
            bail!("scripted failure");
        }
        Ok(self
            .rules
            .iter()
            .filter(|(trigger, _)| text.contains(trigger.as_str()))
            .flat_map(|(_, items)| items.iter().cloned())
            .collect())
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// Stream the given deltas as-is
pub fn delta_stream(parts: &[&str]) -> impl Stream<Item = String> {
    stream::iter(parts.iter().map(|part| part.to_string()).collect::<Vec<_>>())
}

/// Drain every event left on a closed channel
pub async fn collect_events(mut rx: mpsc::UnboundedReceiver<TurnEvent>) -> Vec<TurnEvent> {
    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        events.push(event);
    }
    events
}

/// Concatenated text of every delta event
pub fn streamed_text(events: &[TurnEvent]) -> String {
    events
        .iter()
        .filter_map(|event| match event {
            TurnEvent::Delta { text } => Some(text.as_str()),
            _ => None,
        })
        .collect()
}
