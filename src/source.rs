// WHY: Stand-in for the generation call: replays stored text as a paced stream of deltas
// Lets the CLI and tests drive a turn exactly as a live model stream would

use anyhow::{Context, Result};
use futures::stream::{self, Stream, StreamExt};
use std::path::Path;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tracing::{debug, info};

/// Configuration for delta replay
#[derive(Debug, Clone)]
pub struct DeltaReaderConfig {
    /// Words carried by each delta (trailing whitespace stays with its word)
    pub words_per_delta: usize,
    /// Pause before each delta; zero replays as fast as the consumer reads
    pub delay: Duration,
}

impl Default for DeltaReaderConfig {
    fn default() -> Self {
        Self {
            words_per_delta: 1,
            delay: Duration::ZERO,
        }
    }
}

/// Split text into deltas of `words_per_delta` words each.
///
/// Concatenating the result always reproduces `text` exactly.
pub fn split_into_deltas(text: &str, words_per_delta: usize) -> Vec<String> {
    let words_per_delta = words_per_delta.max(1);
    let mut deltas = Vec::new();
    let mut start = 0;
    let mut words = 0;
    let mut in_space = false;

    for (idx, ch) in text.char_indices() {
        if ch.is_whitespace() {
            in_space = true;
        } else if in_space {
            in_space = false;
            words += 1;
            if words == words_per_delta {
                deltas.push(text[start..idx].to_string());
                start = idx;
                words = 0;
            }
        }
    }

    if start < text.len() {
        deltas.push(text[start..].to_string());
    }
    deltas
}

/// Replay text as a delta stream
pub fn replay(text: &str, config: &DeltaReaderConfig) -> impl Stream<Item = String> {
    let delay = config.delay;
    stream::iter(split_into_deltas(text, config.words_per_delta)).then(move |delta| async move {
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        delta
    })
}

/// Read a file (or stdin for `-`) and replay it as a delta stream
pub async fn read_deltas<P: AsRef<Path>>(
    input: P,
    config: &DeltaReaderConfig,
) -> Result<impl Stream<Item = String>> {
    let path = input.as_ref();
    let text = if path == Path::new("-") {
        debug!("Reading generation text from stdin");
        let mut text = String::new();
        tokio::io::stdin()
            .read_to_string(&mut text)
            .await
            .context("failed to read stdin")?;
        text
    } else {
        debug!("Reading generation text from {}", path.display());
        tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read {}", path.display()))?
    };

    info!(
        chars = text.chars().count(),
        words_per_delta = config.words_per_delta,
        delay_ms = config.delay.as_millis() as u64,
        "Replaying generation text"
    );
    Ok(replay(&text, config))
}
