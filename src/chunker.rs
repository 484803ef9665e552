// WHY: Cuts the live delta stream into sentence-sized units of detection work
// Never calls the detector itself; the dispatcher decides what to do with each chunk

use anyhow::Result;
use regex_automata::meta::Regex;
use std::fmt;
use tracing::debug;

/// Configuration for chunk boundary policy
#[derive(Debug, Clone)]
pub struct ChunkerConfig {
    /// Minimum characters a chunk must reach before a boundary may cut it
    pub min_chunk_chars: usize,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            // WHY: below this a detection call per short clause costs more than the latency it saves
            min_chunk_chars: 40,
        }
    }
}

/// Immutable slice of generated text handed to the detector as one unit
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Chunk(String);

impl Chunk {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// Length in characters, the unit `min_chunk_chars` is measured in
    pub fn char_count(&self) -> usize {
        self.0.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AsRef<str> for Chunk {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Chunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Buffers text deltas and yields chunks at sentence boundaries
pub struct SentenceChunker {
    config: ChunkerConfig,
    /// `.`, `!` or `?` followed by whitespace, or a bare newline
    boundary: Regex,
    buffer: String,
    /// Byte offset in `buffer` where the next boundary search resumes
    scan_from: usize,
    /// Characters in `buffer[..scan_from]`
    scanned_chars: usize,
    emitted: usize,
}

impl SentenceChunker {
    pub fn new(config: ChunkerConfig) -> Result<Self> {
        let boundary = Regex::new(r"[.!?]\s|\n")?;
        Ok(Self {
            config,
            boundary,
            buffer: String::new(),
            scan_from: 0,
            scanned_chars: 0,
            emitted: 0,
        })
    }

    pub fn with_default_config() -> Result<Self> {
        Self::new(ChunkerConfig::default())
    }

    /// Append a delta and return every chunk that became complete
    pub fn feed(&mut self, delta: &str) -> Vec<Chunk> {
        self.buffer.push_str(delta);

        let mut chunks = Vec::new();
        while let Some(end) = self.next_cut() {
            let rest = self.buffer.split_off(end);
            let text = std::mem::replace(&mut self.buffer, rest);
            chunks.push(self.emit(text));
        }
        chunks
    }

    /// Emit whatever is left at end-of-stream, unless it is empty or only whitespace
    pub fn flush(&mut self) -> Option<Chunk> {
        let text = std::mem::take(&mut self.buffer);
        self.scan_from = 0;
        self.scanned_chars = 0;
        if text.trim().is_empty() {
            return None;
        }
        Some(self.emit(text))
    }

    /// Text received but not yet emitted
    pub fn buffered(&self) -> &str {
        &self.buffer
    }

    /// Number of chunks emitted so far
    pub fn emitted(&self) -> usize {
        self.emitted
    }

    /// Byte offset just past the first boundary whose prefix meets the minimum length.
    ///
    /// Text already searched is not searched again; only a trailing terminator still
    /// waiting for its whitespace is revisited on the next feed.
    fn next_cut(&mut self) -> Option<usize> {
        let start = self.scan_from;
        let mut counted_to = start;
        let mut chars = self.scanned_chars;

        for found in self.boundary.find_iter(&self.buffer[start..]) {
            let end = start + found.end();
            chars += self.buffer[counted_to..end].chars().count();
            counted_to = end;

            if chars >= self.config.min_chunk_chars {
                self.scan_from = 0;
                self.scanned_chars = 0;
                return Some(end);
            }
        }

        let mut resume = self.buffer.len();
        if self.buffer[counted_to..].ends_with(|c: char| matches!(c, '.' | '!' | '?')) {
            resume -= 1;
        }
        self.scanned_chars = chars + self.buffer[counted_to..resume].chars().count();
        self.scan_from = resume;
        None
    }

    fn emit(&mut self, text: String) -> Chunk {
        self.emitted += 1;
        debug!(index = self.emitted - 1, chars = text.chars().count(), "Chunk ready for detection");
        Chunk(text)
    }
}
