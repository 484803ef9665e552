// WHY: Paired-delimiter encoding of sensitive spans, shared by the turn driver and the renderer
// Pure and synchronous: no I/O, no shared state beyond the compiled pattern

use anyhow::Result;
use regex_automata::meta::Regex;
use std::ops::Range;

/// Delimiter that opens and closes a sensitive span
pub const DELIMITER: &str = "||";

/// One piece of marker-annotated text
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Span {
    /// Text outside any marker pair
    Plain(String),
    /// Content of a complete `||…||` pair, delimiters stripped
    Marked(String),
    /// Content after an opening delimiter whose closing delimiter has not arrived yet
    Pending(String),
}

impl Span {
    pub fn text(&self) -> &str {
        match self {
            Span::Plain(text) | Span::Marked(text) | Span::Pending(text) => text,
        }
    }

    pub fn is_plain(&self) -> bool {
        matches!(self, Span::Plain(_))
    }
}

/// Cheap check used before doing any parsing work
pub fn contains_marker(text: &str) -> bool {
    text.contains(DELIMITER)
}

/// Encoder/decoder for `||…||` sensitive spans
pub struct MarkerCodec {
    /// Complete pair, non-greedy, non-empty, single line
    pair: Regex,
}

impl MarkerCodec {
    pub fn new() -> Result<Self> {
        let pair = Regex::new(r"\|\|(.+?)\|\|")?;
        Ok(Self { pair })
    }

    /// Wrap every occurrence of every item in `||…||`.
    ///
    /// Items are applied longest first so that an item nested inside a longer one
    /// (a name inside an email address) never splits or double-wraps the longer match.
    /// Only pairs that enclose one of the items count as marked: they are either already
    /// in the text or inserted by this call. A literal `||` elsewhere in the text (a
    /// logical OR in a code snippet) never shields an item. Occurrences touching a
    /// delimiter are left alone, which makes re-applying the same or a larger item set a
    /// no-op for text that is already marked.
    pub fn apply_redactions<S: AsRef<str>>(&self, text: &str, items: impl IntoIterator<Item = S>) -> String {
        let mut sorted: Vec<String> = items
            .into_iter()
            .map(|item| item.as_ref().to_string())
            .filter(|item| is_markable(item))
            .collect();
        sorted.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        sorted.dedup();

        let mut result = text.to_string();
        let mut sealed = item_pairs(&result, &sorted);
        for item in &sorted {
            if result.contains(item.as_str()) {
                (result, sealed) = wrap_unsealed(&result, &sealed, item);
            }
        }
        result
    }

    /// Split marker-annotated text into plain, marked and pending spans, left to right
    pub fn parse_markers(&self, text: &str) -> Vec<Span> {
        let mut spans = Vec::new();
        let mut cursor = 0;

        for pair in self.marked_ranges(text) {
            if pair.start > cursor {
                spans.push(Span::Plain(text[cursor..pair.start].to_string()));
            }
            let content = &text[pair.start + DELIMITER.len()..pair.end - DELIMITER.len()];
            spans.push(Span::Marked(content.to_string()));
            cursor = pair.end;
        }

        let tail = &text[cursor..];
        if tail.is_empty() {
            return spans;
        }

        // An unmatched opener in the tail means the closing delimiter is still streaming in
        match tail.rfind(DELIMITER) {
            Some(open) if open + DELIMITER.len() < tail.len() => {
                if open > 0 {
                    spans.push(Span::Plain(tail[..open].to_string()));
                }
                spans.push(Span::Pending(tail[open + DELIMITER.len()..].to_string()));
            }
            _ => spans.push(Span::Plain(tail.to_string())),
        }

        spans
    }

    /// Byte ranges of complete marker pairs, delimiters included
    fn marked_ranges(&self, text: &str) -> Vec<Range<usize>> {
        self.pair
            .find_iter(text)
            .map(|found| found.start()..found.end())
            .collect()
    }
}

/// Items that can be wrapped without producing ambiguous or unparseable markers
fn is_markable(item: &str) -> bool {
    !item.is_empty() && !item.contains('|') && !item.contains('\n')
}

/// Byte ranges of `||item||` pairs already present in `text`, merged where they share a delimiter
fn item_pairs(text: &str, items: &[String]) -> Vec<Range<usize>> {
    let mut found: Vec<Range<usize>> = Vec::new();
    for item in items {
        let pair = format!("{DELIMITER}{item}{DELIMITER}");
        for (start, _) in text.match_indices(pair.as_str()) {
            found.push(start..start + pair.len());
        }
    }
    found.sort_by_key(|range| range.start);

    let mut merged: Vec<Range<usize>> = Vec::with_capacity(found.len());
    for range in found {
        match merged.last_mut() {
            Some(last) if range.start < last.end => last.end = last.end.max(range.end),
            _ => merged.push(range),
        }
    }
    merged
}

/// Wrap `item` everywhere outside the sealed ranges; returns the new text and its sealed ranges
fn wrap_unsealed(text: &str, sealed: &[Range<usize>], item: &str) -> (String, Vec<Range<usize>>) {
    let mut out = String::with_capacity(text.len() + 2 * DELIMITER.len());
    let mut ranges = Vec::with_capacity(sealed.len() + 1);
    let mut cursor = 0;

    for range in sealed {
        wrap_segment(text, cursor..range.start, item, &mut out, &mut ranges);
        let start = out.len();
        out.push_str(&text[range.clone()]);
        ranges.push(start..out.len());
        cursor = range.end;
    }
    wrap_segment(text, cursor..text.len(), item, &mut out, &mut ranges);

    (out, ranges)
}

/// Wrap occurrences of `item` inside `segment` of `text`, skipping any that touch a delimiter
fn wrap_segment(text: &str, segment: Range<usize>, item: &str, out: &mut String, sealed: &mut Vec<Range<usize>>) {
    let mut last = segment.start;

    for (offset, _) in text[segment.clone()].match_indices(item) {
        let start = segment.start + offset;
        let end = start + item.len();

        let opened = text[..start].ends_with(DELIMITER);
        let closed = text[end..].starts_with(DELIMITER);
        if opened || closed {
            continue;
        }

        out.push_str(&text[last..start]);
        let pair_start = out.len();
        out.push_str(DELIMITER);
        out.push_str(item);
        out.push_str(DELIMITER);
        sealed.push(pair_start..out.len());
        last = end;
    }

    out.push_str(&text[last..segment.end]);
}
