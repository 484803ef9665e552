// WHY: Offline detector for contact details and identifiers that have a fixed shape
// Names and addresses need a model; this covers the rest without a network call

use anyhow::Result;
use async_trait::async_trait;
use regex_automata::meta::Regex;
use std::collections::BTreeSet;
use tracing::debug;

use super::Detector;

/// Regex-backed detector for emails, phone numbers, SSNs, IPv4 addresses and card numbers
pub struct PatternDetector {
    patterns: Vec<(&'static str, Regex)>,
}

impl PatternDetector {
    pub fn new() -> Result<Self> {
        let sources: [(&'static str, &str); 5] = [
            ("email", r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}"),
            ("ssn", r"\b\d{3}-\d{2}-\d{4}\b"),
            ("card", r"\b(?:\d{4}[ -]?){3}\d{4}\b"),
            ("ipv4", r"\b(?:\d{1,3}\.){3}\d{1,3}\b"),
            ("phone", r"(?:\+\d{1,2}[ .-]?)?(?:\(\d{3}\)[ .-]?|\b\d{3}[ .-])?\b\d{3}[ .-]\d{4}\b"),
        ];

        let mut patterns = Vec::with_capacity(sources.len());
        for (kind, source) in sources {
            patterns.push((kind, Regex::new(source)?));
        }
        Ok(Self { patterns })
    }

    /// Synchronous core of [`Detector::detect`]
    pub fn find_all(&self, text: &str) -> Vec<String> {
        let mut found = BTreeSet::new();
        for (kind, pattern) in &self.patterns {
            for hit in pattern.find_iter(text) {
                let item = &text[hit.start()..hit.end()];
                debug!(kind, item, "Pattern match");
                found.insert(item.to_string());
            }
        }
        found.into_iter().collect()
    }
}

#[async_trait]
impl Detector for PatternDetector {
    async fn detect(&self, text: &str) -> Result<Vec<String>> {
        Ok(self.find_all(text))
    }

    fn name(&self) -> &str {
        "pattern"
    }
}
