// WHY: The detection call is an external collaborator; this is the seam the dispatcher calls through
// Implementations may be slow, may fail and may return strings that are not in the text

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use serde_json::Value;

pub mod http;
pub mod pattern;

pub use http::{HttpDetector, HttpDetectorConfig};
pub use pattern::PatternDetector;

/// Finds PII substrings in a piece of text
#[async_trait]
pub trait Detector: Send + Sync {
    /// Return the substrings of `text` believed to be PII.
    ///
    /// Results are not trusted: the dispatcher discards anything that does not occur
    /// verbatim in `text`.
    async fn detect(&self, text: &str) -> Result<Vec<String>>;

    /// Short name used in logs
    fn name(&self) -> &str {
        "detector"
    }
}

/// Extract the string items of the JSON array embedded in a model reply.
///
/// Models often wrap the array in prose or code fences, so everything between the
/// first `[` and the last `]` is parsed. Non-string elements are skipped.
pub fn parse_detection_response(response: &str) -> Result<Vec<String>> {
    let start = response
        .find('[')
        .ok_or_else(|| anyhow!("no JSON array in detector response"))?;
    let end = response
        .rfind(']')
        .filter(|&end| end > start)
        .ok_or_else(|| anyhow!("unterminated JSON array in detector response"))?;

    let value: Value = serde_json::from_str(&response[start..=end])
        .context("detector response array is not valid JSON")?;

    let Value::Array(elements) = value else {
        bail!("detector response is not a JSON array");
    };

    Ok(elements
        .into_iter()
        .filter_map(|element| match element {
            Value::String(item) => Some(item),
            _ => None,
        })
        .collect())
}
