// WHY: One event type for everything a turn emits, so a consumer reads a single ordered feed
// Serialized as JSON lines with a `type` tag

use serde::{Deserialize, Serialize};

/// Event emitted by a running turn
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum TurnEvent {
    /// Next piece of the primary text, forwarded as soon as it arrives
    Delta { text: String },
    /// Full redaction set after a merge that added at least one item
    #[serde(rename = "data-redaction")]
    Redaction { items: Vec<String> },
    /// Turn completed: final redaction-applied text and the frozen set
    Finish { redacted_text: String, items: Vec<String> },
}

impl TurnEvent {
    pub fn to_json_line(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
