// WHY: The stored form of a finished turn: redaction is baked into the text
// Only the redaction-applied text is kept, never the item list

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::fs;

use crate::turn::TurnOutcome;

/// Persisted assistant message for one completed turn
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct TurnRecord {
    pub id: String,
    pub role: String,
    /// Redaction-applied text
    pub text: String,
    /// Seconds since the Unix epoch
    pub created_at: u64,
}

impl TurnRecord {
    pub fn from_outcome(id: impl Into<String>, outcome: &TurnOutcome) -> Self {
        Self {
            id: id.into(),
            role: "assistant".to_string(),
            text: outcome.redacted_text.clone(),
            created_at: unix_now(),
        }
    }

    pub async fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        fs::write(path, content)
            .await
            .with_context(|| format!("failed to write turn record {}", path.display()))
    }

    pub async fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read turn record {}", path.display()))?;
        Ok(serde_json::from_str(&content)?)
    }
}

/// Seconds since the Unix epoch, zero if the clock is before it
pub fn unix_now() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::SystemTime::UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or(0)
}
