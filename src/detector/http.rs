// WHY: Model-backed detection over an OpenAI-compatible chat completions endpoint
// Catches names and addresses that have no fixed shape; output is parsed leniently

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, info};

use super::{parse_detection_response, Detector};

const SYSTEM_PROMPT: &str = "You are a PII detector. Given text, find all personally identifiable information (emails, phones, SSNs, names, addresses, credit cards, IPs, dates of birth, etc).
Return a JSON array of the exact PII substrings found in the text.
If no PII found, return [].
Return ONLY the JSON array, no explanation.";

/// Configuration for the chat-completions detector
#[derive(Debug, Clone)]
pub struct HttpDetectorConfig {
    /// Full URL of the chat completions endpoint
    pub endpoint: String,
    pub model: String,
    /// Bearer token; requests are sent unauthenticated when absent
    pub api_key: Option<String>,
    /// Transport-level timeout for one request
    pub request_timeout: Duration,
}

impl Default for HttpDetectorConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com/v1/chat/completions".to_string(),
            model: "gpt-4.1-mini".to_string(),
            api_key: None,
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl HttpDetectorConfig {
    /// Default configuration with the API key taken from `OPENAI_API_KEY`
    pub fn from_env() -> Self {
        Self {
            api_key: std::env::var("OPENAI_API_KEY").ok().filter(|key| !key.is_empty()),
            ..Self::default()
        }
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Deserialize)]
struct ChatReply {
    content: Option<String>,
}

/// Detector that asks a language model for the PII substrings of a chunk
pub struct HttpDetector {
    client: reqwest::Client,
    config: HttpDetectorConfig,
}

impl HttpDetector {
    pub fn new(config: HttpDetectorConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self { client, config })
    }

    fn request_body<'a>(&'a self, text: &'a str) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.config.model,
            messages: [
                ChatMessage { role: "system", content: SYSTEM_PROMPT },
                ChatMessage { role: "user", content: text },
            ],
            temperature: 0.0,
        }
    }
}

#[async_trait]
impl Detector for HttpDetector {
    async fn detect(&self, text: &str) -> Result<Vec<String>> {
        let preview: String = text.chars().take(80).collect();
        debug!(chars = text.chars().count(), preview = %preview, "Requesting PII detection");
        let start_time = Instant::now();

        let mut request = self
            .client
            .post(&self.config.endpoint)
            .json(&self.request_body(text));
        if let Some(ref key) = self.config.api_key {
            request = request.bearer_auth(key);
        }

        let response: ChatResponse = request
            .send()
            .await
            .context("detection request failed")?
            .error_for_status()
            .context("detection endpoint returned an error status")?
            .json()
            .await
            .context("detection response body is not a chat completion")?;

        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| anyhow!("detection response has no message content"))?;

        let items = parse_detection_response(&content)?;
        info!(
            elapsed_ms = start_time.elapsed().as_millis() as u64,
            items = items.len(),
            "Detection model responded"
        );
        Ok(items)
    }

    fn name(&self) -> &str {
        "http"
    }
}
