//! Text-generation capability behind fusion, consolidation and reports.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Mutex;
use std::time::Duration;

use serde::Deserialize;

/// A generation call that produced no usable text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationError(pub String);

impl fmt::Display for GenerationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for GenerationError {}

/// A language-model backend taking one instruction prompt.
///
/// Every caller has its own degradation path, so failures here are soft:
/// fusion falls back to a single track, consolidation to a newline join.
/// `Ok` may carry an empty string: the fusion prompt asks for one when
/// neither transcription is coherent, and that answer must reach the caller
/// as a result, not a failure.
pub trait TextGenerator: Send + Sync {
    fn generate(&self, prompt: &str) -> std::result::Result<String, GenerationError>;
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: String,
}

/// OpenAI-style chat-completions client.
pub struct ChatCompletionGenerator {
    client: reqwest::blocking::Client,
    url: String,
    api_key: Option<String>,
    model: String,
}

impl ChatCompletionGenerator {
    pub fn new(url: &str, api_key: Option<String>, model: &str, timeout: Duration) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();
        Self {
            client,
            url: url.to_string(),
            api_key,
            model: model.to_string(),
        }
    }
}

impl TextGenerator for ChatCompletionGenerator {
    fn generate(&self, prompt: &str) -> std::result::Result<String, GenerationError> {
        let body = serde_json::json!({
            "model": self.model,
            "messages": [{"role": "system", "content": prompt}],
            "temperature": 0.3,
            "max_tokens": 2000,
        });

        let mut request = self.client.post(&self.url).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .map_err(|e| GenerationError(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(GenerationError(format!("HTTP {}", status)));
        }

        let parsed: ChatResponse = response
            .json()
            .map_err(|e| GenerationError(e.to_string()))?;
        extract_content(parsed)
    }
}

/// An empty completion is a valid answer; only a response with no choice
/// at all is a failure.
fn extract_content(parsed: ChatResponse) -> std::result::Result<String, GenerationError> {
    match parsed.choices.into_iter().next() {
        Some(choice) => Ok(choice.message.content.trim().to_string()),
        None => Err(GenerationError("no completion choices".to_string())),
    }
}

/// Scripted generator for tests: pops one outcome per call and records
/// the prompts it received.
#[derive(Default)]
pub struct MockGenerator {
    outcomes: Mutex<VecDeque<std::result::Result<String, GenerationError>>>,
    prompts: Mutex<Vec<String>>,
}

impl MockGenerator {
    pub fn new(outcomes: Vec<std::result::Result<String, GenerationError>>) -> Self {
        Self {
            outcomes: Mutex::new(outcomes.into()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// A generator that always fails.
    pub fn failing() -> Self {
        Self::new(vec![])
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.prompts.lock().map(|p| p.len()).unwrap_or(0)
    }
}

impl TextGenerator for MockGenerator {
    fn generate(&self, prompt: &str) -> std::result::Result<String, GenerationError> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }
        match self.outcomes.lock() {
            Ok(mut outcomes) => outcomes
                .pop_front()
                .unwrap_or_else(|| Err(GenerationError("exhausted".to_string()))),
            Err(_) => Err(GenerationError("poisoned".to_string())),
        }
    }
}
