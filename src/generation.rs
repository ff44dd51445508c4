// ABOUTME: Generation client module for the quickdeck application
// ABOUTME: Wraps the Groq chat-completions API behind the TextGenerator trait

use crate::errors::{DeckError, Result};
use log::{debug, info};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Model used when the caller supplies an empty model name.
pub const DEFAULT_MODEL: &str = "llama-3.3-70b-versatile";

/// Fixed instruction biasing output toward structured slide content.
const SYSTEM_PROMPT: &str =
    "You are a helpful assistant that generates structured slide content.";

const GROQ_ENDPOINT: &str = "https://api.groq.com/openai/v1/chat/completions";

/// Sampling temperature; low to favor deterministic structure over creativity.
const TEMPERATURE: f32 = 0.4;

/// Something that can turn a prompt into generated text.
pub trait TextGenerator {
    fn generate(&self, prompt: &str) -> Result<String>;
}

/// Blocking client for the Groq chat-completions API.
pub struct GroqClient {
    api_key: String,
    model: String,
    endpoint: String,
    timeout: Duration,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
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
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

impl GroqClient {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            endpoint: GROQ_ENDPOINT.to_string(),
            timeout: Duration::from_secs(120),
        }
    }

    /// Point the client at a different endpoint (used by tests).
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    fn effective_model(&self) -> &str {
        if self.model.trim().is_empty() {
            DEFAULT_MODEL
        } else {
            &self.model
        }
    }
}

impl TextGenerator for GroqClient {
    /// Send one blocking chat-completion request and return the trimmed
    /// message content. Upstream failures (network, auth, quota) surface as
    /// `ProviderError` with no retry.
    fn generate(&self, prompt: &str) -> Result<String> {
        let model = self.effective_model();
        info!("Requesting outline from model {}", model);

        let client = Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(DeckError::HttpError)?;

        let body = ChatRequest {
            model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            temperature: TEMPERATURE,
        };

        let response = client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .map_err(|e| DeckError::ProviderError(format!("Request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().unwrap_or_default();
            return Err(DeckError::ProviderError(format!(
                "API returned {}: {}",
                status, detail
            )));
        }

        let parsed: ChatResponse = response
            .json()
            .map_err(|e| DeckError::ProviderError(format!("Malformed response: {}", e)))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content.trim().to_string())
            .ok_or_else(|| DeckError::ProviderError("Response contained no choices".to_string()))?;

        debug!("Model returned {} characters", content.len());
        Ok(content)
    }
}
