//! LLM Client: the single point of entry for all completion calls.
//!
//! No other module may call the completion API directly. The pipeline talks to
//! `dyn CompletionBackend`; `LlmClient` is the production backend, speaking the
//! OpenAI-compatible chat-completions protocol.
//!
//! No retries: a failed call is returned to the caller as-is.
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::config::GenerationParams;

#[cfg(test)]
pub mod stub;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("completion request timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("unexpected completion payload: {0}")]
    Decode(String),

    #[error("LLM returned empty content")]
    EmptyContent,
}

/// Capability to turn a prompt into raw completion text.
///
/// Carried in `AppState` as `Arc<dyn CompletionBackend>` so tests can swap in a stub.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError>;
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    pub choices: Vec<Choice>,
    #[serde(default)]
    pub usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
pub struct Choice {
    pub message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
pub struct ChoiceMessage {
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

impl ChatResponse {
    /// Trimmed text of the first choice, if it has any.
    pub fn text(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|c| c.message.content.as_deref())
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// Chat-completions client. The whole request, body included, runs under `timeout`.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    api_key: String,
    endpoint: String,
    params: GenerationParams,
    timeout: Duration,
}

impl LlmClient {
    pub fn new(
        api_key: String,
        base_url: &str,
        params: GenerationParams,
        timeout: Duration,
    ) -> Result<Self, LlmError> {
        Ok(Self {
            client: Client::builder().build()?,
            api_key,
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            params,
            timeout,
        })
    }

    pub fn model(&self) -> &str {
        &self.params.model
    }

    /// Makes a single raw call, returning the full response object.
    pub async fn call(&self, prompt: &str) -> Result<ChatResponse, LlmError> {
        let started = Instant::now();
        let response = tokio::time::timeout(self.timeout, self.send(prompt))
            .await
            .map_err(|_| LlmError::Timeout(self.timeout))??;

        if let Some(usage) = &response.usage {
            debug!(
                "LLM call succeeded in {}ms: prompt_tokens={}, completion_tokens={}",
                started.elapsed().as_millis(),
                usage.prompt_tokens,
                usage.completion_tokens
            );
        }

        Ok(response)
    }

    async fn send(&self, prompt: &str) -> Result<ChatResponse, LlmError> {
        let request_body = ChatRequest {
            model: &self.params.model,
            messages: vec![ChatMessage {
                role: "system",
                content: prompt,
            }],
            max_tokens: self.params.max_tokens,
            temperature: self.params.temperature,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ApiErrorEnvelope>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_str(&body).map_err(|e| LlmError::Decode(e.to_string()))
    }
}

#[async_trait]
impl CompletionBackend for LlmClient {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        let response = self.call(prompt).await?;
        response
            .text()
            .map(str::to_string)
            .ok_or(LlmError::EmptyContent)
    }
}
