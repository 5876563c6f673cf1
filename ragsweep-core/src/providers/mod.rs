//! Chat-completion providers.
//!
//! Generation, query rewriting and judging all go through a single blocking
//! `ChatModel::complete` call. Concrete implementations:
//! - `OpenAiCompatibleProvider`: OpenAI, Ollama (`/v1`), vLLM, LM Studio, MLX servers
//! - `MockChatModel`: scripted responses for tests and dry runs

pub mod mock;
pub mod openai_compat;

use crate::error::ProviderError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub use mock::MockChatModel;
pub use openai_compat::OpenAiCompatibleProvider;

/// Role of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A single chat message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// A completion request. `model: None` uses the provider's default model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    pub model: Option<String>,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
    pub top_p: Option<f32>,
}

impl ChatRequest {
    pub fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            model: None,
            temperature: 0.0,
            max_tokens: None,
            top_p: None,
        }
    }

    pub fn with_model(mut self, model: Option<String>) -> Self {
        self.model = model;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_top_p(mut self, top_p: f32) -> Self {
        self.top_p = Some(top_p);
        self
    }
}

/// Trait for blocking chat-completion backends.
pub trait ChatModel: Send + Sync {
    /// Run one completion and return the assistant text.
    fn complete(&self, request: &ChatRequest) -> Result<String, ProviderError>;

    /// Return the default model name.
    fn model_name(&self) -> &str;
}

/// Build a blocking HTTP client. `timeout: None` disables the request timeout.
pub(crate) fn build_http_client(
    provider: &str,
    timeout: Option<Duration>,
) -> Result<reqwest::blocking::Client, ProviderError> {
    reqwest::blocking::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| ProviderError::Request {
            provider: provider.to_string(),
            message: format!("failed to build HTTP client: {e}"),
        })
}

/// Read a response body, mapping non-2xx statuses to `ProviderError::Status`.
pub(crate) fn check_status(
    provider: &str,
    response: reqwest::blocking::Response,
) -> Result<String, ProviderError> {
    let status = response.status();
    let body = response.text().map_err(|e| ProviderError::Request {
        provider: provider.to_string(),
        message: format!("failed to read response body: {e}"),
    })?;
    if !status.is_success() {
        return Err(ProviderError::Status {
            provider: provider.to_string(),
            code: status.as_u16(),
            body: body.chars().take(500).collect(),
        });
    }
    Ok(body)
}

/// Read an API key from the named environment variable, ignoring blanks.
pub fn resolve_api_key(env_var: &str) -> Option<String> {
    std::env::var(env_var)
        .ok()
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty())
}
