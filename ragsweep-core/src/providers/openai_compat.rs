//! OpenAI-compatible chat-completion provider.
//!
//! Works with any endpoint that follows the OpenAI `/chat/completions`
//! format: OpenAI itself, Ollama's `/v1` API, vLLM, LM Studio and MLX
//! servers.

use super::{ChatModel, ChatRequest, build_http_client, check_status, resolve_api_key};
use crate::config::LlmConfig;
use crate::error::ProviderError;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::debug;

const PROVIDER: &str = "openai-compatible";

/// Blocking client for OpenAI-style chat completions.
pub struct OpenAiCompatibleProvider {
    client: reqwest::blocking::Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
}

impl OpenAiCompatibleProvider {
    /// Create a provider from the `llm` config section.
    ///
    /// A missing API key is fine for local servers; requests are then sent
    /// without an `Authorization` header.
    pub fn new(config: &LlmConfig) -> Result<Self, ProviderError> {
        let api_key = config
            .api_key_env
            .as_deref()
            .and_then(resolve_api_key);
        if api_key.is_none() {
            debug!(base_url = %config.base_url, "No API key configured for chat provider");
        }
        Self::new_with_key(config, api_key)
    }

    /// Create a provider with an explicitly provided API key.
    pub fn new_with_key(config: &LlmConfig, api_key: Option<String>) -> Result<Self, ProviderError> {
        let timeout = config.request_timeout_secs.map(Duration::from_secs);
        Ok(Self {
            client: build_http_client(PROVIDER, timeout)?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            model: config.generation_model.clone(),
        })
    }

    fn request_body(&self, request: &ChatRequest) -> Value {
        let mut body = json!({
            "model": request.model.as_deref().unwrap_or(&self.model),
            "messages": request.messages,
            "temperature": request.temperature,
            "stream": false,
        });
        if let Some(max_tokens) = request.max_tokens {
            body["max_tokens"] = json!(max_tokens);
        }
        if let Some(top_p) = request.top_p {
            body["top_p"] = json!(top_p);
        }
        body
    }

    /// Extract `choices[0].message.content` from a completion response.
    fn parse_response(body: &Value) -> Result<String, ProviderError> {
        let message = body
            .get("choices")
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("message"))
            .ok_or_else(|| ProviderError::ResponseParse {
                provider: PROVIDER.to_string(),
                message: "No choices in response".to_string(),
            })?;

        message
            .get("content")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| ProviderError::MissingContent {
                provider: PROVIDER.to_string(),
            })
    }
}

impl ChatModel for OpenAiCompatibleProvider {
    fn complete(&self, request: &ChatRequest) -> Result<String, ProviderError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = self.request_body(request);
        debug!(url = %url, model = %body["model"], "Sending chat completion request");

        let mut http = self.client.post(&url).json(&body);
        if let Some(key) = &self.api_key {
            http = http.bearer_auth(key);
        }
        let response = http.send().map_err(|e| ProviderError::Request {
            provider: PROVIDER.to_string(),
            message: e.to_string(),
        })?;
        let text = check_status(PROVIDER, response)?;

        let json: Value = serde_json::from_str(&text).map_err(|e| ProviderError::ResponseParse {
            provider: PROVIDER.to_string(),
            message: format!("Invalid JSON: {e}"),
        })?;
        Self::parse_response(&json)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
