//! Pluggable embedding providers.
//!
//! The sweep only needs one capability from an embedding model: turn an
//! ordered batch of strings into one fixed-dimension vector per string, in
//! the same order. Implementations:
//! - `LocalEmbedder`: hashed term-frequency vectors, offline and deterministic
//! - `OllamaEmbedder`: the Ollama `/api/embed` endpoint
//! - `OpenAiEmbedder`: any OpenAI-compatible `/v1/embeddings` endpoint

use crate::error::ProviderError;
use crate::providers::{build_http_client, check_status, resolve_api_key};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

/// Trait for embedding providers.
pub trait Embedder: Send + Sync {
    /// Embed a batch of texts, one vector per input in input order.
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, ProviderError>;

    /// Embed a single text.
    fn embed(&self, text: &str) -> Result<Vec<f32>, ProviderError> {
        self.embed_batch(&[text])?
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::MissingContent {
                provider: self.provider_name().to_string(),
            })
    }

    /// Return the dimensionality of embeddings (0 if unknown until first call).
    fn dimensions(&self) -> usize;

    /// Return the provider name.
    fn provider_name(&self) -> &str;
}

/// Configuration for embedding providers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Provider name: "local" (default), "ollama", "openai"
    #[serde(default = "default_provider")]
    pub provider: String,
    /// Provider-specific model name.
    #[serde(default)]
    pub model: Option<String>,
    /// Endpoint override for remote providers.
    #[serde(default)]
    pub base_url: Option<String>,
    /// Vector size for the local provider.
    #[serde(default = "default_dimensions")]
    pub dimensions: usize,
    /// Environment variable holding the API key (openai provider).
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    /// Per-request timeout. `None` waits indefinitely.
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

fn default_provider() -> String {
    "local".into()
}

fn default_dimensions() -> usize {
    384
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".into()
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: None,
            base_url: None,
            dimensions: default_dimensions(),
            api_key_env: default_api_key_env(),
            request_timeout_secs: None,
        }
    }
}

/// Local hashed term-frequency embedder (no network, fully deterministic).
#[derive(Debug, Clone)]
pub struct LocalEmbedder {
    dimensions: usize,
}

impl LocalEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
        }
    }

    fn embed_one(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimensions];

        let lowered = text.to_lowercase();
        let mut tf: HashMap<&str, usize> = HashMap::new();
        for word in lowered
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            *tf.entry(word).or_insert(0) += 1;
        }

        for (term, count) in &tf {
            let idx = simple_hash(term) % self.dimensions;
            vector[idx] += *count as f32;
        }

        let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut vector {
                *v /= norm;
            }
        }
        vector
    }
}

/// djb2 string hash.
fn simple_hash(s: &str) -> usize {
    let mut hash: usize = 5381;
    for b in s.bytes() {
        hash = hash.wrapping_mul(33).wrapping_add(b as usize);
    }
    hash
}

impl Embedder for LocalEmbedder {
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, ProviderError> {
        Ok(texts.iter().map(|t| self.embed_one(t)).collect())
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn provider_name(&self) -> &str {
        "local"
    }
}

/// Ollama embedder (uses the local Ollama API).
pub struct OllamaEmbedder {
    client: reqwest::blocking::Client,
    model: String,
    dims: usize,
    base_url: String,
}

#[derive(Deserialize)]
struct OllamaEmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

impl OllamaEmbedder {
    pub fn new(
        model: Option<String>,
        base_url: Option<String>,
        timeout: Option<Duration>,
    ) -> Result<Self, ProviderError> {
        let model = model.unwrap_or_else(|| "mxbai-embed-large".into());
        let dims = match model.as_str() {
            "nomic-embed-text" => 768,
            "mxbai-embed-large" => 1024,
            "all-minilm" => 384,
            _ => 0,
        };
        Ok(Self {
            client: build_http_client("ollama", timeout)?,
            model,
            dims,
            base_url: base_url
                .unwrap_or_else(|| "http://localhost:11434".into())
                .trim_end_matches('/')
                .to_string(),
        })
    }
}

impl Embedder for OllamaEmbedder {
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, ProviderError> {
        let url = format!("{}/api/embed", self.base_url);
        debug!(url = %url, model = %self.model, batch = texts.len(), "Requesting Ollama embeddings");

        let response = self
            .client
            .post(&url)
            .json(&json!({ "model": self.model, "input": texts }))
            .send()
            .map_err(|e| ProviderError::Request {
                provider: "ollama".into(),
                message: e.to_string(),
            })?;
        let body = check_status("ollama", response)?;
        let parsed: OllamaEmbedResponse =
            serde_json::from_str(&body).map_err(|e| ProviderError::ResponseParse {
                provider: "ollama".into(),
                message: e.to_string(),
            })?;

        ensure_batch_len("ollama", texts.len(), parsed.embeddings)
    }

    fn dimensions(&self) -> usize {
        self.dims
    }

    fn provider_name(&self) -> &str {
        "ollama"
    }
}

/// OpenAI API embedder (uses text-embedding-3-small by default).
pub struct OpenAiEmbedder {
    client: reqwest::blocking::Client,
    api_key: String,
    model: String,
    dims: usize,
    base_url: String,
}

#[derive(Deserialize)]
struct OpenAiEmbedResponse {
    data: Vec<OpenAiEmbedding>,
}

#[derive(Deserialize)]
struct OpenAiEmbedding {
    #[serde(default)]
    index: usize,
    embedding: Vec<f32>,
}

impl OpenAiEmbedder {
    pub fn new(
        api_key: String,
        model: Option<String>,
        base_url: Option<String>,
        timeout: Option<Duration>,
    ) -> Result<Self, ProviderError> {
        let model = model.unwrap_or_else(|| "text-embedding-3-small".into());
        let dims = match model.as_str() {
            "text-embedding-3-small" | "text-embedding-ada-002" => 1536,
            "text-embedding-3-large" => 3072,
            _ => 0,
        };
        Ok(Self {
            client: build_http_client("openai", timeout)?,
            api_key,
            model,
            dims,
            base_url: base_url
                .unwrap_or_else(|| "https://api.openai.com".into())
                .trim_end_matches('/')
                .to_string(),
        })
    }
}

impl Embedder for OpenAiEmbedder {
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, ProviderError> {
        let url = format!("{}/v1/embeddings", self.base_url);
        debug!(url = %url, model = %self.model, batch = texts.len(), "Requesting OpenAI embeddings");

        let mut request = self
            .client
            .post(&url)
            .json(&json!({ "model": self.model, "input": texts }));
        if !self.api_key.is_empty() {
            request = request.bearer_auth(&self.api_key);
        }
        let response = request.send().map_err(|e| ProviderError::Request {
            provider: "openai".into(),
            message: e.to_string(),
        })?;
        let body = check_status("openai", response)?;
        let mut parsed: OpenAiEmbedResponse =
            serde_json::from_str(&body).map_err(|e| ProviderError::ResponseParse {
                provider: "openai".into(),
                message: e.to_string(),
            })?;

        parsed.data.sort_by_key(|d| d.index);
        let vectors = parsed.data.into_iter().map(|d| d.embedding).collect();
        ensure_batch_len("openai", texts.len(), vectors)
    }

    fn dimensions(&self) -> usize {
        self.dims
    }

    fn provider_name(&self) -> &str {
        "openai"
    }
}

pub(crate) fn ensure_batch_len(
    provider: &str,
    expected: usize,
    vectors: Vec<Vec<f32>>,
) -> Result<Vec<Vec<f32>>, ProviderError> {
    if vectors.len() != expected {
        return Err(ProviderError::BatchSizeMismatch {
            provider: provider.to_string(),
            expected,
            actual: vectors.len(),
        });
    }
    Ok(vectors)
}

/// Factory function to create an embedder based on configuration.
pub fn create_embedder(config: &EmbeddingConfig) -> Result<Box<dyn Embedder>, ProviderError> {
    let timeout = config.request_timeout_secs.map(Duration::from_secs);
    match config.provider.as_str() {
        "ollama" => Ok(Box::new(OllamaEmbedder::new(
            config.model.clone(),
            config.base_url.clone(),
            timeout,
        )?)),
        "openai" => {
            let api_key = resolve_api_key(&config.api_key_env).unwrap_or_default();
            if api_key.is_empty() {
                tracing::warn!(
                    env = %config.api_key_env,
                    "API key not set, sending unauthenticated embedding requests"
                );
            }
            Ok(Box::new(OpenAiEmbedder::new(
                api_key,
                config.model.clone(),
                config.base_url.clone(),
                timeout,
            )?))
        }
        "local" => Ok(Box::new(LocalEmbedder::new(config.dimensions))),
        other => {
            tracing::warn!(provider = other, "Unknown embedding provider, falling back to local");
            Ok(Box::new(LocalEmbedder::new(config.dimensions)))
        }
    }
}
