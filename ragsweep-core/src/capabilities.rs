//! The external capabilities a sweep consumes, and the chat-model adapter
//! that provides them.
//!
//! The strategy runner never talks to a model directly. It asks for a
//! grounded answer ([`Generator`]), an optimized query ([`QueryRewriter`])
//! or a bare numeric verdict ([`Judge`]); embeddings come from
//! [`crate::embeddings::Embedder`].

use crate::config::LlmConfig;
use crate::embeddings::Embedder;
use crate::error::ProviderError;
use crate::providers::{ChatMessage, ChatModel, ChatRequest};

/// System prompt for grounded answer generation.
pub const GENERATION_SYSTEM_PROMPT: &str = "You are a helpful AI assistant. Answer the query based strictly on the provided context. If the context doesn't contain the answer, state that clearly. Be concise.";

/// System prompt for the query-rewrite step.
pub const REWRITE_SYSTEM_PROMPT: &str = "You are an expert query optimizer. Rewrite the query to be ideal for vector database retrieval. Focus on key entities, concepts, and relationships. Remove conversational fluff. Output ONLY the rewritten query text.";

/// Produces an answer grounded in retrieved context.
pub trait Generator: Send + Sync {
    fn generate(&self, query: &str, context: &str) -> Result<String, ProviderError>;
}

/// Produces a retrieval-optimized rewrite of a query (raw model output).
pub trait QueryRewriter: Send + Sync {
    fn rewrite(&self, query: &str) -> Result<String, ProviderError>;
}

/// Single free-text completion expected to contain a number in [0, 1].
pub trait Judge: Send + Sync {
    fn judge(&self, prompt: &str) -> Result<String, ProviderError>;
}

/// Everything a strategy run needs from the outside world.
#[derive(Clone, Copy)]
pub struct Capabilities<'a> {
    pub embedder: &'a dyn Embedder,
    pub generator: &'a dyn Generator,
    pub rewriter: &'a dyn QueryRewriter,
    pub judge: &'a dyn Judge,
}

impl<'a> Capabilities<'a> {
    /// Use one object for generation, rewriting and judging.
    pub fn with_backend<B>(embedder: &'a dyn Embedder, backend: &'a B) -> Self
    where
        B: Generator + QueryRewriter + Judge,
    {
        Self {
            embedder,
            generator: backend,
            rewriter: backend,
            judge: backend,
        }
    }
}

/// Build the user message for grounded generation.
pub fn generation_prompt(query: &str, context: &str) -> String {
    format!(
        "System: {GENERATION_SYSTEM_PROMPT}\n\nContext:\n------\n{context}\n------\n\nQuery: {query}\n\nAnswer:"
    )
}

/// Adapts a [`ChatModel`] and the `llm` config section to the three
/// text capabilities.
pub struct LlmBackend<M> {
    model: M,
    config: LlmConfig,
}

impl<M: ChatModel> LlmBackend<M> {
    pub fn new(model: M, config: LlmConfig) -> Self {
        Self { model, config }
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn config(&self) -> &LlmConfig {
        &self.config
    }
}

impl<M: ChatModel> Generator for LlmBackend<M> {
    fn generate(&self, query: &str, context: &str) -> Result<String, ProviderError> {
        let request = ChatRequest::new(vec![ChatMessage::user(generation_prompt(query, context))])
            .with_model(Some(self.config.generation_model.clone()))
            .with_temperature(self.config.generation_temperature)
            .with_max_tokens(self.config.generation_max_tokens)
            .with_top_p(self.config.generation_top_p);
        self.model
            .complete(&request)
            .map(|answer| answer.trim().to_string())
    }
}

impl<M: ChatModel> QueryRewriter for LlmBackend<M> {
    fn rewrite(&self, query: &str) -> Result<String, ProviderError> {
        let request = ChatRequest::new(vec![
            ChatMessage::system(REWRITE_SYSTEM_PROMPT),
            ChatMessage::user(format!("Original Query: {query}\n\nRewritten Query:")),
        ])
        .with_model(Some(self.config.generation_model.clone()))
        .with_temperature(self.config.rewrite_temperature)
        .with_max_tokens(self.config.rewrite_max_tokens);
        self.model.complete(&request)
    }
}

impl<M: ChatModel> Judge for LlmBackend<M> {
    fn judge(&self, prompt: &str) -> Result<String, ProviderError> {
        let request = ChatRequest::new(vec![ChatMessage::user(prompt)])
            .with_model(Some(self.config.judge_model().to_string()))
            .with_temperature(0.0)
            .with_max_tokens(self.config.judge_max_tokens);
        self.model.complete(&request)
    }
}
