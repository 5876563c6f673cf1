//! # ragsweep core
//!
//! Grid search over RAG chunking and retrieval settings. For every
//! `(chunk_size, overlap)` pair the corpus is chunked, embedded and indexed
//! once; each `top_k` value then runs three retrieval strategies whose
//! answers are scored by two LLM judges and embedding similarity. Results
//! are ranked by their average score.

pub mod capabilities;
pub mod config;
pub mod corpus;
pub mod embeddings;
pub mod error;
pub mod eval;
pub mod providers;
pub mod rag;
pub mod sweep;

// Re-export commonly used types at the crate root.
pub use capabilities::{Capabilities, Generator, Judge, LlmBackend, QueryRewriter};
pub use config::{EvalCase, LlmConfig, ReportConfig, SweepConfig, SweepParams, load_config};
pub use corpus::{Corpus, Document, load_corpus};
pub use embeddings::{Embedder, EmbeddingConfig, LocalEmbedder, create_embedder};
pub use error::{
    ConfigBuildError, ConfigError, JudgeParseError, ProviderError, RetrievalError, SweepError,
};
pub use eval::{ScoreCard, cosine_similarity, parse_judge_score};
pub use providers::{ChatModel, MockChatModel, OpenAiCompatibleProvider};
pub use rag::{ConfigKey, FlatL2Index, IndexedCorpus, RagStrategy, chunk_text};
pub use sweep::{
    ConfigurationCache, FailedKey, NoopObserver, RunRecord, Sweep, SweepObserver, SweepOutcome,
    SweepReport,
};
