//! Configuration for a ragsweep run.
//!
//! Uses `figment` for layered configuration: defaults -> `ragsweep.toml` in the
//! working directory -> explicit config file -> `RAGSWEEP_` environment
//! variables (`__` separates nested keys, e.g. `RAGSWEEP_LLM__GENERATION_MODEL`).

use crate::embeddings::EmbeddingConfig;
use crate::error::ConfigError;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Workspace-local config file picked up automatically.
pub const DEFAULT_CONFIG_FILE: &str = "ragsweep.toml";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SweepConfig {
    #[serde(default)]
    pub sweep: SweepParams,
    #[serde(default)]
    pub evaluation: EvalCase,
    #[serde(default)]
    pub corpus: CorpusConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub report: ReportConfig,
}

impl SweepConfig {
    /// Reject parameter grids the orchestrator cannot run.
    ///
    /// Chunk sizes and overlaps are deliberately not checked here: invalid
    /// values are handled by the chunker's degrade rules.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let sweep = &self.sweep;
        if sweep.chunk_sizes.is_empty()
            || sweep.chunk_overlaps.is_empty()
            || sweep.top_k_values.is_empty()
        {
            return Err(ConfigError::Invalid {
                message: "chunk_sizes, chunk_overlaps and top_k_values must be non-empty".into(),
            });
        }
        if sweep.top_k_values.contains(&0) {
            return Err(ConfigError::Invalid {
                message: "top_k_values must be positive".into(),
            });
        }
        if sweep.rerank_multiplier == 0 {
            return Err(ConfigError::Invalid {
                message: "rerank_multiplier must be at least 1".into(),
            });
        }
        if self.evaluation.query.trim().is_empty() {
            return Err(ConfigError::Invalid {
                message: "evaluation.query must not be empty".into(),
            });
        }
        Ok(())
    }
}

/// The parameter grid. Iterated as `chunk_sizes x chunk_overlaps x top_k_values`,
/// chunk size outermost.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepParams {
    #[serde(default = "default_chunk_sizes")]
    pub chunk_sizes: Vec<i64>,
    #[serde(default = "default_chunk_overlaps")]
    pub chunk_overlaps: Vec<i64>,
    #[serde(default = "default_top_k_values")]
    pub top_k_values: Vec<usize>,
    /// Over-fetch factor for the simulated rerank strategy.
    #[serde(default = "default_rerank_multiplier")]
    pub rerank_multiplier: usize,
}

impl SweepParams {
    /// Number of `(chunk_size, overlap, top_k)` combinations.
    pub fn combinations(&self) -> usize {
        self.chunk_sizes.len() * self.chunk_overlaps.len() * self.top_k_values.len()
    }
}

impl Default for SweepParams {
    fn default() -> Self {
        Self {
            chunk_sizes: default_chunk_sizes(),
            chunk_overlaps: default_chunk_overlaps(),
            top_k_values: default_top_k_values(),
            rerank_multiplier: default_rerank_multiplier(),
        }
    }
}

fn default_chunk_sizes() -> Vec<i64> {
    vec![150, 250]
}

fn default_chunk_overlaps() -> Vec<i64> {
    vec![30, 50]
}

fn default_top_k_values() -> Vec<usize> {
    vec![3, 5]
}

fn default_rerank_multiplier() -> usize {
    crate::rag::strategy::DEFAULT_RERANK_MULTIPLIER
}

/// The fixed question every configuration is scored on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvalCase {
    #[serde(default = "default_query")]
    pub query: String,
    #[serde(default = "default_reference_answer")]
    pub reference_answer: String,
}

impl EvalCase {
    pub fn new(query: impl Into<String>, reference_answer: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            reference_answer: reference_answer.into(),
        }
    }
}

impl Default for EvalCase {
    fn default() -> Self {
        Self {
            query: default_query(),
            reference_answer: default_reference_answer(),
        }
    }
}

fn default_query() -> String {
    "Compare the consistency and environmental impact of solar power versus hydropower.".into()
}

fn default_reference_answer() -> String {
    "Solar power's consistency varies with weather and time of day, requiring storage like \
     batteries. Hydropower is generally reliable, but large dams have significant environmental \
     impacts on ecosystems and communities, unlike solar power's primary impact being land use \
     for panels."
        .into()
}

/// Where the document corpus lives.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorpusConfig {
    #[serde(default = "default_corpus_path")]
    pub path: PathBuf,
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            path: default_corpus_path(),
        }
    }
}

fn default_corpus_path() -> PathBuf {
    PathBuf::from("data/docs.json")
}

/// Chat-completion settings shared by generation, rewriting and judging.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// OpenAI-compatible API root (the part before `/chat/completions`).
    #[serde(default = "default_llm_base_url")]
    pub base_url: String,
    /// Environment variable holding the API key. Local servers need none.
    #[serde(default)]
    pub api_key_env: Option<String>,
    #[serde(default = "default_generation_model")]
    pub generation_model: String,
    /// Judge model; falls back to `generation_model` when unset.
    #[serde(default)]
    pub judge_model: Option<String>,
    #[serde(default = "default_generation_temperature")]
    pub generation_temperature: f32,
    #[serde(default = "default_generation_max_tokens")]
    pub generation_max_tokens: u32,
    #[serde(default = "default_generation_top_p")]
    pub generation_top_p: f32,
    #[serde(default = "default_rewrite_temperature")]
    pub rewrite_temperature: f32,
    #[serde(default = "default_rewrite_max_tokens")]
    pub rewrite_max_tokens: u32,
    #[serde(default = "default_judge_max_tokens")]
    pub judge_max_tokens: u32,
    /// Per-request timeout. `None` waits indefinitely.
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

impl LlmConfig {
    pub fn judge_model(&self) -> &str {
        self.judge_model.as_deref().unwrap_or(&self.generation_model)
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: default_llm_base_url(),
            api_key_env: None,
            generation_model: default_generation_model(),
            judge_model: None,
            generation_temperature: default_generation_temperature(),
            generation_max_tokens: default_generation_max_tokens(),
            generation_top_p: default_generation_top_p(),
            rewrite_temperature: default_rewrite_temperature(),
            rewrite_max_tokens: default_rewrite_max_tokens(),
            judge_max_tokens: default_judge_max_tokens(),
            request_timeout_secs: None,
        }
    }
}

fn default_llm_base_url() -> String {
    "http://localhost:11434/v1".into()
}

fn default_generation_model() -> String {
    "llama3.2:1b".into()
}

fn default_generation_temperature() -> f32 {
    0.1
}

fn default_generation_max_tokens() -> u32 {
    400
}

fn default_generation_top_p() -> f32 {
    0.9
}

fn default_rewrite_temperature() -> f32 {
    0.1
}

fn default_rewrite_max_tokens() -> u32 {
    100
}

fn default_judge_max_tokens() -> u32 {
    10
}

/// Ranking and output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Rows shown in the ranking table.
    #[serde(default = "default_top_n")]
    pub top_n: usize,
    /// Directory receiving `results.json` and `report.txt`.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            top_n: default_top_n(),
            output_dir: default_output_dir(),
        }
    }
}

fn default_top_n() -> usize {
    10
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("ragsweep-output")
}

/// Load configuration from layered sources.
///
/// Priority (highest to lowest):
/// 1. Environment variables (prefixed with `RAGSWEEP_`)
/// 2. Explicit config file (`explicit`, must exist)
/// 3. `ragsweep.toml` in `workspace`
/// 4. Built-in defaults
pub fn load_config(
    workspace: Option<&Path>,
    explicit: Option<&Path>,
) -> Result<SweepConfig, ConfigError> {
    let mut figment = Figment::from(Serialized::defaults(SweepConfig::default()));

    if let Some(ws) = workspace {
        let ws_config = ws.join(DEFAULT_CONFIG_FILE);
        if ws_config.exists() {
            figment = figment.merge(Toml::file(&ws_config));
        }
    }

    if let Some(path) = explicit {
        if !path.exists() {
            return Err(ConfigError::Invalid {
                message: format!("config file not found: {}", path.display()),
            });
        }
        figment = figment.merge(Toml::file(path));
    }

    figment = figment.merge(Env::prefixed("RAGSWEEP_").split("__"));

    let config: SweepConfig = figment.extract().map_err(Box::new)?;
    config.validate()?;
    Ok(config)
}
