//! One strategy run: resolve the query, retrieve, generate, score.

use crate::capabilities::Capabilities;
use crate::config::EvalCase;
use crate::embeddings::ensure_batch_len;
use crate::error::{RetrievalError, SweepError};
use crate::eval::{
    JudgeMetric, ScoreCard, faithfulness_prompt, relevancy_prompt, score_with_judge,
    similarity_score,
};
use crate::rag::{IndexedCorpus, RagStrategy, search_indices};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Answer recorded when retrieval produced nothing to ground on.
pub const NO_CONTEXT_ANSWER: &str = "No relevant context found.";

/// Answer a record carries until its run completes.
pub const DEFAULT_ANSWER: &str = "Error: Execution Failed";

const ERROR_PREVIEW_CHARS: usize = 200;

/// The outcome of one strategy under one `(chunk_size, overlap, top_k)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub chunk_size: i64,
    pub overlap: i64,
    pub top_k: usize,
    pub strategy: RagStrategy,
    pub retrieved_indices: Vec<usize>,
    /// Resolved retrieval query; only set for the rewrite strategy.
    pub rewritten_query: Option<String>,
    pub answer: String,
    pub faithfulness: f64,
    pub relevancy: f64,
    pub similarity_score: f64,
    pub avg_score: f64,
    pub time_sec: f64,
}

impl RunRecord {
    fn pending(corpus: &IndexedCorpus, top_k: usize, strategy: RagStrategy) -> Self {
        Self {
            chunk_size: corpus.key.chunk_size,
            overlap: corpus.key.overlap,
            top_k,
            strategy,
            retrieved_indices: Vec::new(),
            rewritten_query: None,
            answer: DEFAULT_ANSWER.to_string(),
            faithfulness: 0.0,
            relevancy: 0.0,
            similarity_score: 0.0,
            avg_score: 0.0,
            time_sec: 0.0,
        }
    }

    pub fn scores(&self) -> ScoreCard {
        ScoreCard {
            faithfulness: self.faithfulness,
            relevancy: self.relevancy,
            similarity: self.similarity_score,
        }
    }

    fn apply_scores(&mut self, scores: ScoreCard) {
        self.faithfulness = scores.faithfulness;
        self.relevancy = scores.relevancy;
        self.similarity_score = scores.similarity;
        self.avg_score = scores.average();
    }

    pub fn is_error(&self) -> bool {
        self.answer.starts_with("ERROR: ") || self.answer == DEFAULT_ANSWER
    }
}

/// Parameters shared by every run of a sweep.
#[derive(Clone, Copy)]
pub struct RunSettings<'a> {
    pub case: &'a EvalCase,
    pub rerank_multiplier: usize,
}

/// Run one strategy and always produce a record.
///
/// Failures inside the run are folded into the record: the answer becomes
/// `ERROR: ...` and all scores stay at 0.0. Indices retrieved before the
/// failure are kept.
pub fn run_strategy(
    strategy: RagStrategy,
    top_k: usize,
    corpus: &IndexedCorpus,
    settings: RunSettings<'_>,
    caps: Capabilities<'_>,
) -> RunRecord {
    let started = Instant::now();
    let mut record = RunRecord::pending(corpus, top_k, strategy);

    let (query, rewritten) = strategy.resolve_query(&settings.case.query, caps.rewriter);
    record.rewritten_query = rewritten;

    if let Err(e) = execute(&mut record, &query, corpus, settings, caps) {
        warn!(
            strategy = strategy.name(),
            chunk_size = corpus.key.chunk_size,
            overlap = corpus.key.overlap,
            top_k,
            error = %e,
            "Strategy run failed"
        );
        record.answer = error_answer(&e);
    }

    record.time_sec = started.elapsed().as_secs_f64();
    info!(
        strategy = strategy.name(),
        chunk_size = record.chunk_size,
        overlap = record.overlap,
        top_k,
        avg_score = record.avg_score,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Finished run"
    );
    record
}

/// Nearest chunk indices at the strategy's search depth, before selection.
///
/// An empty index yields no candidates rather than an error.
fn retrieve_candidates(
    strategy: RagStrategy,
    query: &str,
    top_k: usize,
    corpus: &IndexedCorpus,
    settings: RunSettings<'_>,
    caps: Capabilities<'_>,
) -> Result<Vec<usize>, SweepError> {
    let depth = strategy.search_depth(top_k, settings.rerank_multiplier);
    let query_vector = caps.embedder.embed(query)?;

    let candidates = match search_indices(&corpus.index, &query_vector, depth) {
        Ok(found) => found,
        Err(RetrievalError::EmptyIndex) => Vec::new(),
        Err(e) => return Err(e.into()),
    };
    debug!(
        strategy = strategy.name(),
        depth,
        candidates = candidates.len(),
        "Searched index"
    );
    Ok(candidates)
}

/// Fill in retrieval, answer and scores. Scores are applied only once every
/// step has succeeded.
fn execute(
    record: &mut RunRecord,
    query: &str,
    corpus: &IndexedCorpus,
    settings: RunSettings<'_>,
    caps: Capabilities<'_>,
) -> Result<(), SweepError> {
    let strategy = record.strategy;
    let candidates =
        retrieve_candidates(strategy, query, record.top_k, corpus, settings, caps)?;
    record.retrieved_indices = strategy.select_candidates(candidates, record.top_k);

    let context_chunks: Vec<&str> = record
        .retrieved_indices
        .iter()
        .filter_map(|&idx| corpus.chunk(idx))
        .collect();
    if context_chunks.is_empty() {
        warn!(strategy = strategy.name(), "No chunks retrieved");
        record.answer = NO_CONTEXT_ANSWER.to_string();
        return Ok(());
    }

    // Generation and judging always see the original query.
    let context = context_chunks.join("\n\n");
    let case = settings.case;
    let answer = caps.generator.generate(&case.query, &context)?;

    let faithfulness = score_with_judge(
        caps.judge,
        JudgeMetric::Faithfulness,
        &faithfulness_prompt(&answer, &case.reference_answer),
    );
    let relevancy = score_with_judge(
        caps.judge,
        JudgeMetric::Relevancy,
        &relevancy_prompt(&case.query, &answer),
    );

    let pair = caps
        .embedder
        .embed_batch(&[answer.as_str(), case.reference_answer.as_str()])?;
    let pair = ensure_batch_len(caps.embedder.provider_name(), 2, pair)?;
    let similarity = similarity_score(&pair[0], &pair[1]);

    record.answer = answer;
    record.apply_scores(ScoreCard {
        faithfulness,
        relevancy,
        similarity,
    });
    Ok(())
}

/// `ERROR: <first 200 chars>...`
pub fn error_answer(error: &SweepError) -> String {
    let message: String = error.to_string().chars().take(ERROR_PREVIEW_CHARS).collect();
    format!("ERROR: {message}...")
}
