//! Sweep orchestration over `chunk_sizes x chunk_overlaps x top_k_values`.
//!
//! The sweep is sequential. Each `(chunk_size, overlap)` key is chunked,
//! embedded and indexed once; every `top_k` value and all three strategies
//! under that key reuse the same artifacts. A key that fails to build is
//! logged, recorded and skipped. Nothing inside the loop aborts the sweep.

pub mod cache;
pub mod report;
pub mod runner;

use crate::capabilities::Capabilities;
use crate::config::{EvalCase, SweepParams};
use crate::corpus::Corpus;
use crate::error::ConfigBuildError;
use crate::rag::{ConfigKey, RagStrategy, build_index, chunk_corpus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

pub use cache::ConfigurationCache;
pub use report::{SweepReport, rank_records};
pub use runner::{RunRecord, RunSettings, run_strategy};

/// Receives progress notifications from a running sweep.
pub trait SweepObserver {
    /// Called once with the number of `(chunk_size, overlap, top_k)` combinations.
    fn on_start(&self, _combinations: usize) {}

    /// Called after every strategy run.
    fn on_record(&self, _record: &RunRecord) {}

    /// Called once for each key whose chunks or index could not be built.
    fn on_config_failed(&self, _key: ConfigKey, _error: &ConfigBuildError) {}

    /// Called after each combination, whether it ran or was skipped.
    fn on_combination_done(&self, _key: ConfigKey, _top_k: usize) {}
}

/// Observer that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl SweepObserver for NoopObserver {}

/// A configuration key that was skipped because it could not be built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailedKey {
    pub chunk_size: i64,
    pub overlap: i64,
    pub error: String,
}

/// Everything a sweep produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepOutcome {
    pub id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub query: String,
    /// Records in iteration order.
    pub records: Vec<RunRecord>,
    pub failed_keys: Vec<FailedKey>,
}

impl SweepOutcome {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn duration_secs(&self) -> f64 {
        (self.finished_at - self.started_at).num_milliseconds() as f64 / 1000.0
    }
}

/// Runs the parameter grid against one corpus and one evaluation case.
pub struct Sweep<'a> {
    params: &'a SweepParams,
    case: &'a EvalCase,
    caps: Capabilities<'a>,
    observer: &'a dyn SweepObserver,
}

impl<'a> Sweep<'a> {
    pub fn new(params: &'a SweepParams, case: &'a EvalCase, caps: Capabilities<'a>) -> Self {
        Self {
            params,
            case,
            caps,
            observer: &NoopObserver,
        }
    }

    pub fn with_observer(mut self, observer: &'a dyn SweepObserver) -> Self {
        self.observer = observer;
        self
    }

    pub fn run(&self, corpus: &Corpus) -> SweepOutcome {
        let id = Uuid::new_v4();
        let started_at = Utc::now();
        let combinations = self.params.combinations();
        info!(
            sweep_id = %id,
            documents = corpus.len(),
            combinations,
            "Starting sweep"
        );
        self.observer.on_start(combinations);

        let settings = RunSettings {
            case: self.case,
            rerank_multiplier: self.params.rerank_multiplier,
        };
        let mut cache = ConfigurationCache::new();
        let mut records = Vec::with_capacity(combinations * RagStrategy::ALL.len());
        let mut failed_keys = Vec::new();

        for &chunk_size in &self.params.chunk_sizes {
            for &overlap in &self.params.chunk_overlaps {
                let key = ConfigKey::new(chunk_size, overlap);
                for &top_k in &self.params.top_k_values {
                    let built = cache.ensure(key, || {
                        let chunks = chunk_corpus(&corpus.documents, key);
                        build_index(key, chunks, self.caps.embedder)
                    });
                    if let Err(e) = built {
                        warn!(chunk_size, overlap, error = %e, "Skipping configuration");
                        self.observer.on_config_failed(key, &e);
                        failed_keys.push(FailedKey {
                            chunk_size,
                            overlap,
                            error: e.to_string(),
                        });
                    }

                    let Some(indexed) = cache.get(key) else {
                        debug!(chunk_size, overlap, top_k, "No index available, skipping");
                        self.observer.on_combination_done(key, top_k);
                        continue;
                    };

                    for strategy in RagStrategy::ALL {
                        let record = run_strategy(strategy, top_k, indexed, settings, self.caps);
                        self.observer.on_record(&record);
                        records.push(record);
                    }
                    self.observer.on_combination_done(key, top_k);
                }
            }
        }
        cache.clear();

        let finished_at = Utc::now();
        info!(
            sweep_id = %id,
            records = records.len(),
            failed_keys = failed_keys.len(),
            "Sweep finished"
        );
        SweepOutcome {
            id,
            started_at,
            finished_at,
            query: self.case.query.clone(),
            records,
            failed_keys,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capabilities::LlmBackend;
    use crate::config::LlmConfig;
    use crate::embeddings::LocalEmbedder;
    use crate::providers::MockChatModel;
    use std::cell::RefCell;

    #[derive(Default)]
    struct Recorder {
        events: RefCell<Vec<String>>,
    }

    impl SweepObserver for Recorder {
        fn on_start(&self, combinations: usize) {
            self.events.borrow_mut().push(format!("start {combinations}"));
        }
        fn on_config_failed(&self, key: ConfigKey, _error: &ConfigBuildError) {
            self.events.borrow_mut().push(format!("failed {key}"));
        }
        fn on_combination_done(&self, key: ConfigKey, top_k: usize) {
            self.events.borrow_mut().push(format!("done {key} k={top_k}"));
        }
    }

    fn corpus() -> Corpus {
        Corpus::from_texts([
            "solar output depends on sunlight and weather conditions across the day",
            "hydropower provides steady generation but dams reshape river ecosystems",
        ])
    }

    #[test]
    fn test_records_follow_iteration_order() {
        let params = SweepParams {
            chunk_sizes: vec![4, 6],
            chunk_overlaps: vec![1],
            top_k_values: vec![1, 2],
            rerank_multiplier: 3,
        };
        let case = EvalCase::default();
        let embedder = LocalEmbedder::new(32);
        let backend = LlmBackend::new(
            MockChatModel::responding_with(|_| Ok("0.5".into())),
            LlmConfig::default(),
        );
        let outcome = Sweep::new(&params, &case, Capabilities::with_backend(&embedder, &backend))
            .run(&corpus());

        assert_eq!(outcome.records.len(), 12);
        let shape: Vec<(i64, usize, RagStrategy)> = outcome
            .records
            .iter()
            .map(|r| (r.chunk_size, r.top_k, r.strategy))
            .collect();
        assert_eq!(shape[0], (4, 1, RagStrategy::Simple));
        assert_eq!(shape[2], (4, 1, RagStrategy::RerankSimulated));
        assert_eq!(shape[3], (4, 2, RagStrategy::Simple));
        assert_eq!(shape[6], (6, 1, RagStrategy::Simple));
        assert!(outcome.failed_keys.is_empty());
    }

    #[test]
    fn test_failed_key_is_skipped_and_reported_once() {
        struct NoEmbeddings;
        impl crate::embeddings::Embedder for NoEmbeddings {
            fn embed_batch(
                &self,
                _texts: &[&str],
            ) -> Result<Vec<Vec<f32>>, crate::error::ProviderError> {
                Ok(Vec::new())
            }
            fn dimensions(&self) -> usize {
                0
            }
            fn provider_name(&self) -> &str {
                "none"
            }
        }

        let params = SweepParams {
            chunk_sizes: vec![5],
            chunk_overlaps: vec![0],
            top_k_values: vec![1, 2, 3],
            rerank_multiplier: 3,
        };
        let case = EvalCase::default();
        let backend = LlmBackend::new(MockChatModel::new(), LlmConfig::default());
        let recorder = Recorder::default();
        let outcome = Sweep::new(&params, &case, Capabilities::with_backend(&NoEmbeddings, &backend))
            .with_observer(&recorder)
            .run(&corpus());

        assert!(outcome.is_empty());
        assert_eq!(outcome.failed_keys.len(), 1);
        assert_eq!(outcome.failed_keys[0].chunk_size, 5);
        assert_eq!(backend.model().call_count(), 0);

        let events = recorder.events.borrow();
        assert_eq!(events[0], "start 3");
        assert_eq!(events[1], "failed chunk_size=5, overlap=0");
        assert_eq!(events.len(), 5);
    }
}
