//! The three retrieval strategies evaluated for every configuration.

use crate::capabilities::QueryRewriter;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;
use tracing::{debug, warn};

/// Default over-fetch factor for [`RagStrategy::RerankSimulated`].
pub const DEFAULT_RERANK_MULTIPLIER: usize = 3;

/// Rewrites at or below this length are rejected.
const MIN_REWRITE_LEN: usize = 5;

static REWRITE_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(rewritten query:|query:)\s*").expect("valid rewrite label regex")
});

/// A retrieval pipeline variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RagStrategy {
    /// Embed the query, retrieve top-k, generate.
    #[serde(rename = "Simple RAG")]
    Simple,
    /// Ask a model to rewrite the query before retrieval.
    #[serde(rename = "Query Rewrite RAG")]
    QueryRewrite,
    /// Over-fetch `k * multiplier` candidates and keep the first `k`.
    #[serde(rename = "Rerank RAG (Simulated)")]
    RerankSimulated,
}

impl RagStrategy {
    /// All strategies in sweep order.
    pub const ALL: [RagStrategy; 3] = [
        RagStrategy::Simple,
        RagStrategy::QueryRewrite,
        RagStrategy::RerankSimulated,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            RagStrategy::Simple => "Simple RAG",
            RagStrategy::QueryRewrite => "Query Rewrite RAG",
            RagStrategy::RerankSimulated => "Rerank RAG (Simulated)",
        }
    }

    /// Pick the query used for retrieval.
    ///
    /// Returns the query text and, for the rewrite strategy, the same text
    /// to record as the resolved query. A failed or rejected rewrite falls
    /// back to the original.
    pub fn resolve_query(
        &self,
        query: &str,
        rewriter: &dyn QueryRewriter,
    ) -> (String, Option<String>) {
        if *self != RagStrategy::QueryRewrite {
            return (query.to_string(), None);
        }

        let resolved = match rewriter.rewrite(query) {
            Ok(raw) => {
                let candidate = clean_rewritten_query(&raw);
                if accept_rewrite(query, &candidate) {
                    debug!(original = query, rewritten = %candidate, "Query rewritten");
                    candidate
                } else {
                    debug!(candidate = %candidate, "Rewrite rejected, keeping original query");
                    query.to_string()
                }
            }
            Err(e) => {
                warn!(error = %e, "Query rewrite failed, keeping original query");
                query.to_string()
            }
        };
        (resolved.clone(), Some(resolved))
    }

    /// Number of neighbours to request from the index.
    pub fn search_depth(&self, top_k: usize, multiplier: usize) -> usize {
        match self {
            RagStrategy::RerankSimulated => top_k.saturating_mul(multiplier.max(1)),
            _ => top_k,
        }
    }

    /// Narrow retrieved candidates to the ones passed to generation.
    ///
    /// The simulated reranker keeps the nearest-first order and only
    /// truncates.
    pub fn select_candidates(&self, mut candidates: Vec<usize>, top_k: usize) -> Vec<usize> {
        if *self == RagStrategy::RerankSimulated {
            candidates.truncate(top_k);
        }
        candidates
    }
}

impl fmt::Display for RagStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Strip a leading `Rewritten Query:`/`Query:` label and surrounding quotes.
pub fn clean_rewritten_query(raw: &str) -> String {
    let stripped = REWRITE_LABEL.replace(raw.trim(), "");
    stripped.trim().trim_matches('"').trim().to_string()
}

fn accept_rewrite(original: &str, candidate: &str) -> bool {
    candidate.chars().count() > MIN_REWRITE_LEN
        && candidate.to_lowercase() != original.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderError;

    struct FixedRewriter(Result<String, ()>);

    impl QueryRewriter for FixedRewriter {
        fn rewrite(&self, _query: &str) -> Result<String, ProviderError> {
            self.0.clone().map_err(|_| ProviderError::Request {
                provider: "test".into(),
                message: "timeout".into(),
            })
        }
    }

    fn ok(text: &str) -> FixedRewriter {
        FixedRewriter(Ok(text.to_string()))
    }

    #[test]
    fn test_names_and_order() {
        let names: Vec<&str> = RagStrategy::ALL.iter().map(|s| s.name()).collect();
        assert_eq!(
            names,
            vec!["Simple RAG", "Query Rewrite RAG", "Rerank RAG (Simulated)"]
        );
        assert_eq!(
            serde_json::to_string(&RagStrategy::RerankSimulated).unwrap(),
            "\"Rerank RAG (Simulated)\""
        );
    }

    #[test]
    fn test_clean_rewritten_query() {
        assert_eq!(
            clean_rewritten_query("Rewritten Query: \"solar vs hydro output\""),
            "solar vs hydro output"
        );
        assert_eq!(clean_rewritten_query("query:   energy"), "energy");
        assert_eq!(clean_rewritten_query("  plain text  "), "plain text");
    }

    #[test]
    fn test_simple_never_rewrites() {
        let (q, rewritten) = RagStrategy::Simple.resolve_query("original", &ok("something else"));
        assert_eq!(q, "original");
        assert_eq!(rewritten, None);
    }

    #[test]
    fn test_rewrite_accepted() {
        let (q, rewritten) = RagStrategy::QueryRewrite
            .resolve_query("compare solar", &ok("Query: solar hydro efficiency comparison"));
        assert_eq!(q, "solar hydro efficiency comparison");
        assert_eq!(rewritten.as_deref(), Some("solar hydro efficiency comparison"));
    }

    #[test]
    fn test_rewrite_rejected_when_short_or_same() {
        let strategy = RagStrategy::QueryRewrite;
        assert_eq!(strategy.resolve_query("compare solar", &ok("solar")).0, "compare solar");
        assert_eq!(strategy.resolve_query("compare solar", &ok("")).0, "compare solar");
        assert_eq!(
            strategy.resolve_query("compare solar", &ok("COMPARE SOLAR")).0,
            "compare solar"
        );
    }

    #[test]
    fn test_rewrite_failure_falls_back() {
        let (q, rewritten) =
            RagStrategy::QueryRewrite.resolve_query("compare solar", &FixedRewriter(Err(())));
        assert_eq!(q, "compare solar");
        assert_eq!(rewritten.as_deref(), Some("compare solar"));
    }

    #[test]
    fn test_search_depth() {
        assert_eq!(RagStrategy::Simple.search_depth(4, 3), 4);
        assert_eq!(RagStrategy::QueryRewrite.search_depth(4, 3), 4);
        assert_eq!(RagStrategy::RerankSimulated.search_depth(4, 3), 12);
        assert_eq!(RagStrategy::RerankSimulated.search_depth(4, 0), 4);
    }

    #[test]
    fn test_rerank_keeps_prefix() {
        let candidates = vec![7, 2, 9, 1, 4, 3];
        assert_eq!(
            RagStrategy::RerankSimulated.select_candidates(candidates.clone(), 2),
            vec![7, 2]
        );
        assert_eq!(RagStrategy::Simple.select_candidates(candidates.clone(), 2), candidates);
    }
}
