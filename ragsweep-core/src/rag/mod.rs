//! Retrieval side of the sweep: chunking, the flat vector index, search and
//! the three retrieval strategies.

pub mod chunk;
pub mod index;
pub mod retriever;
pub mod strategy;

use serde::{Deserialize, Serialize};
use std::fmt;

pub use chunk::{ChunkPlan, chunk_corpus, chunk_text};
pub use index::{FlatL2Index, IndexedCorpus, build_index};
pub use retriever::{SearchHit, search, search_indices};
pub use strategy::{RagStrategy, clean_rewritten_query};

/// Identifies one chunking scheme and everything derived from it.
///
/// Values are kept exactly as configured (including invalid ones) so result
/// records report what the sweep was asked to test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConfigKey {
    pub chunk_size: i64,
    pub overlap: i64,
}

impl ConfigKey {
    pub fn new(chunk_size: i64, overlap: i64) -> Self {
        Self {
            chunk_size,
            overlap,
        }
    }
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "chunk_size={}, overlap={}", self.chunk_size, self.overlap)
    }
}
