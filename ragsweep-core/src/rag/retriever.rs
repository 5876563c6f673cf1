//! Nearest-neighbor search over a [`FlatL2Index`].

use crate::error::RetrievalError;
use crate::rag::index::{FlatL2Index, squared_l2};
use serde::{Deserialize, Serialize};

/// A search result: chunk position and its squared L2 distance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub index: usize,
    pub distance: f32,
}

/// Return up to `k` nearest chunks, closest first.
///
/// `k` is clamped to the number of indexed vectors. Vectors whose distance
/// is not finite are dropped rather than returned. Equal distances keep
/// index order.
pub fn search(
    index: &FlatL2Index,
    query: &[f32],
    k: usize,
) -> Result<Vec<SearchHit>, RetrievalError> {
    let k = k.min(index.len());
    if k == 0 {
        return Err(RetrievalError::EmptyIndex);
    }
    if query.len() != index.dim() {
        return Err(RetrievalError::DimensionMismatch {
            expected: index.dim(),
            actual: query.len(),
        });
    }

    let mut hits: Vec<SearchHit> = index
        .rows()
        .map(|(idx, vector)| SearchHit {
            index: idx,
            distance: squared_l2(vector, query),
        })
        .filter(|hit| hit.distance.is_finite())
        .collect();

    hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
    hits.truncate(k);
    Ok(hits)
}

/// Convenience wrapper returning only chunk positions.
pub fn search_indices(
    index: &FlatL2Index,
    query: &[f32],
    k: usize,
) -> Result<Vec<usize>, RetrievalError> {
    Ok(search(index, query, k)?.into_iter().map(|h| h.index).collect())
}
