//! Exact (brute-force) L2 vector index over one configuration's chunks.

use crate::embeddings::Embedder;
use crate::error::ConfigBuildError;
use crate::rag::ConfigKey;
use tracing::{debug, info};

/// Flat, row-major matrix of equal-length vectors searched exhaustively by
/// squared L2 distance. Row position is the chunk id.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatL2Index {
    dim: usize,
    data: Vec<f32>,
}

impl FlatL2Index {
    /// Create an empty index for vectors of `dim` components.
    pub fn new(dim: usize) -> Self {
        Self {
            dim,
            data: Vec::new(),
        }
    }

    /// Append one vector. Its length must equal `dim()`.
    pub fn add(&mut self, vector: &[f32]) -> Result<(), usize> {
        if vector.len() != self.dim {
            return Err(vector.len());
        }
        self.data.extend_from_slice(vector);
        Ok(())
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Number of stored vectors.
    pub fn len(&self) -> usize {
        if self.dim == 0 { 0 } else { self.data.len() / self.dim }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn vector(&self, idx: usize) -> Option<&[f32]> {
        let start = idx.checked_mul(self.dim)?;
        self.data.get(start..start + self.dim)
    }

    /// Iterate `(row, vector)` pairs in insertion order.
    pub fn rows(&self) -> impl Iterator<Item = (usize, &[f32])> {
        self.data.chunks_exact(self.dim.max(1)).enumerate()
    }
}

/// Squared euclidean distance.
pub fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

/// Artifacts owned by one configuration key: the flat chunk list and the
/// index built over its embeddings. Shared read-only by every strategy and
/// top-k value under that key.
#[derive(Debug, Clone)]
pub struct IndexedCorpus {
    pub key: ConfigKey,
    pub chunks: Vec<String>,
    pub index: FlatL2Index,
}

impl IndexedCorpus {
    pub fn chunk(&self, idx: usize) -> Option<&str> {
        self.chunks.get(idx).map(String::as_str)
    }
}

/// Embed all chunks in one batched call and index the result.
///
/// The embedding matrix must have exactly one row per chunk and a single
/// non-zero dimensionality.
pub fn build_index(
    key: ConfigKey,
    chunks: Vec<String>,
    embedder: &dyn Embedder,
) -> Result<IndexedCorpus, ConfigBuildError> {
    if chunks.is_empty() {
        return Err(ConfigBuildError::NoChunks { key });
    }

    let refs: Vec<&str> = chunks.iter().map(String::as_str).collect();
    let embeddings = embedder
        .embed_batch(&refs)
        .map_err(|source| ConfigBuildError::EmbeddingFailed { key, source })?;

    if embeddings.len() != chunks.len() {
        return Err(ConfigBuildError::RowCountMismatch {
            key,
            expected: chunks.len(),
            actual: embeddings.len(),
        });
    }

    let dim = embeddings.first().map_or(0, Vec::len);
    if dim == 0 {
        return Err(ConfigBuildError::EmptyIndex { key });
    }

    let mut index = FlatL2Index::new(dim);
    for (row, vector) in embeddings.iter().enumerate() {
        index
            .add(vector)
            .map_err(|actual| ConfigBuildError::DimensionMismatch {
                key,
                row,
                expected: dim,
                actual,
            })?;
    }
    debug!(%key, dim, rows = index.len(), "Built flat L2 index");

    if index.is_empty() {
        return Err(ConfigBuildError::EmptyIndex { key });
    }

    info!(
        chunk_size = key.chunk_size,
        overlap = key.overlap,
        chunks = chunks.len(),
        dim,
        "Indexed configuration"
    );
    Ok(IndexedCorpus { key, chunks, index })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::LocalEmbedder;
    use crate::error::ProviderError;

    /// Returns whatever matrix it was constructed with.
    struct FixedEmbedder(Vec<Vec<f32>>);

    impl Embedder for FixedEmbedder {
        fn embed_batch(&self, _texts: &[&str]) -> Result<Vec<Vec<f32>>, ProviderError> {
            Ok(self.0.clone())
        }
        fn dimensions(&self) -> usize {
            0
        }
        fn provider_name(&self) -> &str {
            "fixed"
        }
    }

    struct FailingEmbedder;

    impl Embedder for FailingEmbedder {
        fn embed_batch(&self, _texts: &[&str]) -> Result<Vec<Vec<f32>>, ProviderError> {
            Err(ProviderError::Request {
                provider: "failing".into(),
                message: "connection refused".into(),
            })
        }
        fn dimensions(&self) -> usize {
            0
        }
        fn provider_name(&self) -> &str {
            "failing"
        }
    }

    fn key() -> ConfigKey {
        ConfigKey::new(5, 2)
    }

    fn chunks(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("chunk {i}")).collect()
    }

    #[test]
    fn test_flat_index_add_and_lookup() {
        let mut index = FlatL2Index::new(2);
        index.add(&[1.0, 2.0]).unwrap();
        index.add(&[3.0, 4.0]).unwrap();
        assert_eq!(index.len(), 2);
        assert_eq!(index.vector(1), Some(&[3.0, 4.0][..]));
        assert_eq!(index.vector(2), None);
        assert_eq!(index.add(&[1.0]), Err(1));
        assert_eq!(index.rows().count(), 2);
    }

    #[test]
    fn test_squared_l2() {
        assert_eq!(squared_l2(&[0.0, 0.0], &[3.0, 4.0]), 25.0);
    }

    #[test]
    fn test_build_index_with_local_embedder() {
        let built = build_index(key(), chunks(3), &LocalEmbedder::new(16)).unwrap();
        assert_eq!(built.index.len(), 3);
        assert_eq!(built.index.dim(), 16);
        assert_eq!(built.chunk(2), Some("chunk 2"));
    }

    #[test]
    fn test_build_index_rejects_no_chunks() {
        let err = build_index(key(), vec![], &LocalEmbedder::new(4)).unwrap_err();
        assert!(matches!(err, ConfigBuildError::NoChunks { .. }));
    }

    #[test]
    fn test_build_index_row_count_mismatch() {
        let embedder = FixedEmbedder(vec![vec![1.0, 0.0]]);
        let err = build_index(key(), chunks(2), &embedder).unwrap_err();
        assert!(matches!(
            err,
            ConfigBuildError::RowCountMismatch {
                expected: 2,
                actual: 1,
                ..
            }
        ));
    }

    #[test]
    fn test_build_index_ragged_dimensions() {
        let embedder = FixedEmbedder(vec![vec![1.0, 0.0], vec![1.0, 0.0, 0.0]]);
        let err = build_index(key(), chunks(2), &embedder).unwrap_err();
        assert!(matches!(
            err,
            ConfigBuildError::DimensionMismatch {
                row: 1,
                expected: 2,
                actual: 3,
                ..
            }
        ));
    }

    #[test]
    fn test_build_index_zero_dimension() {
        let embedder = FixedEmbedder(vec![vec![], vec![]]);
        let err = build_index(key(), chunks(2), &embedder).unwrap_err();
        assert!(matches!(err, ConfigBuildError::EmptyIndex { .. }));
    }

    #[test]
    fn test_build_index_embedding_failure() {
        let err = build_index(key(), chunks(2), &FailingEmbedder).unwrap_err();
        assert!(matches!(err, ConfigBuildError::EmbeddingFailed { .. }));
        assert!(err.to_string().contains("connection refused"));
    }
}
