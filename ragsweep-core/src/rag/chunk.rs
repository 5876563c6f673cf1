//! Word-window chunking.
//!
//! Documents are split on whitespace and cut into windows of `chunk_size`
//! words, consecutive windows sharing `chunk_overlap` words. Chunks are
//! re-joined with single spaces.

use crate::corpus::Document;
use crate::rag::ConfigKey;
use tracing::{debug, warn};

/// How a `(chunk_size, chunk_overlap)` pair is applied to a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkPlan {
    /// `chunk_size` was not a positive integer: the document is kept whole.
    WholeText,
    /// Sliding windows; `overlap < size` always holds.
    Windows { size: usize, overlap: usize },
}

impl ChunkPlan {
    /// Normalize raw configured values.
    ///
    /// A non-positive size degrades to [`ChunkPlan::WholeText`], a negative
    /// overlap becomes 0, and an overlap `>= size` is reduced to `size / 3`.
    pub fn resolve(chunk_size: i64, chunk_overlap: i64) -> Self {
        if chunk_size <= 0 {
            warn!(chunk_size, "Invalid chunk_size, returning whole text");
            return Self::WholeText;
        }
        let size = chunk_size as usize;

        let mut overlap = if chunk_overlap < 0 {
            warn!(chunk_overlap, "Invalid chunk_overlap, setting to 0");
            0
        } else {
            chunk_overlap as usize
        };

        if overlap >= size {
            let adjusted = size / 3;
            warn!(
                chunk_overlap = overlap,
                chunk_size = size,
                adjusted,
                "chunk_overlap >= chunk_size, adjusting"
            );
            overlap = adjusted;
        }

        Self::Windows { size, overlap }
    }
}

/// Chunk one document's text into overlapping word windows.
pub fn chunk_text(text: &str, chunk_size: i64, chunk_overlap: i64) -> Vec<String> {
    let (size, overlap) = match ChunkPlan::resolve(chunk_size, chunk_overlap) {
        ChunkPlan::WholeText => return vec![text.to_string()],
        ChunkPlan::Windows { size, overlap } => (size, overlap),
    };

    let words: Vec<&str> = text.split_whitespace().collect();
    let total = words.len();
    let mut chunks = Vec::new();
    let mut start = 0;

    while start < total {
        let end = (start + size).min(total);
        chunks.push(words[start..end].join(" "));
        if end == total {
            break;
        }

        let mut next = (start + size).saturating_sub(overlap);
        if next <= start {
            warn!(start, "Chunking stuck, forcing progress");
            next = start + 1;
        }
        start = next;
    }
    chunks
}

/// Chunk every document for one configuration key and concatenate the
/// results in document order. Positions in the returned list are the ids
/// used by the vector index.
pub fn chunk_corpus(documents: &[Document], key: ConfigKey) -> Vec<String> {
    let mut all = Vec::new();
    for (doc_idx, doc) in documents.iter().enumerate() {
        let chunks = chunk_text(&doc.text, key.chunk_size, key.overlap);
        if chunks.is_empty() {
            warn!(doc_idx, %key, "No chunks created for document");
            continue;
        }
        all.extend(chunks);
    }
    debug!(%key, chunks = all.len(), documents = documents.len(), "Chunked corpus");
    all
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn numbered_words(n: usize) -> String {
        (0..n).map(|i| format!("w{i}")).collect::<Vec<_>>().join(" ")
    }

    fn span(from: usize, to: usize) -> String {
        (from..to).map(|i| format!("w{i}")).collect::<Vec<_>>().join(" ")
    }

    #[test]
    fn test_twelve_words_size_five_overlap_two() {
        let chunks = chunk_text(&numbered_words(12), 5, 2);
        assert_eq!(
            chunks,
            vec![span(0, 5), span(3, 8), span(6, 11), span(9, 12)]
        );
    }

    #[test]
    fn test_short_document_is_single_chunk() {
        let chunks = chunk_text("only three words", 5, 2);
        assert_eq!(chunks, vec!["only three words".to_string()]);
    }

    #[test]
    fn test_overlap_equal_to_size_is_clamped() {
        assert_eq!(
            ChunkPlan::resolve(5, 5),
            ChunkPlan::Windows {
                size: 5,
                overlap: 1
            }
        );
        let chunks = chunk_text(&numbered_words(12), 5, 5);
        assert_eq!(
            chunks,
            vec![span(0, 5), span(4, 9), span(8, 12)]
        );
    }

    #[test]
    fn test_size_one_overlap_clamps_to_zero() {
        assert_eq!(
            ChunkPlan::resolve(1, 3),
            ChunkPlan::Windows {
                size: 1,
                overlap: 0
            }
        );
        assert_eq!(chunk_text("a b c", 1, 3), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_invalid_size_returns_whole_text() {
        let text = "  keep   this\ntext exactly ";
        assert_eq!(ChunkPlan::resolve(0, 2), ChunkPlan::WholeText);
        assert_eq!(chunk_text(text, 0, 2), vec![text.to_string()]);
        assert_eq!(chunk_text(text, -4, 0), vec![text.to_string()]);
    }

    #[test]
    fn test_negative_overlap_becomes_zero() {
        let chunks = chunk_text(&numbered_words(6), 3, -1);
        assert_eq!(chunks, vec![span(0, 3), span(3, 6)]);
    }

    #[test]
    fn test_whitespace_is_normalized() {
        let chunks = chunk_text("a\tb\n\nc   d", 2, 0);
        assert_eq!(chunks, vec!["a b", "c d"]);
    }

    #[test]
    fn test_empty_text_produces_no_chunks() {
        assert!(chunk_text("", 5, 1).is_empty());
        assert!(chunk_text("   \n", 5, 1).is_empty());
    }

    #[test]
    fn test_chunk_corpus_concatenates_in_order() {
        let docs = vec![
            Document::new(numbered_words(4)),
            Document::new("   "),
            Document::new("x y z"),
        ];
        let chunks = chunk_corpus(&docs, ConfigKey::new(3, 1));
        assert_eq!(chunks, vec![span(0, 3), span(2, 4), "x y z".to_string()]);
    }
}
