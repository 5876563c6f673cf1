//! Property-based tests for chunking, candidate selection and scoring.

use proptest::prelude::*;

use ragsweep_core::eval::{ScoreCard, parse_judge_score};
use ragsweep_core::rag::{RagStrategy, chunk_text};

fn document(words: usize) -> String {
    (0..words)
        .map(|i| format!("w{i}"))
        .collect::<Vec<_>>()
        .join(" ")
}

fn expected_chunks(n: usize, size: usize, overlap: usize) -> usize {
    if n <= size {
        1
    } else {
        (n - size).div_ceil(size - overlap) + 1
    }
}

// --- Chunk count ---

proptest! {
    #[test]
    fn test_chunk_count_matches_formula(
        n in 1usize..400,
        size in 1usize..60,
        overlap_seed in 0usize..60,
    ) {
        let overlap = overlap_seed % size;
        let chunks = chunk_text(&document(n), size as i64, overlap as i64);
        prop_assert_eq!(chunks.len(), expected_chunks(n, size, overlap));
    }

    #[test]
    fn test_chunks_respect_size_and_cover_document(
        n in 1usize..300,
        size in 1usize..40,
        overlap_seed in 0usize..40,
    ) {
        let overlap = overlap_seed % size;
        let doc = document(n);
        let chunks = chunk_text(&doc, size as i64, overlap as i64);

        for chunk in &chunks {
            prop_assert!(chunk.split_whitespace().count() <= size);
        }
        let first = chunks.first().and_then(|c| c.split_whitespace().next());
        let last = chunks.last().and_then(|c| c.split_whitespace().last());
        prop_assert_eq!(first, Some("w0"));
        let last_word = format!("w{}", n - 1);
        prop_assert_eq!(last, Some(last_word.as_str()));
    }
}

// --- Termination and degrade paths ---

proptest! {
    #[test]
    fn test_chunking_terminates_for_any_overlap(
        n in 1usize..300,
        size in 1i64..50,
        overlap in -20i64..200,
    ) {
        let chunks = chunk_text(&document(n), size, overlap);
        prop_assert!(!chunks.is_empty());
        // Every step advances at least one word.
        prop_assert!(chunks.len() <= n);
    }

    #[test]
    fn test_oversized_overlap_behaves_like_a_third(
        n in 1usize..300,
        size in 1i64..50,
        extra in 0i64..50,
    ) {
        let doc = document(n);
        let clamped = chunk_text(&doc, size, size + extra);
        prop_assert_eq!(clamped, chunk_text(&doc, size, size / 3));
    }

    #[test]
    fn test_non_positive_size_returns_whole_text(
        n in 1usize..100,
        size in -50i64..=0,
        overlap in -10i64..10,
    ) {
        let doc = document(n);
        prop_assert_eq!(chunk_text(&doc, size, overlap), vec![doc]);
    }

    #[test]
    fn test_chunking_is_idempotent(
        n in 0usize..200,
        size in -5i64..40,
        overlap in -5i64..60,
    ) {
        let doc = document(n);
        prop_assert_eq!(chunk_text(&doc, size, overlap), chunk_text(&doc, size, overlap));
    }
}

// --- Strategy selection and scoring ---

proptest! {
    #[test]
    fn test_rerank_keeps_prefix_of_overfetched_candidates(
        candidates in proptest::collection::vec(0usize..1000, 0..40),
        top_k in 1usize..10,
        multiplier in 1usize..5,
    ) {
        let depth = RagStrategy::RerankSimulated.search_depth(top_k, multiplier);
        prop_assert_eq!(depth, top_k * multiplier);

        let fetched: Vec<usize> = candidates.into_iter().take(depth).collect();
        let selected = RagStrategy::RerankSimulated.select_candidates(fetched.clone(), top_k);
        prop_assert!(selected.len() <= top_k);
        prop_assert_eq!(&selected[..], &fetched[..selected.len()]);
    }

    #[test]
    fn test_average_is_mean_of_clamped_scores(
        f in -5.0f64..5.0,
        r in -5.0f64..5.0,
        s in 0.0f64..=1.0,
    ) {
        let faithfulness = parse_judge_score(&f.to_string()).unwrap();
        let relevancy = parse_judge_score(&r.to_string()).unwrap();
        prop_assert!((0.0..=1.0).contains(&faithfulness));
        prop_assert!((0.0..=1.0).contains(&relevancy));

        let card = ScoreCard { faithfulness, relevancy, similarity: s };
        let avg = card.average();
        prop_assert!((avg - (faithfulness + relevancy + s) / 3.0).abs() < 1e-12);
        prop_assert!((0.0..=1.0).contains(&avg));
    }
}
