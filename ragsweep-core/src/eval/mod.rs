//! Answer scoring: two LLM-judge scores plus embedding similarity.

pub mod llm_judge;

use serde::{Deserialize, Serialize};

pub use llm_judge::{
    JudgeMetric, faithfulness_prompt, parse_judge_score, relevancy_prompt, score_with_judge,
};

/// The three component scores of one run, each in [0, 1].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreCard {
    pub faithfulness: f64,
    pub relevancy: f64,
    pub similarity: f64,
}

impl ScoreCard {
    /// Arithmetic mean of the three scores.
    pub fn average(&self) -> f64 {
        (self.faithfulness + self.relevancy + self.similarity) / 3.0
    }
}

/// Cosine similarity of two vectors; 0.0 for mismatched, empty or zero
/// vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// Similarity mapped into the score range. Non-finite values score 0.
pub fn similarity_score(a: &[f32], b: &[f32]) -> f64 {
    clamp_unit(f64::from(cosine_similarity(a, b)))
}

/// Clamp into [0, 1]. NaN maps to 0 and `-0.0` to `+0.0`.
pub(crate) fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0) + 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_average_is_mean_of_three() {
        let card = ScoreCard {
            faithfulness: 0.9,
            relevancy: 0.6,
            similarity: 0.3,
        };
        assert!((card.average() - 0.6).abs() < 1e-12);
        assert_eq!(ScoreCard::default().average(), 0.0);
    }

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 2.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 2.0]), 0.0);
    }

    #[test]
    fn test_similarity_score_is_clamped() {
        assert_eq!(similarity_score(&[1.0, 0.0], &[-1.0, 0.0]), 0.0);
        assert!(similarity_score(&[2.0, 2.0], &[1.0, 1.0]) <= 1.0);
    }

    #[test]
    fn test_clamp_unit() {
        assert_eq!(clamp_unit(f64::NAN), 0.0);
        assert_eq!(clamp_unit(1.5), 1.0);
        assert_eq!(clamp_unit(-0.1), 0.0);
        assert_eq!(clamp_unit(0.25), 0.25);
        assert!(clamp_unit(-0.0).is_sign_positive());
        assert!(clamp_unit(-3.0).is_sign_positive());
    }
}
