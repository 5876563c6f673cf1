//! LLM-as-judge scoring.

use super::clamp_unit;
use crate::capabilities::Judge;
use crate::error::JudgeParseError;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

/// What a judge call rates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JudgeMetric {
    /// Answer versus the reference answer.
    Faithfulness,
    /// Answer versus the original query.
    Relevancy,
}

impl fmt::Display for JudgeMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JudgeMetric::Faithfulness => f.write_str("faithfulness"),
            JudgeMetric::Relevancy => f.write_str("relevancy"),
        }
    }
}

pub fn faithfulness_prompt(response: &str, reference_answer: &str) -> String {
    format!(
        "Rate the faithfulness of the response to the provided true answer on a scale from 0 to 1, \
         where 1 is completely faithful. Response: {response}\nTrue Answer: {reference_answer}"
    )
}

pub fn relevancy_prompt(query: &str, response: &str) -> String {
    format!(
        "Rate the relevancy of the response to the query on a scale from 0 to 1, \
         where 1 is highly relevant. Query: {query}\nResponse: {response}"
    )
}

/// Parse a judge completion as a bare number, clamped to [0, 1].
pub fn parse_judge_score(raw: &str) -> Result<f64, JudgeParseError> {
    let value: f64 = raw.trim().parse().map_err(|_| JudgeParseError {
        raw: raw.to_string(),
    })?;
    if value.is_nan() {
        return Err(JudgeParseError {
            raw: raw.to_string(),
        });
    }
    Ok(clamp_unit(value))
}

/// Ask the judge and map any failure to 0.0.
pub fn score_with_judge(judge: &dyn Judge, metric: JudgeMetric, prompt: &str) -> f64 {
    let raw = match judge.judge(prompt) {
        Ok(raw) => raw,
        Err(e) => {
            warn!(%metric, error = %e, "Judge call failed, score set to 0.0");
            return 0.0;
        }
    };
    match parse_judge_score(&raw) {
        Ok(score) => score,
        Err(e) => {
            warn!(%metric, error = %e, "Unparseable judge score, score set to 0.0");
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderError;

    struct Canned(&'static str);

    impl Judge for Canned {
        fn judge(&self, _prompt: &str) -> Result<String, ProviderError> {
            Ok(self.0.to_string())
        }
    }

    struct Broken;

    impl Judge for Broken {
        fn judge(&self, _prompt: &str) -> Result<String, ProviderError> {
            Err(ProviderError::Status {
                provider: "judge".into(),
                code: 503,
                body: "unavailable".into(),
            })
        }
    }

    #[test]
    fn test_parse_plain_numbers() {
        assert_eq!(parse_judge_score("0.8").unwrap(), 0.8);
        assert_eq!(parse_judge_score("  1\n").unwrap(), 1.0);
        assert_eq!(parse_judge_score("0").unwrap(), 0.0);
    }

    #[test]
    fn test_parse_clamps_out_of_range() {
        assert_eq!(parse_judge_score("7").unwrap(), 1.0);
        assert_eq!(parse_judge_score("-0.5").unwrap(), 0.0);
        assert_eq!(parse_judge_score("inf").unwrap(), 1.0);
    }

    #[test]
    fn test_parse_negative_zero_is_positive_zero() {
        let score = parse_judge_score("-0").unwrap();
        assert!(score.is_sign_positive());
        assert_eq!(format!("{score:.3}"), "0.000");
    }

    #[test]
    fn test_parse_rejects_text() {
        let err = parse_judge_score("excellent").unwrap_err();
        assert_eq!(err.raw, "excellent");
        assert!(parse_judge_score("NaN").is_err());
        assert!(parse_judge_score("Score: 0.9").is_err());
        assert!(parse_judge_score("").is_err());
    }

    #[test]
    fn test_score_with_judge_fallbacks() {
        assert_eq!(score_with_judge(&Canned("0.4"), JudgeMetric::Relevancy, "p"), 0.4);
        assert_eq!(
            score_with_judge(&Canned("excellent"), JudgeMetric::Faithfulness, "p"),
            0.0
        );
        assert_eq!(score_with_judge(&Broken, JudgeMetric::Relevancy, "p"), 0.0);
    }

    #[test]
    fn test_prompts_embed_inputs() {
        let f = faithfulness_prompt("the answer", "the truth");
        assert!(f.starts_with("Rate the faithfulness"));
        assert!(f.ends_with("Response: the answer\nTrue Answer: the truth"));
        let r = relevancy_prompt("the query", "the answer");
        assert!(r.contains("where 1 is highly relevant."));
        assert!(r.ends_with("Query: the query\nResponse: the answer"));
    }
}
