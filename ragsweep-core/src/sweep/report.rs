//! Ranking and reporting of sweep results.

use super::SweepOutcome;
use super::runner::RunRecord;
use crate::error::SweepError;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

pub const RESULTS_FILE: &str = "results.json";
pub const REPORT_FILE: &str = "report.txt";

const ANSWER_PREVIEW_CHARS: usize = 48;
const TABLE_WIDTH: usize = 150;

/// Sort records by average score, best first. Ties keep sweep order.
pub fn rank_records(records: &[RunRecord]) -> Vec<&RunRecord> {
    let mut ranked: Vec<&RunRecord> = records.iter().collect();
    ranked.sort_by(|a, b| rank_key(b.avg_score).total_cmp(&rank_key(a.avg_score)));
    ranked
}

/// `total_cmp` orders `-0.0` below `0.0`; fold both zeros together.
fn rank_key(score: f64) -> f64 {
    score + 0.0
}

/// A ranked view over a finished sweep.
pub struct SweepReport<'a> {
    outcome: &'a SweepOutcome,
    ranked: Vec<&'a RunRecord>,
    top_n: usize,
}

impl<'a> SweepReport<'a> {
    pub fn new(outcome: &'a SweepOutcome, top_n: usize) -> Self {
        Self {
            outcome,
            ranked: rank_records(&outcome.records),
            top_n,
        }
    }

    pub fn ranked(&self) -> &[&'a RunRecord] {
        &self.ranked
    }

    pub fn best(&self) -> Option<&'a RunRecord> {
        self.ranked.first().copied()
    }

    /// Render the full text report.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let outcome = self.outcome;
        let _ = writeln!(out, "=== RAG Sweep {} ===", outcome.id);
        let _ = writeln!(out, "Query: {}", outcome.query);
        let _ = writeln!(
            out,
            "Started: {}  Finished: {}  ({:.1}s)",
            outcome.started_at.to_rfc3339(),
            outcome.finished_at.to_rfc3339(),
            outcome.duration_secs()
        );
        let _ = writeln!(
            out,
            "Results: {}  Failed configurations: {}",
            outcome.records.len(),
            outcome.failed_keys.len()
        );
        for failed in &outcome.failed_keys {
            let _ = writeln!(
                out,
                "  - chunk_size={}, overlap={}: {}",
                failed.chunk_size, failed.overlap, failed.error
            );
        }
        out.push('\n');

        let Some(best) = self.best() else {
            out.push_str("No results were produced: every configuration failed or the grid was empty.\n");
            return out;
        };

        let shown = self.top_n.min(self.ranked.len());
        let _ = writeln!(out, "--- Top {shown} Performing Configurations ---");
        out.push_str(&render_table(&self.ranked[..shown]));
        out.push('\n');
        out.push_str(&render_best(best));
        out
    }
}

/// Fixed-width table of records in the given order.
pub fn render_table(records: &[&RunRecord]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:>4} {:>10} {:>7} {:>5}  {:<22} {:>9} {:>12} {:>9} {:>10} {:>8}  Answer",
        "#",
        "chunk_size",
        "overlap",
        "top_k",
        "strategy",
        "avg_score",
        "faithfulness",
        "relevancy",
        "similarity",
        "time_sec"
    );
    let _ = writeln!(out, "{}", "-".repeat(TABLE_WIDTH));
    for (rank, r) in records.iter().enumerate() {
        let _ = writeln!(
            out,
            "{:>4} {:>10} {:>7} {:>5}  {:<22} {:>9.3} {:>12.3} {:>9.3} {:>10.3} {:>8.2}  {}",
            rank + 1,
            r.chunk_size,
            r.overlap,
            r.top_k,
            r.strategy.name(),
            r.avg_score,
            r.faithfulness,
            r.relevancy,
            r.similarity_score,
            r.time_sec,
            answer_preview(&r.answer)
        );
    }
    out
}

/// Summary of the single best record, including its full answer.
pub fn render_best(best: &RunRecord) -> String {
    let mut out = String::new();
    out.push_str("--- Best Configuration Summary ---\n");
    let _ = writeln!(out, "Chunk Size: {} words", best.chunk_size);
    let _ = writeln!(out, "Overlap: {} words", best.overlap);
    let _ = writeln!(out, "Top-K Retrieved: {} chunks", best.top_k);
    let _ = writeln!(out, "Strategy: {}", best.strategy);
    let _ = writeln!(out, "---> Average Score: {:.3}", best.avg_score);
    let _ = writeln!(
        out,
        "      (Faithfulness: {:.3}, Relevancy: {:.3}, Similarity: {:.3})",
        best.faithfulness, best.relevancy, best.similarity_score
    );
    let _ = writeln!(out, "Time Taken: {:.2} seconds", best.time_sec);
    if let Some(q) = &best.rewritten_query {
        let _ = writeln!(out, "Rewritten Query: {q}");
    }
    let _ = writeln!(out, "\nBest Answer Generated:\n{}", best.answer);
    out
}

/// Single-line, length-limited answer for table cells.
fn answer_preview(answer: &str) -> String {
    let flat = answer.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= ANSWER_PREVIEW_CHARS {
        flat
    } else {
        let head: String = flat.chars().take(ANSWER_PREVIEW_CHARS - 3).collect();
        format!("{head}...")
    }
}

/// Paths written by [`write_outputs`].
#[derive(Debug, Clone)]
pub struct ReportPaths {
    pub results: PathBuf,
    pub report: PathBuf,
}

/// Persist all records as pretty JSON and the rendered report as text.
pub fn write_outputs(
    outcome: &SweepOutcome,
    rendered: &str,
    dir: &Path,
) -> Result<ReportPaths, SweepError> {
    fs::create_dir_all(dir)?;
    let results = dir.join(RESULTS_FILE);
    let report = dir.join(REPORT_FILE);

    fs::write(&results, serde_json::to_string_pretty(outcome)?)?;
    fs::write(&report, rendered)?;
    info!(
        results = %results.display(),
        report = %report.display(),
        "Wrote sweep outputs"
    );
    Ok(ReportPaths { results, report })
}
