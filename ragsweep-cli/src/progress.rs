//! Terminal progress reporting for a running sweep.

use indicatif::{ProgressBar, ProgressStyle};
use ragsweep_core::error::ConfigBuildError;
use ragsweep_core::rag::ConfigKey;
use ragsweep_core::sweep::{RunRecord, SweepObserver};

/// Drives an `indicatif` bar over the parameter combinations.
pub struct ProgressObserver {
    bar: ProgressBar,
}

impl ProgressObserver {
    pub fn new(hidden: bool) -> Self {
        let bar = if hidden {
            ProgressBar::hidden()
        } else {
            ProgressBar::new(0)
        };
        bar.set_style(
            ProgressStyle::with_template("{msg:<40} [{bar:40}] {pos}/{len} ({elapsed})")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        bar.set_message("Testing configurations");
        Self { bar }
    }

    pub fn finish(&self) {
        self.bar.finish_with_message("Sweep complete");
    }
}

impl SweepObserver for ProgressObserver {
    fn on_start(&self, combinations: usize) {
        self.bar.set_length(combinations as u64);
    }

    fn on_record(&self, record: &RunRecord) {
        self.bar.set_message(format!(
            "C={} O={} K={} {} {:.2}",
            record.chunk_size,
            record.overlap,
            record.top_k,
            record.strategy.name(),
            record.avg_score
        ));
    }

    fn on_config_failed(&self, key: ConfigKey, error: &ConfigBuildError) {
        self.bar.println(format!("  skipped {key}: {error}"));
    }

    fn on_combination_done(&self, _key: ConfigKey, _top_k: usize) {
        self.bar.inc(1);
    }
}
