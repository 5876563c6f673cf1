//! ragsweep CLI: runs one RAG configuration sweep and reports the best setup.

mod progress;

use anyhow::Context;
use clap::Parser;
use ragsweep_core::sweep::report::write_outputs;
use ragsweep_core::{
    Capabilities, ChatModel, LlmBackend, OpenAiCompatibleProvider, Sweep, SweepConfig,
    SweepReport, create_embedder, load_config, load_corpus,
};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::progress::ProgressObserver;

/// Grid-search chunking and retrieval settings for a RAG pipeline
#[derive(Parser, Debug)]
#[command(name = "ragsweep", version, about, long_about = None)]
struct Cli {
    /// Workspace directory (holds ragsweep.toml; relative paths resolve here)
    #[arg(short, long, default_value = ".")]
    workspace: PathBuf,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Corpus file (overrides corpus.path)
    #[arg(long)]
    corpus: Option<PathBuf>,

    /// Directory for results.json and report.txt (overrides report.output_dir)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Number of ranked configurations to show (overrides report.top_n)
    #[arg(short = 'n', long)]
    top: Option<usize>,

    /// Print the full sweep outcome as JSON instead of the text report
    #[arg(long)]
    json: bool,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long)]
    quiet: bool,
}

impl Cli {
    fn apply_overrides(&self, config: &mut SweepConfig) {
        if let Some(corpus) = &self.corpus {
            config.corpus.path = corpus.clone();
        }
        if let Some(dir) = &self.output_dir {
            config.report.output_dir = dir.clone();
        }
        if let Some(top) = self.top {
            config.report.top_n = top;
        }
    }

    fn stderr_filter(&self) -> &'static str {
        match self.verbose {
            0 if self.quiet => "error",
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}

/// Relative paths are taken from the workspace, absolute ones unchanged.
fn resolve_path(workspace: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        workspace.join(path)
    }
}

fn main() -> anyhow::Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // Human-readable layer for stderr
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::new(cli.stderr_filter()));

    // JSON file layer for structured logging
    let log_dir = directories::ProjectDirs::from("dev", "ragsweep", "ragsweep")
        .map(|d| d.data_dir().join("logs"))
        .unwrap_or_else(|| PathBuf::from("."));
    let _ = std::fs::create_dir_all(&log_dir);
    let file_appender = tracing_appender::rolling::daily(&log_dir, "ragsweep.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let json_layer = tracing_subscriber::fmt::layer()
        .json()
        .with_writer(non_blocking)
        .with_filter(EnvFilter::new("debug"));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let workspace = cli
        .workspace
        .canonicalize()
        .with_context(|| format!("Workspace not found: {}", cli.workspace.display()))?;

    let mut config = load_config(Some(&workspace), cli.config.as_deref())
        .context("Configuration error")?;
    cli.apply_overrides(&mut config);

    let corpus_path = resolve_path(&workspace, &config.corpus.path);
    let corpus = load_corpus(&corpus_path)
        .with_context(|| format!("Failed to load corpus from {}", corpus_path.display()))?;
    info!(
        path = %corpus_path.display(),
        documents = corpus.len(),
        words = corpus.total_words(),
        "Loaded corpus"
    );

    let embedder = create_embedder(&config.embedding).context("Failed to create embedder")?;
    let provider =
        OpenAiCompatibleProvider::new(&config.llm).context("Failed to create LLM provider")?;
    let backend = LlmBackend::new(provider, config.llm.clone());
    info!(
        embedder = embedder.provider_name(),
        dimensions = embedder.dimensions(),
        generation_model = backend.model().model_name(),
        judge_model = config.llm.judge_model(),
        "Providers ready"
    );
    let caps = Capabilities::with_backend(embedder.as_ref(), &backend);

    let progress = ProgressObserver::new(cli.quiet || cli.json);
    let outcome = Sweep::new(&config.sweep, &config.evaluation, caps)
        .with_observer(&progress)
        .run(&corpus);
    progress.finish();

    let report = SweepReport::new(&outcome, config.report.top_n);
    let rendered = report.render();
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        println!("{rendered}");
    }

    let output_dir = resolve_path(&workspace, &config.report.output_dir);
    let paths = write_outputs(&outcome, &rendered, &output_dir)
        .with_context(|| format!("Failed to write results to {}", output_dir.display()))?;
    if !cli.quiet {
        eprintln!(
            "Results: {}\nReport:  {}",
            paths.results.display(),
            paths.report.display()
        );
    }

    Ok(())
}
