use anyhow::Context;
use clap::Parser as _;
use std::path::{Path, PathBuf};

use irbench_core::config::{Config, RunConfig};
use irbench_core::loader::load_corpus_and_queries;
use irbench_core::results::ResultSet;
use irbench_core::types::Strategy;
use irbench_embed::embedder_for_model;
use irbench_pipeline::RetrievalPipeline;

#[derive(clap::Parser)]
#[command(name = "irbench")]
#[command(about = "Exact BM25 and dense retrieval over BEIR-format datasets")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Index the corpus with one strategy and write the top-K result artifact
    Run {
        /// lexical (BM25) or dense (cosine over embeddings)
        #[arg(short, long)]
        strategy: Strategy,

        /// Dataset directory holding corpus.jsonl and queries.jsonl
        #[arg(long)]
        data_dir: Option<PathBuf>,

        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Documents kept per query
        #[arg(short = 'k', long)]
        top_k: Option<usize>,

        #[arg(long)]
        k1: Option<f64>,

        #[arg(long)]
        b: Option<f64>,

        /// Embedding model: all-MiniLM-L6-v2, minilm:<dir>, hash[:<dim>] or file:<path>
        #[arg(long)]
        model: Option<String>,

        /// Worker threads for query scoring
        #[arg(long)]
        threads: Option<usize>,

        #[arg(long)]
        no_progress: bool,
    },

    /// Summarize a result artifact
    Inspect {
        path: PathBuf,
    },
}

struct Overrides {
    data_dir: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    top_k: Option<usize>,
    k1: Option<f64>,
    b: Option<f64>,
    model: Option<String>,
    threads: Option<usize>,
    no_progress: bool,
}

impl Overrides {
    fn apply(self, cfg: &mut RunConfig) {
        if let Some(dir) = self.data_dir { cfg.data_dir = dir; }
        if let Some(dir) = self.output_dir { cfg.output_dir = dir; }
        if let Some(k) = self.top_k { cfg.top_k = k; }
        if let Some(k1) = self.k1 { cfg.bm25.k1 = k1; }
        if let Some(b) = self.b { cfg.bm25.b = b; }
        if let Some(model) = self.model { cfg.embedding.model = model; }
        if self.threads.is_some() { cfg.threads = self.threads; }
        if self.no_progress { cfg.progress = false; }
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match Args::parse().command {
        Command::Run { strategy, data_dir, output_dir, top_k, k1, b, model, threads, no_progress } => {
            let overrides = Overrides { data_dir, output_dir, top_k, k1, b, model, threads, no_progress };
            run(strategy, overrides)
        }
        Command::Inspect { path } => inspect(&path),
    }
}

fn run(strategy: Strategy, overrides: Overrides) -> anyhow::Result<()> {
    let config = Config::load().map_err(|e| { eprintln!("Error loading config: {}", e); e })?;
    let mut cfg = config.run_config()?;
    overrides.apply(&mut cfg);
    let pipeline = RetrievalPipeline::new(cfg)?;
    let cfg = pipeline.config();

    let (corpus, queries) = load_corpus_and_queries(cfg)
        .with_context(|| format!("loading dataset from {}", cfg.data_dir.display()))?;
    let embedder = match strategy {
        Strategy::Dense => Some(embedder_for_model(&cfg.embedding.model)?),
        Strategy::Lexical => None,
    };

    let report = pipeline.run(strategy, &corpus, &queries, embedder.as_deref())?;
    let path = report
        .write(&cfg.output_dir)
        .with_context(|| format!("writing results to {}", cfg.output_dir.display()))?;
    println!("✅ {} results for {} queries written to {}", strategy, report.results.len(), path.display());

    if !report.is_complete() {
        for failure in &report.failures {
            eprintln!("query {}: {}", failure.query_id, failure.error);
        }
        anyhow::bail!("{} of {} queries failed", report.failures.len(), queries.len());
    }
    Ok(())
}

fn inspect(path: &Path) -> anyhow::Result<()> {
    let results = ResultSet::read_json(path)?;
    let total: usize = results.iter().map(|(_, entry)| entry.len()).sum();
    let mean = if results.is_empty() { 0.0 } else { total as f64 / results.len() as f64 };
    let sorted = results.iter().all(|(_, entry)| entry.is_sorted_by_score());
    println!("Queries: {}", results.len());
    println!("Mean result length: {:.2}", mean);
    println!("Sorted by score: {}", if sorted { "yes" } else { "no" });
    Ok(())
}
