//! irbench-pipeline
//!
//! Builds one strategy's index over the whole corpus, then scores, selects
//! and assembles every query independently. The per-query stage only sees the
//! `Scorer` capability.

use rayon::prelude::*;
use std::path::{Path, PathBuf};

use irbench_core::config::RunConfig;
use irbench_core::progress::progress_bar;
use irbench_core::results::{assemble, QueryResult, ResultSet};
use irbench_core::topk::select_top_k;
use irbench_core::traits::{Embedder, Scorer};
use irbench_core::types::{Corpus, Query, QueryId, QuerySet, Strategy};
use irbench_core::{Error, Result, Stage};
use irbench_text::LexicalScorer;
use irbench_vector::DenseScorer;

/// A built index for one of the two strategies. A dense engine borrows the
/// embedder it was built with.
pub enum Engine<'e> {
    Lexical(LexicalScorer),
    Dense(DenseScorer<'e>),
}

impl<'e> Engine<'e> {
    /// Build the index for `strategy`. Corpus (and, for dense, query)
    /// encoding completes before this returns.
    pub fn build(
        strategy: Strategy,
        corpus: &Corpus,
        queries: &QuerySet,
        config: &RunConfig,
        embedder: Option<&'e dyn Embedder>,
    ) -> Result<Self> {
        match strategy {
            Strategy::Lexical => Ok(Engine::Lexical(LexicalScorer::build(corpus, &config.bm25)?)),
            Strategy::Dense => {
                let embedder = embedder
                    .ok_or_else(|| Error::InvalidConfig("dense retrieval requires an embedder".to_string()))?;
                let scorer = DenseScorer::build(corpus, queries, embedder, config.embedding.batch_size, config.progress)?;
                Ok(Engine::Dense(scorer))
            }
        }
    }

    pub fn strategy(&self) -> Strategy {
        match self {
            Engine::Lexical(_) => Strategy::Lexical,
            Engine::Dense(_) => Strategy::Dense,
        }
    }
}

impl Scorer for Engine<'_> {
    fn num_docs(&self) -> usize {
        match self {
            Engine::Lexical(s) => s.num_docs(),
            Engine::Dense(s) => s.num_docs(),
        }
    }

    fn score(&self, query: &Query) -> Result<Vec<f64>> {
        match self {
            Engine::Lexical(s) => s.score(query),
            Engine::Dense(s) => s.score(query),
        }
    }
}

/// A query that could not be scored. Its siblings are unaffected.
#[derive(Debug)]
pub struct QueryFailure {
    pub query_id: QueryId,
    pub error: Error,
}

#[derive(Debug)]
pub struct RunReport {
    pub strategy: Strategy,
    pub results: ResultSet,
    pub failures: Vec<QueryFailure>,
}

impl RunReport {
    pub fn is_complete(&self) -> bool { self.failures.is_empty() }

    /// Write the result artifact into `output_dir` under the strategy's file name.
    pub fn write(&self, output_dir: &Path) -> Result<PathBuf> {
        let path = output_dir.join(self.strategy.results_file_name());
        self.results.write_json(&path)?;
        Ok(path)
    }
}

/// Score one query and keep its top `k` documents.
pub fn retrieve_one<S: Scorer + ?Sized>(scorer: &S, corpus: &Corpus, query: &Query, k: usize) -> Result<QueryResult> {
    let scores = scorer.score(query)?;
    if scores.len() != corpus.len() {
        return Err(Error::DimensionMismatch {
            id: query.id.clone(),
            stage: Stage::Query,
            expected: corpus.len(),
            found: scores.len(),
        });
    }
    if let Some(pos) = scores.iter().position(|s| !s.is_finite()) {
        return Err(Error::NonFiniteScore {
            query_id: query.id.clone(),
            doc_id: corpus.doc_id(pos).unwrap_or_default().to_string(),
        });
    }
    Ok(assemble(corpus, &select_top_k(&scores, k)))
}

pub struct RetrievalPipeline {
    config: RunConfig,
}

impl RetrievalPipeline {
    pub fn new(config: RunConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &RunConfig { &self.config }

    /// Build the strategy's index, then run every query against it.
    pub fn run(
        &self,
        strategy: Strategy,
        corpus: &Corpus,
        queries: &QuerySet,
        embedder: Option<&dyn Embedder>,
    ) -> Result<RunReport> {
        tracing::info!(%strategy, documents = corpus.len(), queries = queries.len(), top_k = self.config.top_k, "starting retrieval run");
        let engine = Engine::build(strategy, corpus, queries, &self.config, embedder)?;
        let (results, failures) = self.run_queries(&engine, corpus, queries)?;
        tracing::info!(%strategy, completed = results.len(), failed = failures.len(), "retrieval run finished");
        Ok(RunReport { strategy, results, failures })
    }

    /// Score every query in parallel against a built scorer. Each query's
    /// entry is merged only once complete, in query-set order.
    pub fn run_queries<S: Scorer + ?Sized>(
        &self,
        scorer: &S,
        corpus: &Corpus,
        queries: &QuerySet,
    ) -> Result<(ResultSet, Vec<QueryFailure>)> {
        if scorer.num_docs() != corpus.len() {
            return Err(Error::InvalidConfig(format!(
                "index covers {} documents but the corpus has {}",
                scorer.num_docs(),
                corpus.len()
            )));
        }
        let k = self.config.top_k;
        let pb = progress_bar(queries.len(), self.config.progress, "queries");
        let score_all = || {
            queries
                .queries()
                .par_iter()
                .map(|query| {
                    let outcome = retrieve_one(scorer, corpus, query, k);
                    pb.inc(1);
                    (query, outcome)
                })
                .collect::<Vec<_>>()
        };
        let outcomes = match self.config.threads {
            Some(n) => rayon::ThreadPoolBuilder::new()
                .num_threads(n)
                .build()
                .map_err(|e| Error::InvalidConfig(format!("cannot start {n} worker threads: {e}")))?
                .install(score_all),
            None => score_all(),
        };
        pb.finish_and_clear();

        let mut results = ResultSet::new();
        let mut failures = Vec::new();
        for (query, outcome) in outcomes {
            match outcome {
                Ok(entry) => {
                    results.insert(query.id.clone(), entry);
                }
                Err(error) => {
                    tracing::warn!(query = %query.id, %error, "query failed");
                    failures.push(QueryFailure { query_id: query.id.clone(), error });
                }
            }
        }
        Ok((results, failures))
    }
}
