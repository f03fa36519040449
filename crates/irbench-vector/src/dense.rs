use std::collections::HashMap;

use irbench_core::progress::progress_bar;
use irbench_core::traits::{Embedder, Scorer};
use irbench_core::types::{Corpus, Query, QueryId, QuerySet};
use irbench_core::{Error, Result, Stage};

use crate::flat::FlatIpIndex;

/// Dense retrieval: corpus vectors in a `FlatIpIndex`, query vectors encoded
/// up front and normalized when scored.
///
/// Queries outside the build-time query set are encoded on demand with the
/// same embedder. Prepared vectors are looked up by query id.
pub struct DenseScorer<'e> {
    index: FlatIpIndex,
    query_vectors: HashMap<QueryId, Vec<f32>>,
    embedder: &'e dyn Embedder,
    model_id: String,
}

impl<'e> DenseScorer<'e> {
    pub fn build(
        corpus: &Corpus,
        queries: &QuerySet,
        embedder: &'e dyn Embedder,
        batch_size: usize,
        progress: bool,
    ) -> Result<Self> {
        if corpus.is_empty() {
            return Err(Error::EmptyCorpus);
        }
        let model_id = embedder.model_id().to_string();

        tracing::info!(documents = corpus.len(), model = %model_id, "encoding corpus");
        let doc_vectors = encode(embedder, &corpus.texts(), batch_size, progress, "docs")?;
        let doc_ids: Vec<&str> = corpus.iter().map(|d| d.id.as_str()).collect();
        let index = FlatIpIndex::build(&doc_ids, doc_vectors)?;
        tracing::info!(documents = index.len(), dim = index.dim(), "flat inner-product index built");

        tracing::info!(queries = queries.len(), "encoding queries");
        let encoded = encode(embedder, &queries.texts(), batch_size, progress, "queries")?;
        let mut query_vectors = HashMap::with_capacity(queries.len());
        for (query, vector) in queries.iter().zip(encoded) {
            if vector.len() != index.dim() {
                return Err(Error::DimensionMismatch {
                    id: query.id.clone(),
                    stage: Stage::Index,
                    expected: index.dim(),
                    found: vector.len(),
                });
            }
            query_vectors.insert(query.id.clone(), vector);
        }

        Ok(Self { index, query_vectors, embedder, model_id })
    }

    pub fn index(&self) -> &FlatIpIndex { &self.index }

    pub fn model_id(&self) -> &str { &self.model_id }
}

impl Scorer for DenseScorer<'_> {
    fn num_docs(&self) -> usize { self.index.len() }

    fn score(&self, query: &Query) -> Result<Vec<f64>> {
        if let Some(vector) = self.query_vectors.get(&query.id) {
            return self.index.similarities(&query.id, vector);
        }
        tracing::debug!(query = %query.id, "encoding query outside the prepared set");
        let vector = self
            .embedder
            .embed_batch(std::slice::from_ref(&query.text))?
            .pop()
            .ok_or_else(|| Error::embedding(&self.model_id, format!("no vector returned for query '{}'", query.id)))?;
        self.index.similarities(&query.id, &vector)
    }
}

fn encode(embedder: &dyn Embedder, texts: &[String], batch_size: usize, progress: bool, unit: &str) -> Result<Vec<Vec<f32>>> {
    let pb = progress_bar(texts.len(), progress, unit);
    let mut out = Vec::with_capacity(texts.len());
    for batch in texts.chunks(batch_size.max(1)) {
        let vectors = embedder.embed_batch(batch)?;
        if vectors.len() != batch.len() {
            return Err(Error::embedding(
                embedder.model_id(),
                format!("returned {} vectors for {} texts", vectors.len(), batch.len()),
            ));
        }
        out.extend(vectors);
        pb.inc(batch.len() as u64);
    }
    pb.finish_and_clear();
    Ok(out)
}
