use rayon::prelude::*;

use irbench_core::config::Bm25Params;
use irbench_core::traits::Scorer;
use irbench_core::types::{Corpus, Query};
use irbench_core::{Error, Result};

use crate::bm25::Bm25Index;
use crate::tokenize::tokenize;

/// BM25 over the normalized `title + " " + text` of every document.
pub struct LexicalScorer {
    index: Bm25Index,
}

impl LexicalScorer {
    pub fn build(corpus: &Corpus, params: &Bm25Params) -> Result<Self> {
        if corpus.is_empty() {
            return Err(Error::EmptyCorpus);
        }
        let tokenized: Vec<Vec<String>> = corpus
            .documents()
            .par_iter()
            .map(|doc| tokenize(&doc.full_text()))
            .collect();
        let index = Bm25Index::build(&tokenized, *params)?;
        tracing::info!(
            documents = index.num_docs(),
            avgdl = index.avgdl(),
            vocabulary = index.vocabulary_size(),
            k1 = params.k1,
            b = params.b,
            "BM25 index built"
        );
        Ok(Self { index })
    }

    pub fn index(&self) -> &Bm25Index { &self.index }
}

impl Scorer for LexicalScorer {
    fn num_docs(&self) -> usize { self.index.num_docs() }

    fn score(&self, query: &Query) -> Result<Vec<f64>> {
        let tokens = tokenize(&query.text);
        if tokens.is_empty() {
            tracing::debug!(query = %query.id, "query has no tokens; all scores are zero");
        }
        Ok(self.index.score_tokens(&tokens))
    }
}
