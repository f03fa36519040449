//! In-memory Okapi BM25 over pre-tokenized documents.
//!
//! The index is immutable once built. Scoring walks the postings of each
//! query token, so per-document sums accumulate in query-token order and a
//! repeated query token contributes once per occurrence.

use std::collections::HashMap;

use irbench_core::config::{Bm25Params, IdfFormula};
use irbench_core::{Error, Result};

#[derive(Debug, Clone, Copy)]
struct Posting {
    doc: usize,
    tf: usize,
}

#[derive(Debug, Clone)]
struct TermEntry {
    idf: f64,
    postings: Vec<Posting>,
}

#[derive(Debug, Clone)]
pub struct Bm25Index {
    params: Bm25Params,
    doc_len: Vec<usize>,
    avgdl: f64,
    /// `k1 * (1 - b + b * dl / avgdl)` per document.
    length_norm: Vec<f64>,
    vocab: HashMap<String, TermEntry>,
}

impl Bm25Index {
    /// Build from the token sequence of every document, in corpus order.
    pub fn build<T: AsRef<str>>(docs: &[Vec<T>], params: Bm25Params) -> Result<Self> {
        params.validate()?;
        if docs.is_empty() {
            return Err(Error::EmptyCorpus);
        }

        let mut postings: HashMap<String, Vec<Posting>> = HashMap::new();
        let mut doc_len = Vec::with_capacity(docs.len());
        for (doc, tokens) in docs.iter().enumerate() {
            doc_len.push(tokens.len());
            let mut counts: HashMap<&str, usize> = HashMap::new();
            for token in tokens {
                *counts.entry(token.as_ref()).or_insert(0) += 1;
            }
            for (term, tf) in counts {
                postings.entry(term.to_string()).or_default().push(Posting { doc, tf });
            }
        }

        let n = docs.len() as f64;
        let avgdl = doc_len.iter().sum::<usize>() as f64 / n;
        let length_norm = doc_len
            .iter()
            .map(|&dl| {
                let rel = if avgdl > 0.0 { params.b * dl as f64 / avgdl } else { 0.0 };
                params.k1 * (1.0 - params.b + rel)
            })
            .collect();
        let vocab = compute_idf(postings, n, &params);

        Ok(Self { params, doc_len, avgdl, length_norm, vocab })
    }

    /// One score per document for the given query tokens. Tokens absent
    /// from the corpus are skipped.
    pub fn score_tokens<T: AsRef<str>>(&self, query: &[T]) -> Vec<f64> {
        let mut scores = vec![0.0; self.doc_len.len()];
        let k1 = self.params.k1;
        for token in query {
            let Some(entry) = self.vocab.get(token.as_ref()) else { continue };
            for p in &entry.postings {
                let tf = p.tf as f64;
                scores[p.doc] += entry.idf * (tf * (k1 + 1.0) / (tf + self.length_norm[p.doc]));
            }
        }
        scores
    }

    pub fn num_docs(&self) -> usize { self.doc_len.len() }

    pub fn avgdl(&self) -> f64 { self.avgdl }

    pub fn doc_len(&self, doc: usize) -> Option<usize> { self.doc_len.get(doc).copied() }

    pub fn vocabulary_size(&self) -> usize { self.vocab.len() }

    pub fn params(&self) -> &Bm25Params { &self.params }

    pub fn idf(&self, term: &str) -> Option<f64> { self.vocab.get(term).map(|e| e.idf) }

    /// Number of documents containing `term`.
    pub fn doc_freq(&self, term: &str) -> usize {
        self.vocab.get(term).map_or(0, |e| e.postings.len())
    }

    pub fn tf(&self, term: &str, doc: usize) -> usize {
        self.vocab
            .get(term)
            .and_then(|e| e.postings.iter().find(|p| p.doc == doc))
            .map_or(0, |p| p.tf)
    }
}

fn compute_idf(postings: HashMap<String, Vec<Posting>>, n: f64, params: &Bm25Params) -> HashMap<String, TermEntry> {
    match params.idf {
        IdfFormula::Lucene => postings
            .into_iter()
            .map(|(term, postings)| {
                let df = postings.len() as f64;
                let idf = ((n - df + 0.5) / (df + 0.5) + 1.0).ln();
                (term, TermEntry { idf, postings })
            })
            .collect(),
        IdfFormula::Okapi => {
            let mut vocab: HashMap<String, TermEntry> = postings
                .into_iter()
                .map(|(term, postings)| {
                    let df = postings.len() as f64;
                    let idf = (n - df + 0.5).ln() - (df + 0.5).ln();
                    (term, TermEntry { idf, postings })
                })
                .collect();
            if !vocab.is_empty() {
                // Summed in a fixed order so the floor is identical across runs.
                let mut idfs: Vec<f64> = vocab.values().map(|e| e.idf).collect();
                idfs.sort_by(f64::total_cmp);
                let mean = idfs.iter().sum::<f64>() / idfs.len() as f64;
                let floor = params.epsilon * mean;
                for entry in vocab.values_mut().filter(|e| e.idf < 0.0) {
                    entry.idf = floor;
                }
            }
            vocab
        }
    }
}
