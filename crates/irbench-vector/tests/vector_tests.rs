use proptest::prelude::*;
use std::collections::HashMap;

use irbench_core::traits::{Embedder, Scorer};
use irbench_core::types::{Corpus, Document, Query, QuerySet};
use irbench_core::{Error, Result, Stage};
use irbench_embed::HashEmbedder;
use irbench_vector::{DenseScorer, FlatIpIndex};

/// Returns fixed vectors keyed by text.
struct TableEmbedder {
    dim: usize,
    table: HashMap<String, Vec<f32>>,
}

impl TableEmbedder {
    fn new(dim: usize, rows: Vec<(&str, Vec<f32>)>) -> Self {
        Self { dim, table: rows.into_iter().map(|(t, v)| (t.to_string(), v)).collect() }
    }
}

impl Embedder for TableEmbedder {
    fn model_id(&self) -> &str { "table" }
    fn dim(&self) -> usize { self.dim }
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.table.get(t).cloned().unwrap_or_else(|| vec![0.0; self.dim])).collect())
    }
}

fn corpus(ids: &[&str]) -> Corpus {
    Corpus::new(ids.iter().map(|id| Document::new(*id, *id, "")).collect()).unwrap()
}

#[test]
fn cosine_scores_follow_the_angle() {
    let index = FlatIpIndex::build(&["a", "b", "c"], vec![vec![2.0, 0.0], vec![1.0, 1.0], vec![-3.0, 0.0]]).unwrap();
    let sims = index.similarities("q", &[5.0, 0.0]).unwrap();

    assert!((sims[0] - 1.0).abs() < 1e-6);
    assert!((sims[1] - std::f64::consts::FRAC_1_SQRT_2).abs() < 1e-6);
    assert!((sims[2] + 1.0).abs() < 1e-6);

    let hits = index.search("q", &[5.0, 0.0], 2).unwrap();
    assert_eq!(hits.iter().map(|h| h.index).collect::<Vec<_>>(), vec![0, 1]);
}

#[test]
fn zero_norm_document_is_fatal_with_its_id() {
    let err = FlatIpIndex::build(&["a", "b"], vec![vec![1.0, 0.0], vec![0.0, 0.0]]).unwrap_err();
    match err {
        Error::ZeroNormVector { id, stage } => {
            assert_eq!(id, "b");
            assert_eq!(stage, Stage::Index);
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn inconsistent_document_dimension_is_fatal() {
    let err = FlatIpIndex::build(&["a", "b"], vec![vec![1.0, 0.0], vec![1.0, 0.0, 0.0]]).unwrap_err();
    assert!(matches!(err, Error::DimensionMismatch { expected: 2, found: 3, .. }), "got {err:?}");
}

#[test]
fn empty_index_is_rejected() {
    let ids: [&str; 0] = [];
    assert!(matches!(FlatIpIndex::build(&ids, Vec::new()), Err(Error::EmptyCorpus)));
}

#[test]
fn dense_scorer_isolates_zero_norm_queries() {
    let docs = corpus(&["x", "y"]);
    let queries = QuerySet::new(vec![Query::new("good", "x"), Query::new("empty", "nothing")]).unwrap();
    let embedder = TableEmbedder::new(2, vec![("x", vec![1.0, 0.0]), ("x ", vec![1.0, 0.0]), ("y ", vec![0.0, 1.0])]);
    let scorer = DenseScorer::build(&docs, &queries, &embedder, 1, false).unwrap();

    let good = scorer.score(queries.get(0).unwrap()).unwrap();
    assert!((good[0] - 1.0).abs() < 1e-6);
    assert!(good[1].abs() < 1e-6);

    let err = scorer.score(queries.get(1).unwrap()).unwrap_err();
    assert!(matches!(err, Error::ZeroNormVector { ref id, stage: Stage::Query } if id == "empty"), "got {err:?}");
}

#[test]
fn query_dimension_mismatch_is_fatal_at_build() {
    let docs = corpus(&["x"]);
    let queries = QuerySet::new(vec![Query::new("q", "q")]).unwrap();
    let embedder = TableEmbedder::new(2, vec![("x ", vec![1.0, 0.0]), ("q", vec![1.0, 0.0, 0.0])]);
    let err = DenseScorer::build(&docs, &queries, &embedder, 8, false).err().unwrap();
    assert!(matches!(err, Error::DimensionMismatch { ref id, .. } if id == "q"), "got {err:?}");
}

#[test]
fn queries_outside_the_prepared_set_are_encoded_on_demand() {
    let docs = corpus(&["x", "y"]);
    let embedder = TableEmbedder::new(2, vec![("x ", vec![1.0, 0.0]), ("y ", vec![0.0, 1.0]), ("late", vec![0.0, 3.0])]);
    let scorer = DenseScorer::build(&docs, &QuerySet::default(), &embedder, 8, false).unwrap();

    let sims = scorer.score(&Query::new("late", "late")).unwrap();
    assert!(sims[0].abs() < 1e-6);
    assert!((sims[1] - 1.0).abs() < 1e-6);
}

#[test]
fn on_demand_query_with_wrong_dimension_fails_at_query_stage() {
    let docs = corpus(&["x"]);
    let embedder = TableEmbedder::new(2, vec![("x ", vec![1.0, 0.0]), ("odd", vec![1.0, 0.0, 0.0])]);
    let scorer = DenseScorer::build(&docs, &QuerySet::default(), &embedder, 8, false).unwrap();
    let err = scorer.score(&Query::new("q", "odd")).unwrap_err();
    assert!(matches!(err, Error::DimensionMismatch { stage: Stage::Query, .. }), "got {err:?}");
}

#[test]
fn hash_embedded_document_matches_itself_best() {
    let docs = Corpus::new(vec![
        Document::new("d1", "Zinc", "supplementation in children"),
        Document::new("d2", "Gene", "expression of tumour suppressors"),
    ])
    .unwrap();
    let queries = QuerySet::new(vec![Query::new("q", "Gene expression of tumour suppressors")]).unwrap();
    let embedder = HashEmbedder::new(256);
    let scorer = DenseScorer::build(&docs, &queries, &embedder, 16, false).unwrap();
    let sims = scorer.score(queries.get(0).unwrap()).unwrap();
    assert!(sims[1] > sims[0]);
}

proptest! {
    #[test]
    fn self_similarity_is_one(v in prop::collection::vec(-100.0f32..100.0, 1..32)) {
        prop_assume!(v.iter().any(|x| x.abs() > 1e-3));
        let index = FlatIpIndex::build(&["self"], vec![v.clone()]).unwrap();
        let sims = index.similarities("self", &v).unwrap();
        prop_assert!((sims[0] - 1.0).abs() < 1e-5, "{}", sims[0]);
    }

    #[test]
    fn similarities_stay_in_cosine_range(
        a in prop::collection::vec(-10.0f32..10.0, 4),
        b in prop::collection::vec(-10.0f32..10.0, 4),
    ) {
        prop_assume!(a.iter().any(|x| x.abs() > 1e-3) && b.iter().any(|x| x.abs() > 1e-3));
        let index = FlatIpIndex::build(&["a"], vec![a]).unwrap();
        let sim = index.similarities("b", &b).unwrap()[0];
        prop_assert!((-1.0 - 1e-5..=1.0 + 1e-5).contains(&sim));
    }
}
