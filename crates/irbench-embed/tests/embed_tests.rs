use std::fs;
use std::path::PathBuf;

use irbench_core::traits::Embedder;
use irbench_core::Error;
use irbench_embed::{embedder_for_model, HashEmbedder, ModelSpec, PrecomputedEmbedder};

#[test]
fn hash_embedder_shapes_and_determinism() {
    let embedder = embedder_for_model("hash:64").expect("embedder");
    let texts = vec!["hello world".to_string(), "Hello   WORLD".to_string()];
    let embs = embedder.embed_batch(&texts).expect("embed_batch");

    assert_eq!(embedder.dim(), 64);
    assert_eq!(embedder.model_id(), "hash:64");
    assert_eq!(embs[0].len(), 64);

    let norm: f32 = embs[0].iter().map(|x| x * x).sum::<f32>().sqrt();
    assert!((norm - 1.0).abs() <= 1e-5, "vector is L2-normalized (norm={norm})");

    // Case and spacing do not change tokens
    for (a, b) in embs[0].iter().zip(embs[1].iter()) { assert!((a - b).abs() <= 1e-6); }
}

#[test]
fn hash_embedder_encodes_empty_text_as_zero() {
    let v = HashEmbedder::new(8).embed_text("   ");
    assert!(v.iter().all(|x| *x == 0.0));
}

#[test]
fn default_hash_model_and_unknown_models() {
    assert_eq!(embedder_for_model("hash").unwrap().dim(), 384);
    assert!(matches!(embedder_for_model("hash:0"), Err(Error::InvalidConfig(_))));
    assert!(matches!(embedder_for_model("bert-base-uncased"), Err(Error::InvalidConfig(_))));
}

#[test]
fn precomputed_vectors_are_looked_up_by_text() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("vectors.jsonl");
    fs::write(
        &path,
        "{\"text\": \"alpha\", \"vector\": [1.0, 0.0]}\n\n{\"text\": \"beta\", \"vector\": [0.0, 2.0]}\n",
    )
    .unwrap();

    let embedder = embedder_for_model(&format!("file:{}", path.display())).unwrap();
    assert_eq!(embedder.dim(), 2);
    let embs = embedder.embed_batch(&["beta".to_string(), "alpha".to_string()]).unwrap();
    assert_eq!(embs, vec![vec![0.0, 2.0], vec![1.0, 0.0]]);

    let err = embedder.embed_batch(&["gamma".to_string()]).unwrap_err();
    assert!(matches!(err, Error::Embedding { .. }), "got {err:?}");
}

#[test]
fn precomputed_vectors_must_share_dimension() {
    let err = PrecomputedEmbedder::from_pairs("test", vec![("a".to_string(), vec![1.0, 0.0]), ("b".to_string(), vec![1.0])])
        .err()
        .unwrap();
    assert!(matches!(err, Error::DimensionMismatch { expected: 2, found: 1, .. }), "got {err:?}");
}

#[test]
fn hash_model_id_feeds_back_into_config() {
    let first = embedder_for_model("hash:48").unwrap();
    let again = embedder_for_model(first.model_id()).unwrap();
    assert_eq!(again.model_id(), "hash:48");
    assert_eq!(again.dim(), 48);
}

#[test]
fn dimension_errors_name_a_short_preview_of_the_text() {
    let long_text = "word ".repeat(500);
    let err = PrecomputedEmbedder::from_pairs("test", vec![("a".to_string(), vec![1.0, 0.0]), (long_text, vec![1.0])])
        .err()
        .unwrap();
    match err {
        Error::DimensionMismatch { id, .. } => {
            assert!(id.starts_with("word word"), "{id}");
            assert!(id.chars().count() <= 43, "{id}");
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn sentence_transformer_ids_parse_to_minilm() {
    assert_eq!(ModelSpec::parse("all-MiniLM-L6-v2").unwrap(), ModelSpec::MiniLm(None));
    assert_eq!(ModelSpec::parse("sentence-transformers/all-MiniLM-L6-v2").unwrap(), ModelSpec::MiniLm(None));
    assert_eq!(
        ModelSpec::parse("minilm:/opt/models/minilm").unwrap(),
        ModelSpec::MiniLm(Some(PathBuf::from("/opt/models/minilm")))
    );
    assert_eq!(ModelSpec::parse("hash:12").unwrap(), ModelSpec::Hash(12));
    assert_eq!(ModelSpec::parse("file:/tmp/v.jsonl").unwrap(), ModelSpec::File(PathBuf::from("/tmp/v.jsonl")));
    assert!(matches!(ModelSpec::parse("minilm:"), Err(Error::InvalidConfig(_))));
}

#[test]
fn minilm_with_missing_directory_fails_cleanly() {
    let tmp = tempfile::tempdir().unwrap();
    let model = format!("minilm:{}", tmp.path().join("absent").display());
    let err = embedder_for_model(&model).err().unwrap();
    if cfg!(feature = "bert") {
        assert!(matches!(err, Error::DataLoad { .. }), "got {err:?}");
    } else {
        assert!(matches!(err, Error::InvalidConfig(_)), "got {err:?}");
    }
}
