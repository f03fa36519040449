use std::fs;
use tempfile::TempDir;

use irbench_core::config::{expand_path, resolve_with_base, Config, IdfFormula, RunConfig};
use irbench_core::loader::{load_corpus, load_corpus_and_queries, DatasetLoader};
use irbench_core::types::{Corpus, Document, Strategy};
use irbench_core::{Error, Stage};

fn write_dataset(dir: &std::path::Path) {
    fs::write(
        dir.join("corpus.jsonl"),
        concat!(
            r#"{"_id": "d1", "title": "Cats", "text": "cat sat mat", "metadata": {}}"#, "\n",
            "\n",
            r#"{"_id": 42, "text": "dog sat log"}"#, "\n",
        ),
    )
    .unwrap();
    fs::write(dir.join("queries.jsonl"), r#"{"_id": "q1", "text": "cat sat"}"#).unwrap();
}

#[test]
fn loads_beir_corpus_and_queries_in_file_order() {
    let tmp = TempDir::new().unwrap();
    write_dataset(tmp.path());

    let (corpus, queries) = DatasetLoader::new().load(tmp.path()).expect("load");

    assert_eq!(corpus.len(), 2);
    assert_eq!(corpus.doc_id(0), Some("d1"));
    assert_eq!(corpus.doc_id(1), Some("42"), "numeric ids are stringified");
    assert_eq!(corpus.get(0).unwrap().full_text(), "Cats cat sat mat");
    assert_eq!(corpus.get(1).unwrap().title, "");
    assert_eq!(queries.len(), 1);
    assert_eq!(queries.get(0).unwrap().text, "cat sat");
}

#[test]
fn load_via_run_config_uses_configured_files() {
    let tmp = TempDir::new().unwrap();
    write_dataset(tmp.path());
    let config = RunConfig { data_dir: tmp.path().to_path_buf(), ..RunConfig::default() };

    let (corpus, queries) = load_corpus_and_queries(&config).expect("load");
    assert_eq!((corpus.len(), queries.len()), (2, 1));
}

#[test]
fn missing_corpus_is_a_data_load_error() {
    let tmp = TempDir::new().unwrap();
    let err = load_corpus(&tmp.path().join("corpus.jsonl")).unwrap_err();
    assert!(matches!(err, Error::DataLoad { .. }), "got {err:?}");
}

#[test]
fn malformed_line_reports_line_number() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("corpus.jsonl");
    fs::write(&path, "{\"_id\": \"a\", \"text\": \"x\"}\n{not json}\n").unwrap();

    match load_corpus(&path).unwrap_err() {
        Error::DataLoad { reason, .. } => assert!(reason.contains("line 2"), "reason: {reason}"),
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn duplicate_document_ids_are_rejected() {
    let err = Corpus::new(vec![Document::new("a", "", "x"), Document::new("a", "", "y")]).unwrap_err();
    match err {
        Error::DuplicateId { id, stage } => {
            assert_eq!(id, "a");
            assert_eq!(stage, Stage::Load);
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn config_defaults_without_files() {
    let tmp = TempDir::new().unwrap();
    let cfg = Config::load_from(tmp.path(), "test").unwrap().run_config().unwrap();

    assert_eq!(cfg.top_k, 100);
    assert!((cfg.bm25.k1 - 1.5).abs() < f64::EPSILON);
    assert!((cfg.bm25.b - 0.75).abs() < f64::EPSILON);
    assert_eq!(cfg.bm25.idf, IdfFormula::Lucene);
    assert_eq!(cfg.embedding.model, "all-MiniLM-L6-v2");
    assert_eq!(cfg.data_dir, tmp.path().join("datasets/scifact"));
}

#[test]
fn config_overlay_overrides_base_file() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("config.toml"), "top_k = 10\n[bm25]\nk1 = 1.2\n").unwrap();
    fs::write(tmp.path().join("config.test.toml"), "top_k = 5\n[bm25]\nidf = \"okapi\"\n").unwrap();

    let cfg = Config::load_from(tmp.path(), "test").unwrap().run_config().unwrap();
    assert_eq!(cfg.top_k, 5);
    assert!((cfg.bm25.k1 - 1.2).abs() < f64::EPSILON);
    assert_eq!(cfg.bm25.idf, IdfFormula::Okapi);
}

#[test]
fn invalid_config_values_are_rejected() {
    let mut cfg = RunConfig { top_k: 0, ..RunConfig::default() };
    assert!(matches!(cfg.validate(), Err(Error::InvalidConfig(_))));
    cfg.top_k = 3;
    cfg.bm25.b = 1.5;
    assert!(matches!(cfg.validate(), Err(Error::InvalidConfig(_))));
    cfg.bm25.b = 0.75;
    assert!(cfg.validate().is_ok());
}

#[test]
fn strategy_parsing_and_file_names() {
    assert_eq!("bm25".parse::<Strategy>().unwrap(), Strategy::Lexical);
    assert_eq!("Dense".parse::<Strategy>().unwrap(), Strategy::Dense);
    assert!("hybrid".parse::<Strategy>().is_err());
    assert_eq!(Strategy::Lexical.results_file_name(), "sparse_results.json");
    assert_eq!(Strategy::Dense.results_file_name(), "dense_results.json");
}

#[test]
fn unset_path_variable_is_reported() {
    let err = expand_path("${IRBENCH_TEST_SURELY_UNSET_VAR}/corpus").unwrap_err();
    assert!(matches!(err, Error::InvalidConfig(ref msg) if msg.contains("IRBENCH_TEST_SURELY_UNSET_VAR")), "got {err:?}");
}

#[test]
fn relative_paths_resolve_against_base() {
    let base = std::path::Path::new("/data/runs");
    assert_eq!(resolve_with_base(base, "scifact").unwrap(), base.join("scifact"));
    assert_eq!(resolve_with_base(base, "/abs/scifact").unwrap(), std::path::PathBuf::from("/abs/scifact"));
}
