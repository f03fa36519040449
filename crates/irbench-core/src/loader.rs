//! Reads BEIR-style `corpus.jsonl` / `queries.jsonl` files into the data model.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::config::RunConfig;
use crate::error::{Error, Result};
use crate::types::{Corpus, Document, Query, QuerySet};

#[derive(Deserialize)]
struct CorpusRecord {
    #[serde(rename = "_id", deserialize_with = "id_string")]
    id: String,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Deserialize)]
struct QueryRecord {
    #[serde(rename = "_id", deserialize_with = "id_string")]
    id: String,
    #[serde(default)]
    text: Option<String>,
}

/// Some BEIR exports write numeric ids.
fn id_string<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Int(i64),
        Uint(u64),
    }
    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(s) => s,
        RawId::Int(n) => n.to_string(),
        RawId::Uint(n) => n.to_string(),
    })
}

pub struct DatasetLoader {
    corpus_file: String,
    queries_file: String,
}

impl Default for DatasetLoader {
    fn default() -> Self {
        Self { corpus_file: "corpus.jsonl".to_string(), queries_file: "queries.jsonl".to_string() }
    }
}

impl DatasetLoader {
    pub fn new() -> Self { Self::default() }

    pub fn with_files(corpus_file: impl Into<String>, queries_file: impl Into<String>) -> Self {
        Self { corpus_file: corpus_file.into(), queries_file: queries_file.into() }
    }

    pub fn load(&self, data_dir: &Path) -> Result<(Corpus, QuerySet)> {
        let corpus = load_corpus(&data_dir.join(&self.corpus_file))?;
        let queries = load_queries(&data_dir.join(&self.queries_file))?;
        tracing::info!(documents = corpus.len(), queries = queries.len(), dir = %data_dir.display(), "dataset loaded");
        Ok((corpus, queries))
    }
}

/// Load the corpus and query set named by `config`.
pub fn load_corpus_and_queries(config: &RunConfig) -> Result<(Corpus, QuerySet)> {
    DatasetLoader::with_files(config.corpus_file.clone(), config.queries_file.clone()).load(&config.data_dir)
}

pub fn load_corpus(path: &Path) -> Result<Corpus> {
    let docs = read_jsonl::<CorpusRecord>(path)?
        .into_iter()
        .map(|r| Document::new(r.id, r.title.unwrap_or_default(), r.text.unwrap_or_default()))
        .collect();
    Corpus::new(docs)
}

pub fn load_queries(path: &Path) -> Result<QuerySet> {
    let queries = read_jsonl::<QueryRecord>(path)?
        .into_iter()
        .map(|r| Query::new(r.id, r.text.unwrap_or_default()))
        .collect();
    QuerySet::new(queries)
}

fn read_jsonl<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let file = File::open(path).map_err(|e| Error::data_load(path, e))?;
    let mut records = Vec::new();
    for (line_no, line) in BufReader::new(file).lines().enumerate() {
        let line = line.map_err(|e| Error::data_load(path, e))?;
        if line.trim().is_empty() { continue; }
        let record = serde_json::from_str(&line)
            .map_err(|e| Error::data_load(path, format!("line {}: {}", line_no + 1, e)))?;
        records.push(record);
    }
    tracing::debug!(records = records.len(), path = %path.display(), "read jsonl");
    Ok(records)
}
