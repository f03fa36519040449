//! Domain types shared by the lexical and dense engines.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result, Stage};

pub type DocId = String;
pub type QueryId = String;

/// A corpus record. Immutable once loaded.
///
/// - `id`: unique within its corpus
/// - `title`/`text`: concatenated with a single space before tokenizing or embedding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub text: String,
}

impl Document {
    pub fn new(id: impl Into<DocId>, title: impl Into<String>, text: impl Into<String>) -> Self {
        Self { id: id.into(), title: title.into(), text: text.into() }
    }

    /// Title and body joined by a single space.
    pub fn full_text(&self) -> String {
        format!("{} {}", self.title, self.text)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    pub id: QueryId,
    pub text: String,
}

impl Query {
    pub fn new(id: impl Into<QueryId>, text: impl Into<String>) -> Self {
        Self { id: id.into(), text: text.into() }
    }
}

/// Ordered documents. The position of a document is its corpus index,
/// the key of every per-document score array.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Corpus {
    docs: Vec<Document>,
}

impl Corpus {
    pub fn new(docs: Vec<Document>) -> Result<Self> {
        ensure_unique(docs.iter().map(|d| d.id.as_str()))?;
        Ok(Self { docs })
    }

    pub fn len(&self) -> usize { self.docs.len() }

    pub fn is_empty(&self) -> bool { self.docs.is_empty() }

    pub fn get(&self, index: usize) -> Option<&Document> { self.docs.get(index) }

    pub fn doc_id(&self, index: usize) -> Option<&str> {
        self.docs.get(index).map(|d| d.id.as_str())
    }

    pub fn documents(&self) -> &[Document] { &self.docs }

    pub fn iter(&self) -> std::slice::Iter<'_, Document> { self.docs.iter() }

    /// `full_text` of every document, in corpus order.
    pub fn texts(&self) -> Vec<String> {
        self.docs.iter().map(Document::full_text).collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuerySet {
    queries: Vec<Query>,
}

impl QuerySet {
    pub fn new(queries: Vec<Query>) -> Result<Self> {
        ensure_unique(queries.iter().map(|q| q.id.as_str()))?;
        Ok(Self { queries })
    }

    pub fn len(&self) -> usize { self.queries.len() }

    pub fn is_empty(&self) -> bool { self.queries.is_empty() }

    pub fn get(&self, index: usize) -> Option<&Query> { self.queries.get(index) }

    pub fn queries(&self) -> &[Query] { &self.queries }

    pub fn iter(&self) -> std::slice::Iter<'_, Query> { self.queries.iter() }

    pub fn texts(&self) -> Vec<String> {
        self.queries.iter().map(|q| q.text.clone()).collect()
    }
}

fn ensure_unique<'a>(ids: impl Iterator<Item = &'a str>) -> Result<()> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(Error::DuplicateId { id: id.to_string(), stage: Stage::Load });
        }
    }
    Ok(())
}

/// Which retrieval strategy produced a result.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    Lexical,
    Dense,
}

impl Strategy {
    pub fn as_str(self) -> &'static str {
        match self {
            Strategy::Lexical => "lexical",
            Strategy::Dense => "dense",
        }
    }

    /// File name of the result artifact this strategy writes.
    pub fn results_file_name(self) -> &'static str {
        match self {
            Strategy::Lexical => "sparse_results.json",
            Strategy::Dense => "dense_results.json",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "lexical" | "sparse" | "bm25" => Ok(Strategy::Lexical),
            "dense" | "vector" => Ok(Strategy::Dense),
            other => Err(Error::InvalidConfig(format!("unknown strategy '{other}'"))),
        }
    }
}

/// A scored corpus position. Higher `score` is better; scores are only
/// comparable within one query and one strategy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub index: usize,
    pub score: f64,
}
