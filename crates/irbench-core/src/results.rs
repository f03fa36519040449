//! Result assembly and the JSON result artifact.
//!
//! The artifact is a JSON object `{query_id: {doc_id: score}}`. Entries are
//! written in rank order, but readers may reorder object keys, so the score
//! values carry the rank.

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::marker::PhantomData;
use std::path::Path;

use crate::error::{Error, Result};
use crate::types::{Corpus, DocId, QueryId, SearchHit};

/// Ranked `(doc_id, score)` entries for a single query, best first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryResult {
    entries: Vec<(DocId, f64)>,
}

impl QueryResult {
    pub fn len(&self) -> usize { self.entries.len() }

    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    pub fn entries(&self) -> &[(DocId, f64)] { &self.entries }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.entries.iter().map(|(id, score)| (id.as_str(), *score))
    }

    pub fn get(&self, doc_id: &str) -> Option<f64> {
        self.entries.iter().find(|(id, _)| id == doc_id).map(|(_, s)| *s)
    }

    /// True when scores never increase along the entries.
    pub fn is_sorted_by_score(&self) -> bool {
        self.entries.windows(2).all(|w| w[0].1 >= w[1].1)
    }
}

impl FromIterator<(DocId, f64)> for QueryResult {
    fn from_iter<I: IntoIterator<Item = (DocId, f64)>>(iter: I) -> Self {
        Self { entries: iter.into_iter().collect() }
    }
}

/// Map selector output to document ids, keeping selector order.
pub fn assemble(corpus: &Corpus, hits: &[SearchHit]) -> QueryResult {
    hits.iter()
        .filter_map(|hit| corpus.doc_id(hit.index).map(|id| (id.to_string(), hit.score)))
        .collect()
}

/// Query id -> ranked entries, in insertion order.
#[derive(Debug, Clone, Default)]
pub struct ResultSet {
    entries: Vec<(QueryId, QueryResult)>,
    positions: HashMap<QueryId, usize>,
}

impl PartialEq for ResultSet {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl ResultSet {
    pub fn new() -> Self { Self::default() }

    /// Insert a complete entry, replacing any previous entry for `query_id`
    /// as a whole. Returns the replaced entry.
    pub fn insert(&mut self, query_id: QueryId, result: QueryResult) -> Option<QueryResult> {
        if let Some(&pos) = self.positions.get(&query_id) {
            return Some(std::mem::replace(&mut self.entries[pos].1, result));
        }
        self.positions.insert(query_id.clone(), self.entries.len());
        self.entries.push((query_id, result));
        None
    }

    pub fn get(&self, query_id: &str) -> Option<&QueryResult> {
        self.positions.get(query_id).map(|&pos| &self.entries[pos].1)
    }

    pub fn len(&self) -> usize { self.entries.len() }

    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &QueryResult)> {
        self.entries.iter().map(|(id, r)| (id.as_str(), r))
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json_str(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }

    /// Write the artifact, creating parent directories as needed.
    pub fn write_json(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        tracing::info!(queries = self.len(), path = %path.display(), "results written");
        Ok(())
    }

    pub fn read_json(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| Error::data_load(path, e))?;
        serde_json::from_reader(BufReader::new(file)).map_err(|e| Error::data_load(path, e))
    }
}

impl Serialize for QueryResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (id, score) in &self.entries {
            map.serialize_entry(id, score)?;
        }
        map.end()
    }
}

impl Serialize for ResultSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (id, result) in &self.entries {
            map.serialize_entry(id, result)?;
        }
        map.end()
    }
}

/// Collects a JSON object into ordered `(key, value)` pairs.
struct OrderedPairs<V>(PhantomData<V>);

impl<'de, V: Deserialize<'de>> Visitor<'de> for OrderedPairs<V> {
    type Value = Vec<(String, V)>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a JSON object")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> std::result::Result<Self::Value, A::Error> {
        let mut pairs = Vec::with_capacity(access.size_hint().unwrap_or(0));
        while let Some((key, value)) = access.next_entry::<String, V>()? {
            pairs.push((key, value));
        }
        Ok(pairs)
    }
}

impl<'de> Deserialize<'de> for QueryResult {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let entries = deserializer.deserialize_map(OrderedPairs::<f64>(PhantomData))?;
        Ok(Self { entries })
    }
}

impl<'de> Deserialize<'de> for ResultSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let pairs = deserializer.deserialize_map(OrderedPairs::<QueryResult>(PhantomData))?;
        let mut set = ResultSet::new();
        for (id, result) in pairs {
            set.insert(id, result);
        }
        Ok(set)
    }
}
