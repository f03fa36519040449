//! Vectors produced ahead of time by an external encoder.
//!
//! File format: one JSON object per line, `{"text": "...", "vector": [...]}`.
//! Lookups are keyed by the BLAKE3 hash of the exact text.

use serde::Deserialize;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use irbench_core::traits::Embedder;
use irbench_core::{Error, Result, Stage};

#[derive(Deserialize)]
struct VectorRecord {
    text: String,
    vector: Vec<f32>,
}

pub struct PrecomputedEmbedder {
    id: String,
    dim: usize,
    vectors: HashMap<String, Vec<f32>>,
}

pub fn text_key(text: &str) -> String {
    blake3::hash(text.as_bytes()).to_hex().to_string()
}

/// Short, single-line rendering of a text for error messages.
fn preview(text: &str) -> String {
    let flat: String = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= PREVIEW_CHARS {
        return flat;
    }
    let mut short: String = flat.chars().take(PREVIEW_CHARS).collect();
    short.push_str("...");
    short
}

const PREVIEW_CHARS: usize = 40;

impl PrecomputedEmbedder {
    pub fn from_jsonl(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| Error::data_load(path, e))?;
        let mut pairs = Vec::new();
        for (line_no, line) in BufReader::new(file).lines().enumerate() {
            let line = line.map_err(|e| Error::data_load(path, e))?;
            if line.trim().is_empty() { continue; }
            let record: VectorRecord = serde_json::from_str(&line)
                .map_err(|e| Error::data_load(path, format!("line {}: {}", line_no + 1, e)))?;
            pairs.push((record.text, record.vector));
        }
        if pairs.is_empty() {
            return Err(Error::data_load(path, "no vectors in file"));
        }
        let embedder = Self::from_pairs(format!("file:{}", path.display()), pairs)?;
        tracing::info!(vectors = embedder.vectors.len(), dim = embedder.dim, path = %path.display(), "precomputed vectors loaded");
        Ok(embedder)
    }

    /// Build from `(text, vector)` pairs. All vectors must share one length.
    pub fn from_pairs(model_id: impl Into<String>, pairs: impl IntoIterator<Item = (String, Vec<f32>)>) -> Result<Self> {
        let mut vectors = HashMap::new();
        let mut dim = None;
        for (text, vector) in pairs {
            let expected = *dim.get_or_insert(vector.len());
            if vector.len() != expected {
                return Err(Error::DimensionMismatch { id: preview(&text), stage: Stage::Load, expected, found: vector.len() });
            }
            vectors.insert(text_key(&text), vector);
        }
        Ok(Self { id: model_id.into(), dim: dim.unwrap_or(0), vectors })
    }
}

impl Embedder for PrecomputedEmbedder {
    fn model_id(&self) -> &str { &self.id }

    fn dim(&self) -> usize { self.dim }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        texts
            .iter()
            .map(|text| {
                self.vectors.get(&text_key(text)).cloned().ok_or_else(|| {
                    Error::embedding(&self.id, format!("no precomputed vector for text '{}'", preview(text)))
                })
            })
            .collect()
    }
}
