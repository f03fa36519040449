//! irbench-embed
//!
//! Providers of the `embed(texts)` capability: a sentence-transformer encoder
//! on candle (feature `bert`, on by default), a deterministic hashing encoder,
//! and vectors precomputed by an external encoder.

pub mod hash;
#[cfg(feature = "bert")]
pub mod minilm;
pub mod precomputed;

use std::path::PathBuf;

use irbench_core::config::expand_path;
use irbench_core::traits::Embedder;
use irbench_core::{Error, Result};

pub use hash::HashEmbedder;
#[cfg(feature = "bert")]
pub use minilm::MiniLmEmbedder;
pub use precomputed::PrecomputedEmbedder;

pub const DEFAULT_HASH_DIM: usize = 384;

/// A parsed embedding model identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelSpec {
    /// `all-MiniLM-L6-v2`, `sentence-transformers/all-MiniLM-L6-v2`, `minilm`
    /// (directory located at load time) or `minilm:<dir>`.
    MiniLm(Option<PathBuf>),
    /// `hash` or `hash:<dim>`.
    Hash(usize),
    /// `file:<path>`.
    File(PathBuf),
}

impl ModelSpec {
    pub fn parse(model: &str) -> Result<Self> {
        match model.split_once(':') {
            None => match model {
                "hash" => Ok(ModelSpec::Hash(DEFAULT_HASH_DIM)),
                "minilm" | "all-MiniLM-L6-v2" | "sentence-transformers/all-MiniLM-L6-v2" => Ok(ModelSpec::MiniLm(None)),
                _ => Err(unknown_model(model)),
            },
            Some(("hash", dim)) => {
                let dim: usize = dim
                    .parse()
                    .map_err(|_| Error::InvalidConfig(format!("invalid hash embedding dimension '{dim}'")))?;
                if dim == 0 {
                    return Err(Error::InvalidConfig("hash embedding dimension must be at least 1".to_string()));
                }
                Ok(ModelSpec::Hash(dim))
            }
            Some(("minilm", dir)) if !dir.is_empty() => Ok(ModelSpec::MiniLm(Some(expand_path(dir)?))),
            Some(("file", path)) if !path.is_empty() => Ok(ModelSpec::File(expand_path(path)?)),
            _ => Err(unknown_model(model)),
        }
    }
}

fn unknown_model(model: &str) -> Error {
    Error::InvalidConfig(format!(
        "unknown embedding model '{model}'; expected 'all-MiniLM-L6-v2', 'minilm:<dir>', 'hash[:<dim>]' or 'file:<path>'"
    ))
}

/// Resolve a model identifier to a ready encoder.
pub fn embedder_for_model(model: &str) -> Result<Box<dyn Embedder>> {
    match ModelSpec::parse(model)? {
        ModelSpec::Hash(dim) => Ok(Box::new(HashEmbedder::new(dim))),
        ModelSpec::File(path) => Ok(Box::new(PrecomputedEmbedder::from_jsonl(&path)?)),
        ModelSpec::MiniLm(dir) => load_minilm(dir),
    }
}

#[cfg(feature = "bert")]
fn load_minilm(dir: Option<PathBuf>) -> Result<Box<dyn Embedder>> {
    let dir = match dir {
        Some(dir) => dir,
        None => minilm::resolve_model_dir()?,
    };
    Ok(Box::new(MiniLmEmbedder::load(&dir)?))
}

#[cfg(not(feature = "bert"))]
fn load_minilm(_dir: Option<PathBuf>) -> Result<Box<dyn Embedder>> {
    Err(Error::InvalidConfig(
        "sentence-transformer models need irbench-embed built with the `bert` feature".to_string(),
    ))
}
