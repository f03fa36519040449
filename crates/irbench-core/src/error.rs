use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Pipeline stage an error was raised in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Load,
    Index,
    Query,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Load => "load",
            Stage::Index => "index",
            Stage::Query => "query",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("Failed to load data from {}: {reason}", .path.display())]
    DataLoad { path: PathBuf, reason: String },

    #[error("Duplicate id '{id}' during {stage}")]
    DuplicateId { id: String, stage: Stage },

    #[error("Dimension mismatch for '{id}' during {stage}: expected {expected}, found {found}")]
    DimensionMismatch {
        id: String,
        stage: Stage,
        expected: usize,
        found: usize,
    },

    #[error("Zero-norm embedding for '{id}' during {stage}")]
    ZeroNormVector { id: String, stage: Stage },

    #[error("Non-finite embedding value for '{id}' during {stage}")]
    NonFiniteVector { id: String, stage: Stage },

    #[error("Non-finite score for query '{query_id}' and document '{doc_id}'")]
    NonFiniteScore { query_id: String, doc_id: String },

    #[error("Corpus is empty; no index can be built")]
    EmptyCorpus,

    #[error("Embedding with model '{model}' failed: {reason}")]
    Embedding { model: String, reason: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn data_load(path: impl Into<PathBuf>, reason: impl fmt::Display) -> Self {
        Error::DataLoad { path: path.into(), reason: reason.to_string() }
    }

    pub fn embedding(model: impl Into<String>, reason: impl fmt::Display) -> Self {
        Error::Embedding { model: model.into(), reason: reason.to_string() }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
