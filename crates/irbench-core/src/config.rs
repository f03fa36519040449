//! Layered run configuration and path helpers.
//!
//! Uses Figment to merge `config.toml` + `config.<env>.toml` + `APP_*` env vars
//! (`__` separates nested keys, e.g. `APP_BM25__K1=1.2`). Missing keys fall
//! back to `RunConfig::default()`.

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

pub struct Config {
    figment: Figment,
    base_dir: PathBuf,
}

impl Config {
    /// Load from the current directory, picking the env overlay from `RUST_ENV`.
    pub fn load() -> anyhow::Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());
        Self::load_from(&env::current_dir()?, &env_name)
    }

    pub fn load_from(base_dir: &Path, env_name: &str) -> anyhow::Result<Self> {
        let mut figment = Figment::new().merge(Toml::file(base_dir.join("config.toml")));
        match env_name {
            "dev" | "development" => figment = figment.merge(Toml::file(base_dir.join("config.dev.toml"))),
            "prod" | "production" => figment = figment.merge(Toml::file(base_dir.join("config.prod.toml"))),
            "test" | "testing" => figment = figment.merge(Toml::file(base_dir.join("config.test.toml"))),
            other => tracing::debug!(env = other, "no config overlay for environment"),
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));
        Ok(Self { figment, base_dir: base_dir.to_path_buf() })
    }

    /// Extract and validate the typed run configuration. Relative paths are
    /// resolved against the directory the config was loaded from.
    pub fn run_config(&self) -> anyhow::Result<RunConfig> {
        let mut cfg: RunConfig = self
            .figment
            .extract()
            .map_err(|e| anyhow::anyhow!("Failed to read run configuration: {}", e))?;
        cfg.data_dir = resolve_with_base(&self.base_dir, cfg.data_dir.to_string_lossy())?;
        cfg.output_dir = resolve_with_base(&self.base_dir, cfg.output_dir.to_string_lossy())?;
        cfg.validate()?;
        Ok(cfg)
    }
}

/// Which IDF formula the BM25 engine uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum IdfFormula {
    /// `ln((N - df + 0.5) / (df + 0.5) + 1)`, never negative.
    #[default]
    Lucene,
    /// `ln((N - df + 0.5) / (df + 0.5))`, negative values floored to
    /// `epsilon * mean_idf`.
    Okapi,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Bm25Params {
    pub k1: f64,
    pub b: f64,
    pub idf: IdfFormula,
    /// Only read by `IdfFormula::Okapi`.
    pub epsilon: f64,
}

impl Default for Bm25Params {
    fn default() -> Self {
        Self { k1: 1.5, b: 0.75, idf: IdfFormula::Lucene, epsilon: 0.25 }
    }
}

impl Bm25Params {
    pub fn validate(&self) -> Result<()> {
        if !self.k1.is_finite() || self.k1 < 0.0 {
            return Err(Error::InvalidConfig(format!("bm25.k1 must be a finite value >= 0, got {}", self.k1)));
        }
        if !(0.0..=1.0).contains(&self.b) {
            return Err(Error::InvalidConfig(format!("bm25.b must lie in [0, 1], got {}", self.b)));
        }
        if self.idf == IdfFormula::Okapi && !(self.epsilon.is_finite() && self.epsilon > 0.0) {
            return Err(Error::InvalidConfig(format!("bm25.epsilon must be > 0, got {}", self.epsilon)));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// `all-MiniLM-L6-v2`, `minilm[:<dir>]`, `hash[:<dim>]` or `file:<path>`.
    pub model: String,
    pub batch_size: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self { model: "all-MiniLM-L6-v2".to_string(), batch_size: 64 }
    }
}

/// Immutable, run-scoped settings handed explicitly to every stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub data_dir: PathBuf,
    pub corpus_file: String,
    pub queries_file: String,
    pub output_dir: PathBuf,
    pub top_k: usize,
    pub bm25: Bm25Params,
    pub embedding: EmbeddingConfig,
    /// Worker threads for per-query scoring; rayon's default when unset.
    pub threads: Option<usize>,
    pub progress: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("datasets/scifact"),
            corpus_file: "corpus.jsonl".to_string(),
            queries_file: "queries.jsonl".to_string(),
            output_dir: PathBuf::from("results"),
            top_k: 100,
            bm25: Bm25Params::default(),
            embedding: EmbeddingConfig::default(),
            threads: None,
            progress: true,
        }
    }
}

impl RunConfig {
    pub fn validate(&self) -> Result<()> {
        if self.top_k == 0 {
            return Err(Error::InvalidConfig("top_k must be at least 1".to_string()));
        }
        if self.embedding.batch_size == 0 {
            return Err(Error::InvalidConfig("embedding.batch_size must be at least 1".to_string()));
        }
        if self.threads == Some(0) {
            return Err(Error::InvalidConfig("threads must be at least 1 when set".to_string()));
        }
        self.bm25.validate()
    }

    pub fn corpus_path(&self) -> PathBuf { self.data_dir.join(&self.corpus_file) }

    pub fn queries_path(&self) -> PathBuf { self.data_dir.join(&self.queries_file) }
}

/// Expand a leading `~` and `$VAR`/`${VAR}` references in a user-supplied
/// path. An unset variable is an error rather than being left in place.
pub fn expand_path<S: AsRef<str>>(input: S) -> Result<PathBuf> {
    let s = input.as_ref();
    let expanded = shellexpand::full(s)
        .map_err(|e| Error::InvalidConfig(format!("cannot expand path '{s}': {e}")))?;
    Ok(PathBuf::from(expanded.as_ref()))
}

/// Expand `p`, then join it onto `base` unless it is already absolute.
pub fn resolve_with_base<S: AsRef<str>>(base: &Path, p: S) -> Result<PathBuf> {
    let p = expand_path(p)?;
    Ok(if p.is_absolute() { p } else { base.join(p) })
}
