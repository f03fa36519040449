use crate::error::Result;
use crate::types::Query;

/// Text encoder capability. Every vector returned within a run must have
/// length `dim()`.
pub trait Embedder: Send + Sync {
    /// Stable identifier of the model (e.g. `hash:384`).
    fn model_id(&self) -> &str;
    fn dim(&self) -> usize;
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}

/// A built retrieval index able to score one query against the whole corpus.
///
/// `score` returns one value per corpus document, indexed positionally.
/// Implementations hold only read-only state so queries can be scored
/// concurrently.
pub trait Scorer: Send + Sync {
    fn num_docs(&self) -> usize;
    fn score(&self, query: &Query) -> Result<Vec<f64>>;
}
