//! irbench-vector
//!
//! Exact dense retrieval. No approximate indexing: every query is compared
//! against every stored document vector.

pub mod dense;
pub mod flat;

pub use dense::DenseScorer;
pub use flat::{l2_normalize, FlatIpIndex};
