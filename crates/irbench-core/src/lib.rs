//! irbench-core
//!
//! Data model, error kinds, run configuration, scoring capabilities and the
//! engine-independent stages (top-K selection, result assembly, artifact IO)
//! shared by the lexical and dense retrieval engines.

pub mod config;
pub mod error;
pub mod loader;
pub mod progress;
pub mod results;
pub mod topk;
pub mod traits;
pub mod types;

pub use error::{Error, Result, Stage};
