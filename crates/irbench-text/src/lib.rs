//! irbench-text
//!
//! Lexical retrieval: the whitespace/lowercase normalizer and an exact,
//! in-memory BM25 engine exposed through the `Scorer` capability.

pub mod bm25;
pub mod scorer;
pub mod tokenize;

pub use bm25::Bm25Index;
pub use scorer::LexicalScorer;
pub use tokenize::tokenize;
