//! ragkit-text
//!
//! BM25 over the flattened chunk corpus, backed by an in-RAM tantivy index.

pub mod tantivy_utils;
pub mod index;

pub use index::Bm25Index;
