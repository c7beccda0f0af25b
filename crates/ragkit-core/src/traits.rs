use std::collections::BTreeMap;

use crate::types::{DocId, Meta, MetadataFilter, RetrievalResult, VectorHit};

pub trait Embedder: Send + Sync {
    fn dim(&self) -> usize;
    fn max_len(&self) -> usize;
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>>;
}

/// Semantic search backend keyed by `{doc_id}::chunk_{i}` ids.
pub trait VectorIndex: Send + Sync {
    /// Insert or replace every chunk of the given documents, with per-document metadata.
    fn upsert_chunks(
        &self,
        chunks: &BTreeMap<DocId, Vec<String>>,
        metadata: &BTreeMap<DocId, Meta>,
    ) -> anyhow::Result<()>;

    fn search(
        &self,
        query: &str,
        top_k: usize,
        filter: Option<&MetadataFilter>,
    ) -> anyhow::Result<Vec<VectorHit>>;
}

/// Precision-oriented second stage. Output is sorted by score, highest first.
pub trait Reranker: Send + Sync {
    fn name(&self) -> &str;
    fn rerank(
        &self,
        query: &str,
        candidates: &[RetrievalResult],
        batch_size: usize,
    ) -> anyhow::Result<Vec<RetrievalResult>>;
}
