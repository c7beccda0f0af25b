//! ragkit-vector
//!
//! Reference `VectorIndex`: brute-force cosine search over an in-memory registry.
//! Suitable for tests and corpora small enough to scan per query.

use anyhow::{anyhow, bail, Result};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;
use tracing::debug;

use ragkit_core::traits::{Embedder, VectorIndex};
use ragkit_core::types::{ChunkId, DocId, Meta, MetadataFilter, VectorHit};

struct Entry {
    chunk_id: String,
    vector: Vec<f32>,
    metadata: Meta,
}

pub struct MemoryVectorIndex {
    embedder: Box<dyn Embedder>,
    entries: RwLock<Vec<Entry>>,
}

impl MemoryVectorIndex {
    pub fn new(embedder: Box<dyn Embedder>) -> Self {
        Self { embedder, entries: RwLock::new(Vec::new()) }
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn embed_checked(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let vectors = self.embedder.embed_batch(texts)?;
        if vectors.len() != texts.len() {
            bail!("embedder returned {} vectors for {} texts", vectors.len(), texts.len());
        }
        if let Some(bad) = vectors.iter().find(|v| v.len() != self.embedder.dim()) {
            bail!("embedder returned a {}-dim vector, expected {}", bad.len(), self.embedder.dim());
        }
        Ok(vectors)
    }
}

pub fn cosine(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let na = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let nb = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if na == 0.0 || nb == 0.0 { 0.0 } else { dot / (na * nb) }
}

impl VectorIndex for MemoryVectorIndex {
    fn upsert_chunks(
        &self,
        chunks: &BTreeMap<DocId, Vec<String>>,
        metadata: &BTreeMap<DocId, Meta>,
    ) -> Result<()> {
        let mut fresh = Vec::new();
        for (doc_id, texts) in chunks {
            let vectors = self.embed_checked(texts)?;
            for (local_index, vector) in vectors.into_iter().enumerate() {
                let chunk_id = ChunkId::new(doc_id.clone(), local_index).to_string();
                let mut meta = metadata.get(doc_id).cloned().unwrap_or_default();
                meta.insert("doc_id".into(), Value::from(doc_id.clone()));
                meta.insert("local_index".into(), Value::from(local_index));
                meta.insert("chunk_id".into(), Value::from(chunk_id.clone()));
                fresh.push(Entry { chunk_id, vector, metadata: meta });
            }
        }

        let mut entries = self.entries.write().map_err(|_| anyhow!("vector registry lock poisoned"))?;
        let mut positions: HashMap<String, usize> =
            entries.iter().enumerate().map(|(i, e)| (e.chunk_id.clone(), i)).collect();
        for entry in fresh {
            match positions.get(&entry.chunk_id) {
                Some(&i) => entries[i] = entry,
                None => {
                    positions.insert(entry.chunk_id.clone(), entries.len());
                    entries.push(entry);
                }
            }
        }
        debug!(entries = entries.len(), "vector registry updated");
        Ok(())
    }

    fn search(&self, query: &str, top_k: usize, filter: Option<&MetadataFilter>) -> Result<Vec<VectorHit>> {
        if top_k == 0 {
            return Ok(Vec::new());
        }
        let query_vec = self
            .embed_checked(&[query.to_string()])?
            .pop()
            .ok_or_else(|| anyhow!("embedder returned no query vector"))?;

        let entries = self.entries.read().map_err(|_| anyhow!("vector registry lock poisoned"))?;
        let mut scored: Vec<(f32, &Entry)> = entries
            .iter()
            .filter(|e| filter.map_or(true, |f| f.matches(&e.metadata)))
            .map(|e| (cosine(&query_vec, &e.vector), e))
            .collect();
        // stable: equal scores keep registry order
        scored.sort_by(|a, b| b.0.total_cmp(&a.0));

        Ok(scored
            .into_iter()
            .take(top_k)
            .map(|(score, e)| VectorHit { chunk_id: e.chunk_id.clone(), score, metadata: e.metadata.clone() })
            .collect())
    }
}
