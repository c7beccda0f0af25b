use serde_json::Value;
use std::collections::{BTreeMap, HashMap};

use ragkit_core::error::{Error, Result};
use ragkit_core::types::{ChunkId, DocId, Document, Meta};

#[derive(Debug, Clone, Copy)]
struct ChunkRef {
    doc: usize,
    local: usize,
}

/// Documents and their chunks, plus the flattened chunk order shared with the
/// lexical index. Built once, read-only afterwards.
#[derive(Debug)]
pub struct Corpus {
    documents: Vec<Document>,
    positions: HashMap<DocId, usize>,
    chunks: Vec<Vec<String>>,
    global: Vec<ChunkRef>,
}

impl Corpus {
    /// `chunks[i]` are the chunks of `documents[i]`. Document ids must be unique.
    pub fn new(documents: Vec<Document>, chunks: Vec<Vec<String>>) -> Result<Self> {
        if documents.len() != chunks.len() {
            return Err(Error::InvalidConfig(format!(
                "{} documents but {} chunk lists",
                documents.len(),
                chunks.len()
            )));
        }
        let mut positions = HashMap::with_capacity(documents.len());
        for (i, doc) in documents.iter().enumerate() {
            if positions.insert(doc.id.clone(), i).is_some() {
                return Err(Error::InvalidConfig(format!("duplicate document id '{}'", doc.id)));
            }
        }
        let global = chunks
            .iter()
            .enumerate()
            .flat_map(|(doc, list)| (0..list.len()).map(move |local| ChunkRef { doc, local }))
            .collect();
        Ok(Self { documents, positions, chunks, global })
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn document(&self, doc_id: &str) -> Option<&Document> {
        self.positions.get(doc_id).map(|&i| &self.documents[i])
    }

    pub fn chunks_of(&self, doc_id: &str) -> Option<&[String]> {
        self.positions.get(doc_id).map(|&i| self.chunks[i].as_slice())
    }

    pub fn chunk_count(&self) -> usize {
        self.global.len()
    }

    /// Chunk texts in global order.
    pub fn chunk_texts(&self) -> impl Iterator<Item = &str> + '_ {
        self.global.iter().map(|r| self.chunks[r.doc][r.local].as_str())
    }

    /// Chunk id at a position of the global order.
    pub fn chunk_at(&self, global_index: usize) -> Option<ChunkId> {
        self.global
            .get(global_index)
            .map(|r| ChunkId::new(self.documents[r.doc].id.clone(), r.local))
    }

    pub fn chunk_text(&self, id: &ChunkId) -> Option<&str> {
        let doc = *self.positions.get(&id.doc_id)?;
        self.chunks[doc].get(id.local_index).map(String::as_str)
    }

    pub fn contains(&self, id: &ChunkId) -> bool {
        self.chunk_text(id).is_some()
    }

    /// `doc_id`, `local_index`, `source`, and `page` when the document has one.
    pub fn local_metadata(&self, id: &ChunkId) -> Option<Meta> {
        let doc = self.document(&id.doc_id)?;
        let mut meta = doc.citation_meta();
        meta.insert("doc_id".into(), Value::from(doc.id.clone()));
        meta.insert("local_index".into(), Value::from(id.local_index));
        Some(meta)
    }

    /// Per-document chunk lists and citation metadata, shaped for `VectorIndex::upsert_chunks`.
    pub fn upsert_batches(&self) -> (BTreeMap<DocId, Vec<String>>, BTreeMap<DocId, Meta>) {
        let mut chunks = BTreeMap::new();
        let mut meta = BTreeMap::new();
        for (doc, list) in self.documents.iter().zip(&self.chunks) {
            if list.is_empty() {
                continue;
            }
            chunks.insert(doc.id.clone(), list.clone());
            meta.insert(doc.id.clone(), doc.citation_meta());
        }
        (chunks, meta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_order_follows_documents_then_chunks() {
        let docs = vec![Document::new("a", ""), Document::new("b", ""), Document::new("c", "")];
        let chunks = vec![vec!["a0".to_string(), "a1".to_string()], vec![], vec!["c0".to_string()]];
        let corpus = Corpus::new(docs, chunks).expect("corpus");

        assert_eq!(corpus.chunk_count(), 3);
        assert_eq!(corpus.chunk_texts().collect::<Vec<_>>(), vec!["a0", "a1", "c0"]);
        assert_eq!(corpus.chunk_at(2), Some(ChunkId::new("c", 0)));
        assert_eq!(corpus.chunk_at(3), None);
        assert!(!corpus.contains(&ChunkId::new("b", 0)));
        assert_eq!(corpus.upsert_batches().0.len(), 2);
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let docs = vec![Document::new("a", "x"), Document::new("a", "y")];
        let err = Corpus::new(docs, vec![vec![], vec![]]).unwrap_err();
        assert!(err.is_configuration());
    }
}
