//! Domain types shared by the lexical, vector and hybrid layers.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

pub type DocId = String;
pub type Meta = BTreeMap<String, Value>;

const CHUNK_SEPARATOR: &str = "::chunk_";

/// A source document handed to the pipeline.
///
/// - `id`: unique within one corpus
/// - `text`: raw text, normalized during chunking
/// - `source`: origin label used in citations (file name, URL)
/// - `page`: optional page number used in citations
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Document {
    pub id: DocId,
    pub text: String,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub page: Option<u32>,
}

impl Document {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self { id: id.into(), text: text.into(), source: String::new(), page: None }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    pub fn with_page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    /// Citation metadata for every chunk of this document: `source`, plus `page` when known.
    pub fn citation_meta(&self) -> Meta {
        let mut meta = Meta::new();
        meta.insert("source".to_string(), Value::from(self.source.clone()));
        if let Some(page) = self.page {
            meta.insert("page".to_string(), Value::from(page));
        }
        meta
    }
}

/// Identity of one chunk: its document plus a position local to that document.
///
/// Rendered as `{doc_id}::chunk_{local_index}`, the key shared with vector backends.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChunkId {
    pub doc_id: DocId,
    pub local_index: usize,
}

impl ChunkId {
    pub fn new(doc_id: impl Into<String>, local_index: usize) -> Self {
        Self { doc_id: doc_id.into(), local_index }
    }
}

impl fmt::Display for ChunkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.doc_id, CHUNK_SEPARATOR, self.local_index)
    }
}

impl FromStr for ChunkId {
    type Err = Error;

    // Split on the last separator so document ids containing "::" still parse.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (doc_id, index) = s
            .rsplit_once(CHUNK_SEPARATOR)
            .ok_or_else(|| Error::InvalidChunkId(s.to_string()))?;
        if doc_id.is_empty() {
            return Err(Error::InvalidChunkId(s.to_string()));
        }
        let local_index = index.parse::<usize>().map_err(|_| Error::InvalidChunkId(s.to_string()))?;
        Ok(Self::new(doc_id, local_index))
    }
}

/// Conjunction of `key == value` constraints over chunk metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetadataFilter {
    pub equals: Meta,
}

impl MetadataFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn require(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.equals.insert(key.into(), value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.equals.is_empty()
    }

    pub fn matches(&self, meta: &Meta) -> bool {
        self.equals.iter().all(|(key, expected)| meta.get(key) == Some(expected))
    }
}

/// A BM25 hit. `index` is the position in the flattened chunk corpus.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LexicalHit {
    pub index: usize,
    pub score: f32,
}

/// A hit returned by a vector backend, keyed by the rendered chunk id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorHit {
    pub chunk_id: String,
    pub score: f32,
    pub metadata: Meta,
}

/// One retrieved chunk with its text, citation metadata and the score of the
/// stage that produced it (fused score after retrieval, reranker score after reranking).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalResult {
    pub doc_id: DocId,
    pub chunk_id: ChunkId,
    pub text: String,
    pub metadata: Meta,
    pub score: f32,
}
