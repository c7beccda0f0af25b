use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info, warn};

use ragkit_core::chunker::{Chunker, ChunkerConfig};
use ragkit_core::config::{PipelineSettings, RetrievalSettings, VectorFailurePolicy};
use ragkit_core::error::{Error, Result};
use ragkit_core::traits::{Reranker, VectorIndex};
use ragkit_core::types::{ChunkId, Document, Meta, MetadataFilter, RetrievalResult};
use ragkit_text::Bm25Index;

use crate::corpus::Corpus;
use crate::fusion::rrf_scores;
use crate::rerank::IdentityReranker;

/// Whether the reranker produced the final order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RerankStatus {
    Reranked,
    /// The reranker failed; results are in retrieval order with score 0.0.
    Degraded { reason: String },
}

#[derive(Debug, Clone)]
pub struct Reranked {
    pub results: Vec<RetrievalResult>,
    pub status: RerankStatus,
}

impl Reranked {
    pub fn is_degraded(&self) -> bool {
        matches!(self.status, RerankStatus::Degraded { .. })
    }

    pub fn into_results(self) -> Vec<RetrievalResult> {
        self.results
    }
}

struct Candidate {
    id: ChunkId,
    score: f64,
    backend: Option<Meta>,
}

pub struct PipelineBuilder {
    settings: PipelineSettings,
    vector: Option<Arc<dyn VectorIndex>>,
    reranker: Arc<dyn Reranker>,
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self { settings: PipelineSettings::default(), vector: None, reranker: Arc::new(IdentityReranker) }
    }
}

impl PipelineBuilder {
    pub fn settings(mut self, settings: PipelineSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn chunker(mut self, config: ChunkerConfig) -> Self {
        self.settings.chunker = config;
        self
    }

    pub fn retrieval(mut self, settings: RetrievalSettings) -> Self {
        self.settings.retrieval = settings;
        self
    }

    /// Per-document cap used by `retrieve_and_rerank`.
    pub fn per_doc_cap(mut self, cap: usize) -> Self {
        self.settings.retrieval.per_doc_cap = cap;
        self
    }

    pub fn vector_index(mut self, index: Arc<dyn VectorIndex>) -> Self {
        self.vector = Some(index);
        self
    }

    pub fn reranker(mut self, reranker: Arc<dyn Reranker>) -> Self {
        self.reranker = reranker;
        self
    }

    pub fn build(self, documents: Vec<Document>) -> Result<RetrievalPipeline> {
        RetrievalPipeline::assemble(documents, self.settings, self.vector, self.reranker)
    }
}

/// Hybrid retrieval over an immutable corpus.
///
/// Queries take `&self`; share one pipeline across threads with `Arc`.
pub struct RetrievalPipeline {
    corpus: Corpus,
    lexical: Bm25Index,
    vector: Option<Arc<dyn VectorIndex>>,
    reranker: Arc<dyn Reranker>,
    settings: PipelineSettings,
}

impl RetrievalPipeline {
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::default()
    }

    /// Chunk `documents`, index them lexically and, when given, in `vector_index`.
    /// Without a vector index the pipeline runs lexical-only.
    pub fn build(
        documents: Vec<Document>,
        chunker: ChunkerConfig,
        vector_index: Option<Arc<dyn VectorIndex>>,
        reranker: Arc<dyn Reranker>,
    ) -> Result<Self> {
        let settings = PipelineSettings { chunker, ..PipelineSettings::default() };
        Self::assemble(documents, settings, vector_index, reranker)
    }

    fn assemble(
        documents: Vec<Document>,
        settings: PipelineSettings,
        vector: Option<Arc<dyn VectorIndex>>,
        reranker: Arc<dyn Reranker>,
    ) -> Result<Self> {
        settings.validate()?;
        if documents.is_empty() {
            return Err(Error::EmptyCorpus("no documents supplied".into()));
        }

        let chunker = Chunker::new(settings.chunker)?;
        let chunks: Vec<Vec<String>> = documents.iter().map(|d| chunker.chunk(&d.text)).collect();
        let corpus = Corpus::new(documents, chunks)?;
        if corpus.chunk_count() == 0 {
            return Err(Error::EmptyCorpus("no document produced a chunk".into()));
        }

        let lexical = Bm25Index::build(corpus.chunk_texts())?;
        if let Some(index) = &vector {
            let (chunks, meta) = corpus.upsert_batches();
            index.upsert_chunks(&chunks, &meta).map_err(Error::VectorIndex)?;
        }

        info!(
            documents = corpus.documents().len(),
            chunks = corpus.chunk_count(),
            vector = vector.is_some(),
            reranker = reranker.name(),
            "retrieval pipeline ready"
        );
        Ok(Self { corpus, lexical, vector, reranker, settings })
    }

    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    pub fn has_vector_index(&self) -> bool {
        self.vector.is_some()
    }

    /// Chunk ids ranked by RRF over lexical and vector results, or by BM25
    /// alone when there are no vector hits. At most `top_k` ids.
    ///
    /// `filter` is forwarded to the vector backend; lexical hits are unfiltered.
    pub fn retrieve_hybrid(&self, query: &str, top_k: usize, filter: Option<&MetadataFilter>) -> Result<Vec<ChunkId>> {
        Ok(self.fused(query, top_k, filter)?.into_iter().map(|c| c.id).collect())
    }

    /// Up to `top_k` results, at most `per_doc_cap` per document, in fused order.
    ///
    /// Scans `candidate_multiplier * top_k` fused candidates; chunks over the
    /// cap are skipped, not re-ranked. `score` is the fused RRF score.
    pub fn retrieve_with_metadata(
        &self,
        query: &str,
        top_k: usize,
        per_doc_cap: usize,
        filter: Option<&MetadataFilter>,
    ) -> Result<Vec<RetrievalResult>> {
        if per_doc_cap == 0 {
            return Err(Error::InvalidConfig("per_doc_cap must be at least 1".into()));
        }
        if top_k == 0 {
            return Ok(Vec::new());
        }

        let chunk_count = self.corpus.chunk_count();
        let pool = top_k.saturating_mul(self.settings.retrieval.candidate_multiplier).min(chunk_count);
        let mut taken: HashMap<String, usize> = HashMap::new();
        let mut results = Vec::with_capacity(top_k.min(chunk_count));
        for candidate in self.fused(query, pool, filter)? {
            let count = taken.entry(candidate.id.doc_id.clone()).or_insert(0);
            if *count >= per_doc_cap {
                continue;
            }
            let Some(text) = self.corpus.chunk_text(&candidate.id) else {
                continue;
            };
            *count += 1;

            let mut metadata = self.corpus.local_metadata(&candidate.id).unwrap_or_default();
            if let Some(extra) = candidate.backend {
                metadata.extend(extra);
            }
            results.push(RetrievalResult {
                doc_id: candidate.id.doc_id.clone(),
                text: text.to_string(),
                metadata,
                score: candidate.score as f32,
                chunk_id: candidate.id,
            });
            if results.len() >= top_k {
                break;
            }
        }
        Ok(results)
    }

    /// Retrieve `top_retrieve` diverse candidates, rerank them and keep `top_final`.
    pub fn retrieve_and_rerank(&self, query: &str, top_retrieve: usize, top_final: usize) -> Result<Reranked> {
        let candidates = self.retrieve_with_metadata(query, top_retrieve, self.settings.retrieval.per_doc_cap, None)?;
        Ok(self.rerank_candidates(query, candidates, top_final))
    }

    /// `retrieve_and_rerank` with the configured `top_retrieve` and `top_final`.
    pub fn retrieve_and_rerank_default(&self, query: &str) -> Result<Reranked> {
        let retrieval = &self.settings.retrieval;
        self.retrieve_and_rerank(query, retrieval.top_retrieve, retrieval.top_final)
    }

    /// Rerank already retrieved candidates. A reranker failure never fails the
    /// query: candidates keep their order, scores drop to 0.0, and the status
    /// says `Degraded`.
    pub fn rerank_candidates(&self, query: &str, candidates: Vec<RetrievalResult>, top_final: usize) -> Reranked {
        if candidates.is_empty() {
            return Reranked { results: candidates, status: RerankStatus::Reranked };
        }
        match self.reranker.rerank(query, &candidates, self.settings.retrieval.rerank_batch_size) {
            Ok(mut scored) => {
                scored.sort_by(|a, b| b.score.total_cmp(&a.score));
                scored.truncate(top_final);
                debug!(reranker = self.reranker.name(), candidates = candidates.len(), kept = scored.len(), "reranked");
                Reranked { results: scored, status: RerankStatus::Reranked }
            }
            Err(err) => {
                let reason = format!("{err:#}");
                warn!(reranker = self.reranker.name(), error = %reason, "reranker failed; keeping retrieval order");
                let results = candidates
                    .into_iter()
                    .take(top_final)
                    .map(|r| RetrievalResult { score: 0.0, ..r })
                    .collect();
                Reranked { results, status: RerankStatus::Degraded { reason } }
            }
        }
    }

    fn fused(&self, query: &str, top_k: usize, filter: Option<&MetadataFilter>) -> Result<Vec<Candidate>> {
        // No ranking can hold more ids than the corpus has chunks.
        let top_k = top_k.min(self.corpus.chunk_count());
        if top_k == 0 {
            return Ok(Vec::new());
        }
        let lexical: Vec<ChunkId> = self
            .lexical
            .search(query, top_k)?
            .into_iter()
            .filter_map(|hit| self.corpus.chunk_at(hit.index))
            .collect();

        let mut backend: HashMap<ChunkId, Meta> = HashMap::new();
        let mut vector: Vec<ChunkId> = Vec::new();
        for (id, meta) in self.vector_hits(query, top_k, filter)? {
            vector.push(id.clone());
            backend.insert(id, meta);
        }

        let k = self.settings.retrieval.rrf_k;
        let (lexical_count, vector_count) = (lexical.len(), vector.len());
        let mut fused = if vector.is_empty() { rrf_scores(&[lexical], k) } else { rrf_scores(&[lexical, vector], k) };
        fused.truncate(top_k);
        debug!(lexical = lexical_count, vector = vector_count, fused = fused.len(), "hybrid retrieval");

        Ok(fused
            .into_iter()
            .map(|(id, score)| {
                let backend = backend.remove(&id);
                Candidate { id, score, backend }
            })
            .collect())
    }

    fn vector_hits(&self, query: &str, top_k: usize, filter: Option<&MetadataFilter>) -> Result<Vec<(ChunkId, Meta)>> {
        let Some(index) = &self.vector else {
            return Ok(Vec::new());
        };
        let hits = match index.search(query, top_k, filter) {
            Ok(hits) => hits,
            Err(err) => match self.settings.retrieval.vector_failure {
                VectorFailurePolicy::Propagate => return Err(Error::VectorIndex(err)),
                VectorFailurePolicy::LexicalFallback => {
                    warn!(error = %format!("{err:#}"), "vector search failed; answering from the lexical index");
                    return Ok(Vec::new());
                }
            },
        };

        let mut seen = HashSet::new();
        let mut out = Vec::with_capacity(hits.len());
        for hit in hits {
            match hit.chunk_id.parse::<ChunkId>() {
                Ok(id) if self.corpus.contains(&id) => {
                    if seen.insert(id.clone()) {
                        out.push((id, hit.metadata));
                    }
                }
                _ => warn!(chunk_id = %hit.chunk_id, "skipping vector hit outside the corpus"),
            }
        }
        Ok(out)
    }
}
