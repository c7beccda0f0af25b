//! ragkit-hybrid
//!
//! Lexical and vector retrieval fused with RRF, capped per document and
//! refined by a reranker. Start from [`RetrievalPipeline::builder`].

pub mod context;
pub mod corpus;
pub mod evaluation;
pub mod fusion;
pub mod pipeline;
pub mod rerank;

pub use context::{build_cited_context, format_citation};
pub use corpus::Corpus;
pub use fusion::{rrf_combine, rrf_scores, DEFAULT_RRF_K};
pub use pipeline::{PipelineBuilder, RerankStatus, Reranked, RetrievalPipeline};
pub use rerank::{IdentityReranker, TermOverlapReranker};
