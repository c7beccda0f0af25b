use anyhow::Result;
use std::collections::HashSet;

use ragkit_core::tokenize::tokenize;
use ragkit_core::traits::Reranker;
use ragkit_core::types::RetrievalResult;

/// Pass-through reranker: keeps candidate order and retrieval scores.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityReranker;

impl Reranker for IdentityReranker {
    fn name(&self) -> &str { "identity" }

    fn rerank(&self, _query: &str, candidates: &[RetrievalResult], _batch_size: usize) -> Result<Vec<RetrievalResult>> {
        Ok(candidates.to_vec())
    }
}

/// Scores a candidate by the share of distinct query terms it contains.
///
/// A cheap precision signal when no cross-encoder is available. Every
/// candidate is scored on its own, so `batch_size` is ignored; ties keep
/// retrieval order.
#[derive(Debug, Clone, Copy, Default)]
pub struct TermOverlapReranker;

impl Reranker for TermOverlapReranker {
    fn name(&self) -> &str { "term-overlap" }

    fn rerank(&self, query: &str, candidates: &[RetrievalResult], _batch_size: usize) -> Result<Vec<RetrievalResult>> {
        let wanted: HashSet<String> = tokenize(query).into_iter().collect();
        let mut scored: Vec<RetrievalResult> = candidates
            .iter()
            .map(|candidate| {
                let score = if wanted.is_empty() {
                    0.0
                } else {
                    let present: HashSet<String> = tokenize(&candidate.text).into_iter().collect();
                    wanted.intersection(&present).count() as f32 / wanted.len() as f32
                };
                RetrievalResult { score, ..candidate.clone() }
            })
            .collect();
        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        Ok(scored)
    }
}
