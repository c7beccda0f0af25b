//! Retrieval quality metrics over document ids, before and after reranking.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, info};

use ragkit_core::error::Result;
use ragkit_core::types::RetrievalResult;

use crate::pipeline::RetrievalPipeline;

/// Query text mapped to the ids of the documents judged relevant to it.
pub type Qrels = BTreeMap<String, HashSet<String>>;

/// Fraction of the first `k` predictions that are relevant. Divides by `k`
/// even when fewer than `k` ids were predicted.
pub fn precision_at_k(predicted: &[String], relevant: &HashSet<String>, k: usize) -> f64 {
    if k == 0 {
        return 0.0;
    }
    let hits = predicted.iter().take(k).filter(|id| relevant.contains(*id)).count();
    hits as f64 / k as f64
}

pub fn recall_at_k(predicted: &[String], relevant: &HashSet<String>, k: usize) -> f64 {
    if relevant.is_empty() {
        return 0.0;
    }
    let hits = predicted.iter().take(k).filter(|id| relevant.contains(*id)).count();
    hits as f64 / relevant.len() as f64
}

/// Binary-relevance nDCG.
pub fn ndcg_at_k(predicted: &[String], relevant: &HashSet<String>, k: usize) -> f64 {
    let discount = |i: usize| 1.0 / ((i + 2) as f64).log2();
    let ideal: f64 = (0..k.min(relevant.len())).map(discount).sum();
    if ideal == 0.0 {
        return 0.0;
    }
    let dcg: f64 = predicted
        .iter()
        .take(k)
        .enumerate()
        .filter(|(_, id)| relevant.contains(*id))
        .map(|(i, _)| discount(i))
        .sum();
    dcg / ideal
}

/// Reciprocal rank of the first relevant id, 0.0 when none is relevant.
pub fn mrr(predicted: &[String], relevant: &HashSet<String>) -> f64 {
    predicted
        .iter()
        .position(|id| relevant.contains(id))
        .map_or(0.0, |i| 1.0 / (i + 1) as f64)
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricSet {
    pub precision_pre: f64,
    pub recall_pre: f64,
    pub ndcg_pre: f64,
    pub precision_post: f64,
    pub recall_post: f64,
    pub ndcg_post: f64,
    pub mrr_pre: f64,
    pub mrr_post: f64,
}

impl MetricSet {
    fn compute(pre: &[String], post: &[String], relevant: &HashSet<String>, k: usize) -> Self {
        Self {
            precision_pre: precision_at_k(pre, relevant, k),
            recall_pre: recall_at_k(pre, relevant, k),
            ndcg_pre: ndcg_at_k(pre, relevant, k),
            precision_post: precision_at_k(post, relevant, k),
            recall_post: recall_at_k(post, relevant, k),
            ndcg_post: ndcg_at_k(post, relevant, k),
            mrr_pre: mrr(pre, relevant),
            mrr_post: mrr(post, relevant),
        }
    }

    fn mean(sets: &[&MetricSet]) -> Self {
        if sets.is_empty() {
            return Self::default();
        }
        let n = sets.len() as f64;
        let avg = |f: fn(&MetricSet) -> f64| sets.iter().map(|s| f(s)).sum::<f64>() / n;
        Self {
            precision_pre: avg(|s| s.precision_pre),
            recall_pre: avg(|s| s.recall_pre),
            ndcg_pre: avg(|s| s.ndcg_pre),
            precision_post: avg(|s| s.precision_post),
            recall_post: avg(|s| s.recall_post),
            ndcg_post: avg(|s| s.ndcg_post),
            mrr_pre: avg(|s| s.mrr_pre),
            mrr_post: avg(|s| s.mrr_post),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryEvaluation {
    pub query: String,
    pub k: usize,
    #[serde(flatten)]
    pub metrics: MetricSet,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MacroAverage {
    pub k: usize,
    pub queries: usize,
    #[serde(flatten)]
    pub metrics: MetricSet,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub rows: Vec<QueryEvaluation>,
    pub averages: Vec<MacroAverage>,
}

/// Distinct document ids in rank order.
fn doc_ids(results: &[RetrievalResult]) -> Vec<String> {
    let mut seen = HashSet::new();
    results
        .iter()
        .filter(|r| seen.insert(r.doc_id.as_str()))
        .map(|r| r.doc_id.clone())
        .collect()
}

/// Score every query in `qrels` at each cutoff in `ks`.
///
/// "pre" ids come from `retrieve_with_metadata(top_retrieve)` with the
/// pipeline's per-document cap; "post" ids from reranking those same
/// candidates down to `top_final`.
pub fn evaluate(
    pipeline: &RetrievalPipeline,
    qrels: &Qrels,
    ks: &[usize],
    top_retrieve: usize,
    top_final: usize,
) -> Result<EvaluationReport> {
    info!(queries = qrels.len(), top_retrieve, top_final, ?ks, "evaluating retrieval");
    let cap = pipeline.settings().retrieval.per_doc_cap;
    let mut rows = Vec::with_capacity(qrels.len() * ks.len());

    for (query, relevant) in qrels {
        let candidates = pipeline.retrieve_with_metadata(query, top_retrieve, cap, None)?;
        let pre = doc_ids(&candidates);
        let reranked = pipeline.rerank_candidates(query, candidates, top_final);
        let post = doc_ids(&reranked.results);
        debug!(query = %query, pre = pre.len(), post = post.len(), degraded = reranked.is_degraded(), "evaluated query");

        for &k in ks {
            rows.push(QueryEvaluation { query: query.clone(), k, metrics: MetricSet::compute(&pre, &post, relevant, k) });
        }
    }

    let mut by_k: BTreeMap<usize, Vec<&MetricSet>> = BTreeMap::new();
    for row in &rows {
        by_k.entry(row.k).or_default().push(&row.metrics);
    }
    let averages = by_k
        .into_iter()
        .map(|(k, sets)| MacroAverage { k, queries: sets.len(), metrics: MetricSet::mean(&sets) })
        .collect();

    Ok(EvaluationReport { rows, averages })
}
