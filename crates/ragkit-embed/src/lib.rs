//! Deterministic embedders for offline use and tests.

use anyhow::{bail, Result};
use std::hash::{Hash, Hasher};
use twox_hash::XxHash64;

use ragkit_core::tokenize::tokenize;
use ragkit_core::traits::Embedder;

pub const DEFAULT_DIM: usize = 256;
pub const DEFAULT_MAX_LEN: usize = 512;

/// Feature-hashing embedder: every token adds a signed weight to one of `dim`
/// buckets chosen by xxhash, and the result is L2-normalized.
///
/// Texts sharing vocabulary get a positive cosine; no model files needed.
#[derive(Debug, Clone)]
pub struct HashingEmbedder { dim: usize, max_len: usize }

impl HashingEmbedder {
    pub fn new(dim: usize) -> Result<Self> {
        if dim == 0 { bail!("embedding dimension must be greater than 0"); }
        Ok(Self { dim, max_len: DEFAULT_MAX_LEN })
    }

    pub fn with_max_len(mut self, max_len: usize) -> Self { self.max_len = max_len; self }

    fn embed_one(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0f32; self.dim];
        for token in tokenize(text).iter().take(self.max_len) {
            let mut hasher = XxHash64::with_seed(0);
            token.hash(&mut hasher);
            let h = hasher.finish();
            let idx = (h % self.dim as u64) as usize;
            let sign = if (h >> 63) == 0 { 1.0 } else { -1.0 };
            v[idx] += sign;
        }
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 { for x in &mut v { *x /= norm; } }
        v
    }
}

impl Default for HashingEmbedder {
    fn default() -> Self { Self { dim: DEFAULT_DIM, max_len: DEFAULT_MAX_LEN } }
}

impl Embedder for HashingEmbedder {
    fn dim(&self) -> usize { self.dim }
    fn max_len(&self) -> usize { self.max_len }
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed_one(t)).collect())
    }
}
