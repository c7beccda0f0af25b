//! Settings loader and path helpers.
//!
//! Figment merges built-in defaults, `config.toml`, `config.<env>.toml` and
//! `APP_*` env vars (`__` separates nested keys, e.g. `APP_CHUNKER__MAX_TOKENS`).

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::chunker::ChunkerConfig;
use crate::error::{Error, Result};

/// What a query does when the vector backend fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VectorFailurePolicy {
    /// Return `Error::VectorIndex` to the caller.
    #[default]
    Propagate,
    /// Log a warning and answer from the lexical index alone.
    LexicalFallback,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    pub rrf_k: f64,
    pub top_retrieve: usize,
    pub top_final: usize,
    pub per_doc_cap: usize,
    /// Fused candidates fetched per requested result before the per-document cap.
    pub candidate_multiplier: usize,
    pub rerank_batch_size: usize,
    pub vector_failure: VectorFailurePolicy,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            rrf_k: 60.0,
            top_retrieve: 30,
            top_final: 5,
            per_doc_cap: 2,
            candidate_multiplier: 3,
            rerank_batch_size: 16,
            vector_failure: VectorFailurePolicy::Propagate,
        }
    }
}

impl RetrievalSettings {
    pub fn validate(&self) -> Result<()> {
        if !(self.rrf_k.is_finite() && self.rrf_k > 0.0) {
            return Err(Error::InvalidConfig(format!("retrieval.rrf_k must be a positive number, got {}", self.rrf_k)));
        }
        if self.per_doc_cap == 0 {
            return Err(Error::InvalidConfig("retrieval.per_doc_cap must be at least 1".into()));
        }
        if self.candidate_multiplier == 0 {
            return Err(Error::InvalidConfig("retrieval.candidate_multiplier must be at least 1".into()));
        }
        if self.rerank_batch_size == 0 {
            return Err(Error::InvalidConfig("retrieval.rerank_batch_size must be at least 1".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    pub chunker: ChunkerConfig,
    pub retrieval: RetrievalSettings,
}

impl PipelineSettings {
    pub fn validate(&self) -> Result<()> {
        self.chunker.validate()?;
        self.retrieval.validate()
    }
}

pub struct Config {
    figment: Figment,
}

impl Config {
    /// Defaults, then `config.toml` (or `$APP_CONFIG_FILE`), then
    /// `config.<env>.toml` beside it, then `APP_*` variables.
    pub fn load() -> Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());
        let base_file = env::var("APP_CONFIG_FILE").map_or_else(|_| PathBuf::from("config.toml"), expand_path);
        Self::load_from(&base_file, &env_name)
    }

    pub fn load_from(base_file: &Path, env_name: &str) -> Result<Self> {
        let base_dir = base_file.parent().unwrap_or_else(|| Path::new(""));
        let mut figment = Figment::from(Serialized::defaults(PipelineSettings::default())).merge(Toml::file(base_file));
        match env_name {
            "dev" | "development" => figment = figment.merge(Toml::file(resolve_with_base(base_dir, "config.dev.toml"))),
            "prod" | "production" => figment = figment.merge(Toml::file(resolve_with_base(base_dir, "config.prod.toml"))),
            "test" | "testing" => figment = figment.merge(Toml::file(resolve_with_base(base_dir, "config.test.toml"))),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));

        let config = Self { figment };
        config.settings()?;
        Ok(config)
    }

    pub fn from_figment(figment: Figment) -> Self {
        Self { figment }
    }

    pub fn get<T>(&self, key: &str) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| Error::InvalidConfig(format!("Failed to get '{key}': {e}")))
    }

    /// Typed, validated pipeline settings.
    pub fn settings(&self) -> Result<PipelineSettings> {
        let settings: PipelineSettings = self
            .figment
            .extract()
            .map_err(|e| Error::InvalidConfig(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

/// Resolve a possibly relative path against `base` after expansion.
pub fn resolve_with_base<S: AsRef<str>>(base: &Path, p: S) -> PathBuf {
    let p = expand_path(p);
    if p.is_absolute() { p } else { base.join(p) }
}
