use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Nothing to index: no documents, or no document produced a chunk.
    #[error("Empty corpus: {0}")]
    EmptyCorpus(String),

    #[error("Malformed chunk id: {0}")]
    InvalidChunkId(String),

    /// The vector backend failed. Callers decide whether to retry.
    #[error("Vector index failed: {0:#}")]
    VectorIndex(anyhow::Error),

    #[error("Lexical index failed: {0}")]
    Lexical(String),
}

impl Error {
    /// Configuration errors are fatal at build time and never worth retrying.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Error::InvalidConfig(_) | Error::EmptyCorpus(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
