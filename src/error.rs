use std::path::PathBuf;

use thiserror::Error;

/// Error type for every fallible operation of the topic model
#[derive(Error, Debug)]
pub enum TopicError {
    /// Vocabulary has no entries left once pruning is applied
    #[error("vocabulary is empty after pruning (min_count={min_count}, max_ratio={max_ratio})")]
    EmptyVocabulary { min_count: u64, max_ratio: f64 },

    /// A persisted artifact needed by the operation does not exist
    #[error("artifact not found: {}", .0.display())]
    MissingArtifact(PathBuf),

    /// Artifact exists but its content is unusable
    #[error("artifact {} is corrupt: {reason}", path.display())]
    CorruptArtifact { path: PathBuf, reason: String },

    /// A lemma key passed to inference lacks the category separator
    #[error("lemma {0:?} has no '/' category separator")]
    MalformedLemma(String),

    /// Inference input mixes (lemma, category) tuples and lemma keys
    #[error("lemma list mixes (lemma, category) tuples and lemma keys")]
    MixedLemmaInput,

    /// Model configuration rejected at construction
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_cbor::Error),
}

pub type Result<T> = std::result::Result<T, TopicError>;
