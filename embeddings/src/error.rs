//! Error types for the embeddings system.

use thiserror::Error;

/// Result type alias for embedding operations.
pub type Result<T> = std::result::Result<T, EmbeddingError>;

/// Errors that can occur in the embeddings system.
#[derive(Error, Debug)]
pub enum EmbeddingError {
    /// The vector has zero length or zero norm and cannot be normalized.
    #[error("degenerate vector: cannot normalize an empty or all-zero vector")]
    DegenerateVector,

    /// Two vectors that must be compared have different lengths.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// The embedding service could not produce a vector.
    #[error("embedding provider unavailable: {0}")]
    Unavailable(String),

    /// Persistence failure in an embedding store.
    #[error("storage error: {0}")]
    Storage(String),

    /// Invalid configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl EmbeddingError {
    /// Whether this error came from the provider boundary.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}
