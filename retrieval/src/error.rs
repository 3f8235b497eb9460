//! Error types for the retrieval engine.

use http::StatusCode;
use thiserror::Error;

use ideas_embeddings::IdeaId;

/// Result type alias for retrieval operations.
pub type Result<T> = std::result::Result<T, RetrievalError>;

/// Errors that can occur in the retrieval engine.
#[derive(Error, Debug)]
pub enum RetrievalError {
    /// The requested idea does not exist.
    #[error("idea not found: {0}")]
    IdeaNotFound(IdeaId),

    /// Embedding error.
    #[error("embedding error: {0}")]
    Embedding(#[from] ideas_embeddings::EmbeddingError),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl RetrievalError {
    /// HTTP status an API handler should answer with.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::IdeaNotFound(_) => StatusCode::NOT_FOUND,
            Self::Embedding(_) | Self::Config(_) | Self::Io(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}
