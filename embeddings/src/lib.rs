//! # Idea Embeddings
//!
//! Semantic embeddings and similarity search for ideas.
//!
//! ## Features
//!
//! - **Text Projection**: Deterministic embedding input built from an idea's fields
//! - **Embedding Generation**: Vectors from a local Ollama-compatible service
//! - **Persistent Store**: One normalized vector per idea, in memory or on disk
//! - **Similarity Search**: Ranked, thresholded "related ideas"
//! - **Bulk Refresh**: Recompute every idea, tolerating individual failures
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    Embeddings System                            │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  Idea ──► project ──► EmbeddingProvider ──► normalize           │
//! │                                                 │               │
//! │                                                 ▼               │
//! │  SimilarityIndex ◄──────────────────────── EmbeddingStore       │
//! │       │  (miss)                                 ▲               │
//! │       └────────► EmbeddingRefreshService ───────┘               │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod idea;
pub mod index;
pub mod projector;
pub mod provider;
pub mod refresh;
pub mod similarity;
pub mod store;

#[cfg(test)]
mod testing;

pub use config::{ProviderConfig, RefreshConfig, SimilarityConfig, StorageConfig};
pub use error::{EmbeddingError, Result};
pub use idea::{Idea, IdeaSource, IdeaSummary, InMemoryIdeas};
pub use index::{SimilarIdea, SimilarityIndex, SimilarityQuery};
pub use projector::{ProjectedText, project};
pub use provider::{EmbeddingProvider, EmbeddingRequest, EmbeddingResponse, OllamaProvider};
pub use refresh::{EmbeddingRefreshService, RefreshFailure, RefreshFailureReason, RefreshSummary};
pub use similarity::{cosine_similarity, normalize};
pub use store::{EmbeddingRecord, EmbeddingStore, FileEmbeddingStore, InMemoryEmbeddingStore};

/// A dense vector embedding.
pub type Embedding = Vec<f32>;

/// Identifier of an idea in the content system.
pub type IdeaId = i64;

/// Dimension of embeddings (varies by model).
pub const DEFAULT_DIMENSION: usize = 384; // all-MiniLM-L6-v2
