//! # Related-Idea Retrieval
//!
//! The surface the idea API handlers call into:
//!
//! - `refresh_one` / `refresh_all`: recompute stored embeddings
//! - `find_similar`: related ideas for one idea
//! - `forget`: drop the embedding of a deleted idea
//!
//! Results are wrapped in [`ApiResponse`] to produce `{success, data}` bodies.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use ideas_retrieval::{EngineConfig, IdeaSimilarityEngine};
//!
//! let config = EngineConfig::load("ideas.toml")?;
//! let engine = IdeaSimilarityEngine::new(config, ideas).await?;
//!
//! engine.refresh_all().await;
//! let related = engine.find_similar(42, Some(5), Some(0.3)).await?;
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod response;

pub use config::EngineConfig;
pub use engine::{EngineStats, IdeaSimilarityEngine, IdeaSimilarityEngineBuilder};
pub use error::{Result, RetrievalError};
pub use response::ApiResponse;

// Re-export from dependencies for convenience
pub use ideas_embeddings::{
    Idea, IdeaId, IdeaSource, RefreshSummary, SimilarIdea, SimilarityQuery,
};
