//! Nearest-neighbour search over stored idea embeddings.
//!
//! The index scans every stored vector, so it suits collections in the
//! thousands. A target idea with no stored vector is embedded on demand
//! (read-through); if that fails the query simply has no matches.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::SimilarityConfig;
use crate::error::Result;
use crate::idea::{Idea, IdeaSource, IdeaSummary};
use crate::refresh::EmbeddingRefreshService;
use crate::similarity::{cosine_similarity, rank_candidates};
use crate::store::{EmbeddingRecord, EmbeddingStore};
use crate::IdeaId;

/// Parameters of a similarity query.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimilarityQuery {
    /// Maximum number of matches.
    pub limit: usize,

    /// Matches scoring strictly below this are dropped.
    pub min_similarity: f32,
}

impl SimilarityQuery {
    /// Create a query.
    pub fn new(limit: usize, min_similarity: f32) -> Self {
        Self {
            limit,
            min_similarity,
        }
    }
}

impl Default for SimilarityQuery {
    fn default() -> Self {
        Self::from(&SimilarityConfig::default())
    }
}

impl From<&SimilarityConfig> for SimilarityQuery {
    fn from(config: &SimilarityConfig) -> Self {
        Self::new(config.default_limit, config.min_similarity)
    }
}

/// One related idea.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarIdea {
    pub idea_id: IdeaId,
    pub similarity: f32,
    pub summary: IdeaSummary,
}

/// Similarity search over an [`EmbeddingStore`].
pub struct SimilarityIndex {
    store: Arc<dyn EmbeddingStore>,
    ideas: Arc<dyn IdeaSource>,
    refresher: Arc<EmbeddingRefreshService>,
}

impl SimilarityIndex {
    /// Create an index. Missing target embeddings are filled through
    /// `refresher`, which should write to the same store.
    pub fn new(
        store: Arc<dyn EmbeddingStore>,
        ideas: Arc<dyn IdeaSource>,
        refresher: Arc<EmbeddingRefreshService>,
    ) -> Self {
        Self {
            store,
            ideas,
            refresher,
        }
    }

    /// Get the target's embedding, computing it once if it is missing.
    async fn resolve(&self, idea: &Idea) -> Result<Option<EmbeddingRecord>> {
        if let Some(record) = self.store.get(idea.id).await? {
            return Ok(Some(record));
        }

        debug!("No embedding for idea {}, computing on demand", idea.id);
        if !self.refresher.update_one(idea).await {
            return Ok(None);
        }
        self.store.get(idea.id).await
    }

    /// Find the ideas most similar to `idea`.
    ///
    /// Returns an empty list when the idea has no embedding and none can be
    /// computed. The caller is expected to have checked that `idea` exists.
    pub async fn find_similar(
        &self,
        idea: &Idea,
        query: SimilarityQuery,
    ) -> Result<Vec<SimilarIdea>> {
        let Some(target) = self.resolve(idea).await? else {
            return Ok(Vec::new());
        };

        let candidates = self.store.all_except(idea.id).await?;
        let ranked = rank_candidates(
            &target.vector,
            candidates
                .iter()
                .map(|record| (record.idea_id, record.vector.as_slice())),
            query.min_similarity,
        );

        let mut results = Vec::with_capacity(query.limit.min(ranked.len()));
        for scored in ranked {
            if results.len() >= query.limit {
                break;
            }
            // Embeddings can outlive their idea until the owner cleans up.
            let Some(other) = self.ideas.get_idea(scored.idea_id).await else {
                debug!("Skipping embedding for missing idea {}", scored.idea_id);
                continue;
            };
            results.push(SimilarIdea {
                idea_id: scored.idea_id,
                similarity: scored.score,
                summary: other.summary(),
            });
        }

        debug!(
            "Found {} similar ideas for idea {} out of {} candidates",
            results.len(),
            idea.id,
            candidates.len()
        );
        Ok(results)
    }

    /// Similarity between two ideas that both have stored embeddings.
    pub async fn similarity_between(&self, a: IdeaId, b: IdeaId) -> Result<Option<f32>> {
        let (Some(a), Some(b)) = (self.store.get(a).await?, self.store.get(b).await?) else {
            return Ok(None);
        };
        Ok(Some(cosine_similarity(&a.vector, &b.vector)?))
    }
}
