//! Recomputing stored embeddings from idea text.

use std::fmt;
use std::sync::Arc;

use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::RefreshConfig;
use crate::error::EmbeddingError;
use crate::idea::Idea;
use crate::projector::project;
use crate::provider::{EmbeddingProvider, EmbeddingRequest};
use crate::similarity::normalize;
use crate::store::{EmbeddingRecord, EmbeddingStore};
use crate::IdeaId;

/// Why one idea could not be (re)embedded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum RefreshFailureReason {
    /// The idea has no text to embed.
    EmptyText,
    /// The embedding service failed.
    ProviderUnavailable(String),
    /// The service returned a vector with no direction.
    DegenerateVector,
    /// The record could not be written.
    Storage(String),
}

impl fmt::Display for RefreshFailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyText => f.write_str("no text content to embed"),
            Self::ProviderUnavailable(e) => write!(f, "embedding provider unavailable: {e}"),
            Self::DegenerateVector => f.write_str("provider returned a zero vector"),
            Self::Storage(e) => write!(f, "failed to store embedding: {e}"),
        }
    }
}

impl From<EmbeddingError> for RefreshFailureReason {
    fn from(err: EmbeddingError) -> Self {
        match err {
            EmbeddingError::Unavailable(e) => Self::ProviderUnavailable(e),
            EmbeddingError::DegenerateVector => Self::DegenerateVector,
            other => Self::Storage(other.to_string()),
        }
    }
}

/// A single idea that failed during a bulk refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshFailure {
    pub idea_id: IdeaId,
    pub reason: RefreshFailureReason,
}

/// Outcome of refreshing many ideas.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshSummary {
    /// Ideas attempted.
    pub total: usize,

    /// Ideas whose embedding was stored.
    pub succeeded: usize,

    /// Ideas left as they were.
    pub failed: usize,

    /// Per-idea failure detail, sorted by idea id.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<RefreshFailure>,
}

/// Computes embeddings for ideas and writes them to a store.
pub struct EmbeddingRefreshService {
    provider: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn EmbeddingStore>,
    config: RefreshConfig,
}

impl EmbeddingRefreshService {
    /// Create a new refresh service.
    pub fn new(
        provider: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn EmbeddingStore>,
        config: RefreshConfig,
    ) -> Self {
        Self {
            provider,
            store,
            config,
        }
    }

    /// Recompute and store the embedding for one idea.
    ///
    /// On failure the previously stored record, if any, is left untouched.
    pub async fn try_update_one(
        &self,
        idea: &Idea,
    ) -> std::result::Result<EmbeddingRecord, RefreshFailureReason> {
        let text = project(idea);
        if text.is_blank() {
            return Err(RefreshFailureReason::EmptyText);
        }

        debug!("Embedding idea {} ({} chars)", idea.id, text.as_str().len());

        let response = self
            .provider
            .embed(EmbeddingRequest::new(text.into_string()))
            .await?;
        let vector = normalize(&response.embedding)?;
        let record = self.store.upsert(idea.id, vector).await?;

        Ok(record)
    }

    /// Recompute and store the embedding for one idea, reporting only
    /// whether it worked.
    pub async fn update_one(&self, idea: &Idea) -> bool {
        match self.try_update_one(idea).await {
            Ok(_) => {
                debug!("Updated embedding for idea {}", idea.id);
                true
            }
            Err(reason) => {
                warn!("Failed to update embedding for idea {}: {reason}", idea.id);
                false
            }
        }
    }

    /// Refresh every idea independently. One idea failing never stops the
    /// others.
    pub async fn update_all(&self, ideas: &[Idea]) -> RefreshSummary {
        let concurrency = self.config.concurrency.max(1);
        let mut summary = RefreshSummary {
            total: ideas.len(),
            ..RefreshSummary::default()
        };

        let mut outcomes = futures::stream::iter(ideas)
            .map(|idea| async move { (idea.id, self.try_update_one(idea).await) })
            .buffer_unordered(concurrency);

        while let Some((idea_id, outcome)) = outcomes.next().await {
            match outcome {
                Ok(_) => summary.succeeded += 1,
                Err(reason) => {
                    warn!("Failed to update embedding for idea {idea_id}: {reason}");
                    summary.failed += 1;
                    summary.failures.push(RefreshFailure { idea_id, reason });
                }
            }
        }

        summary.failures.sort_by_key(|f| f.idea_id);

        info!(
            "Refreshed embeddings: {} total, {} succeeded, {} failed",
            summary.total, summary.succeeded, summary.failed
        );
        summary
    }
}
