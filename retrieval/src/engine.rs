//! Related-idea engine implementation.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use ideas_embeddings::{
    EmbeddingProvider, EmbeddingRefreshService, EmbeddingStore, FileEmbeddingStore, IdeaId,
    IdeaSource, InMemoryEmbeddingStore, OllamaProvider, RefreshSummary, SimilarIdea,
    SimilarityIndex, SimilarityQuery,
};

use crate::config::EngineConfig;
use crate::error::{Result, RetrievalError};

/// Entry point used by the idea API handlers.
///
/// Coordinates:
/// - Looking ideas up in the content system
/// - Refreshing stored embeddings, one idea or all of them
/// - Related-idea queries over the stored embeddings
pub struct IdeaSimilarityEngine {
    /// Configuration.
    config: EngineConfig,

    /// Ideas owned by the content system.
    ideas: Arc<dyn IdeaSource>,

    /// Embedding records.
    store: Arc<dyn EmbeddingStore>,

    /// Embedding service.
    provider: Arc<dyn EmbeddingProvider>,

    /// Writes embeddings.
    refresher: Arc<EmbeddingRefreshService>,

    /// Answers similarity queries.
    index: SimilarityIndex,
}

impl IdeaSimilarityEngine {
    /// Create a new engine builder.
    pub fn builder(ideas: Arc<dyn IdeaSource>) -> IdeaSimilarityEngineBuilder {
        IdeaSimilarityEngineBuilder::new(ideas)
    }

    /// Initialize the engine with the given configuration, talking to the
    /// configured Ollama service.
    pub async fn new(config: EngineConfig, ideas: Arc<dyn IdeaSource>) -> Result<Self> {
        Self::builder(ideas).with_config(config).build().await
    }

    fn assemble(
        config: EngineConfig,
        ideas: Arc<dyn IdeaSource>,
        store: Arc<dyn EmbeddingStore>,
        provider: Arc<dyn EmbeddingProvider>,
    ) -> Self {
        let refresher = Arc::new(EmbeddingRefreshService::new(
            Arc::clone(&provider),
            Arc::clone(&store),
            config.refresh.clone(),
        ));
        let index = SimilarityIndex::new(
            Arc::clone(&store),
            Arc::clone(&ideas),
            Arc::clone(&refresher),
        );

        Self {
            config,
            ideas,
            store,
            provider,
            refresher,
            index,
        }
    }

    /// The engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Recompute the embedding for one idea.
    ///
    /// `Ok(false)` means the idea exists but could not be embedded; its
    /// previous embedding, if any, is kept.
    pub async fn refresh_one(&self, idea_id: IdeaId) -> Result<bool> {
        let idea = self
            .ideas
            .get_idea(idea_id)
            .await
            .ok_or(RetrievalError::IdeaNotFound(idea_id))?;

        Ok(self.refresher.update_one(&idea).await)
    }

    /// Recompute the embeddings of every idea.
    pub async fn refresh_all(&self) -> RefreshSummary {
        let ideas = self.ideas.list_ideas().await;
        info!("Refreshing embeddings for {} ideas", ideas.len());
        self.refresher.update_all(&ideas).await
    }

    /// Find ideas related to `idea_id`.
    ///
    /// `limit` and `min_similarity` fall back to the configured defaults.
    pub async fn find_similar(
        &self,
        idea_id: IdeaId,
        limit: Option<usize>,
        min_similarity: Option<f32>,
    ) -> Result<Vec<SimilarIdea>> {
        let idea = self
            .ideas
            .get_idea(idea_id)
            .await
            .ok_or(RetrievalError::IdeaNotFound(idea_id))?;

        let defaults = SimilarityQuery::from(&self.config.similarity);
        let query = SimilarityQuery::new(
            limit.unwrap_or(defaults.limit),
            min_similarity.unwrap_or(defaults.min_similarity),
        );

        debug!(
            "Finding up to {} ideas similar to {idea_id} (min {})",
            query.limit, query.min_similarity
        );
        Ok(self.index.find_similar(&idea, query).await?)
    }

    /// Drop the stored embedding of a deleted idea.
    pub async fn forget(&self, idea_id: IdeaId) -> Result<()> {
        self.store.delete(idea_id).await?;
        debug!("Forgot embedding for idea {idea_id}");
        Ok(())
    }

    /// Get engine statistics.
    pub async fn stats(&self) -> EngineStats {
        EngineStats {
            ideas: self.ideas.list_ideas().await.len(),
            embeddings_stored: self.store.len().await,
            provider: self.provider.name().to_string(),
            model: self.provider.default_model().to_string(),
        }
    }
}

/// Builder for [`IdeaSimilarityEngine`].
pub struct IdeaSimilarityEngineBuilder {
    config: EngineConfig,
    ideas: Arc<dyn IdeaSource>,
    store: Option<Arc<dyn EmbeddingStore>>,
    provider: Option<Arc<dyn EmbeddingProvider>>,
}

impl IdeaSimilarityEngineBuilder {
    /// Create a new builder reading ideas from `ideas`.
    pub fn new(ideas: Arc<dyn IdeaSource>) -> Self {
        Self {
            config: EngineConfig::default(),
            ideas,
            store: None,
            provider: None,
        }
    }

    /// Replace the whole configuration.
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Use this store instead of the configured one.
    pub fn with_store(mut self, store: Arc<dyn EmbeddingStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Use this provider instead of the configured Ollama service.
    pub fn with_provider(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Build the engine.
    pub async fn build(self) -> Result<IdeaSimilarityEngine> {
        info!("Initializing idea similarity engine");

        let store: Arc<dyn EmbeddingStore> = match (self.store, &self.config.storage.path) {
            (Some(store), _) => store,
            (None, Some(path)) => Arc::new(FileEmbeddingStore::open(path).await?),
            (None, None) => Arc::new(InMemoryEmbeddingStore::new()),
        };

        let provider: Arc<dyn EmbeddingProvider> = match self.provider {
            Some(provider) => provider,
            None => Arc::new(OllamaProvider::new(self.config.provider.clone())?),
        };

        info!(
            "Using {} embeddings with model {}",
            provider.name(),
            provider.default_model()
        );
        Ok(IdeaSimilarityEngine::assemble(
            self.config,
            self.ideas,
            store,
            provider,
        ))
    }
}

/// Statistics about the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineStats {
    /// Number of ideas in the content system.
    pub ideas: usize,

    /// Number of stored embeddings.
    pub embeddings_stored: usize,

    /// Provider name.
    pub provider: String,

    /// Model used for new embeddings.
    pub model: String,
}
