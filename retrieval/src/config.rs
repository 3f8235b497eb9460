//! Configuration for the retrieval engine.

use std::path::Path;

use serde::{Deserialize, Serialize};

use ideas_embeddings::{ProviderConfig, RefreshConfig, SimilarityConfig, StorageConfig};

use crate::error::{Result, RetrievalError};

/// Configuration for the retrieval engine.
///
/// Every section is optional in a config file; missing values take their
/// defaults.
///
/// ```toml
/// [provider]
/// base_url = "http://localhost:11434"
/// model = "all-minilm"
/// timeout_secs = 30
///
/// [similarity]
/// default_limit = 5
/// min_similarity = 0.3
///
/// [refresh]
/// concurrency = 4
///
/// [storage]
/// path = "/var/lib/ideas/embeddings"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Embedding service configuration.
    pub provider: ProviderConfig,

    /// Defaults for similarity queries.
    pub similarity: SimilarityConfig,

    /// Bulk refresh configuration.
    pub refresh: RefreshConfig,

    /// Where embedding records are kept.
    pub storage: StorageConfig,
}

impl EngineConfig {
    /// Parse a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| RetrievalError::Config(e.to_string()))
    }

    /// Read a TOML config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
            .map_err(|e| RetrievalError::Config(format!("{}: {e}", path.display())))
    }

    /// Set the provider configuration.
    pub fn with_provider(mut self, config: ProviderConfig) -> Self {
        self.provider = config;
        self
    }

    /// Set the similarity defaults.
    pub fn with_similarity(mut self, config: SimilarityConfig) -> Self {
        self.similarity = config;
        self
    }

    /// Set the refresh configuration.
    pub fn with_refresh(mut self, config: RefreshConfig) -> Self {
        self.refresh = config;
        self
    }

    /// Set the storage configuration.
    pub fn with_storage(mut self, config: StorageConfig) -> Self {
        self.storage = config;
        self
    }
}
