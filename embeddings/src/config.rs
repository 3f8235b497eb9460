//! Configuration for the embedding components.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::DEFAULT_DIMENSION;

/// Default address of the local embedding service.
pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";

/// Default embedding model.
pub const DEFAULT_MODEL: &str = "all-minilm";

/// Configuration for the embedding service client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Base URL of the embedding service.
    pub base_url: String,

    /// Model to request.
    pub model: String,

    /// Expected vector length. Responses of any other length are rejected.
    /// `None` accepts whatever the model returns.
    pub dimension: Option<usize>,

    /// Upper bound on a single embedding call, in seconds.
    pub timeout_secs: u64,
}

impl ProviderConfig {
    /// Set the base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the expected dimension.
    pub fn with_dimension(mut self, dimension: Option<usize>) -> Self {
        self.dimension = dimension;
        self
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_secs = timeout.as_secs().max(1);
        self
    }

    /// The request timeout, never shorter than one second.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            dimension: Some(DEFAULT_DIMENSION),
            timeout_secs: 30,
        }
    }
}

/// Defaults for similarity queries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimilarityConfig {
    /// Maximum number of matches returned.
    pub default_limit: usize,

    /// Matches scoring below this are dropped.
    pub min_similarity: f32,
}

impl Default for SimilarityConfig {
    fn default() -> Self {
        Self {
            default_limit: 5,
            min_similarity: 0.3,
        }
    }
}

/// Configuration for bulk refreshes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefreshConfig {
    /// How many ideas are embedded at the same time during a full refresh.
    pub concurrency: usize,
}

impl RefreshConfig {
    /// Set the concurrency, with a floor of one.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self { concurrency: 1 }
    }
}

/// Where embedding records live.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding one record file per idea. `None` keeps records in
    /// memory only.
    pub path: Option<PathBuf>,
}

impl StorageConfig {
    /// Keep records in memory.
    pub fn in_memory() -> Self {
        Self { path: None }
    }

    /// Persist records under `path`.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: dirs::data_dir().map(|d| d.join("ideas/embeddings")),
        }
    }
}
