//! Test doubles shared by the unit tests.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::error::{EmbeddingError, Result};
use crate::provider::{EmbeddingProvider, EmbeddingRequest, EmbeddingResponse};
use crate::Embedding;

/// Returns canned vectors for known texts and fails for anything else.
#[derive(Default)]
pub(crate) struct ScriptedProvider {
    responses: HashMap<String, Embedding>,
    calls: Arc<AtomicUsize>,
}

impl ScriptedProvider {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn respond(mut self, text: &str, embedding: Embedding) -> Self {
        self.responses.insert(text.to_string(), embedding);
        self
    }

    pub(crate) fn calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

#[async_trait]
impl EmbeddingProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    fn default_model(&self) -> &str {
        "scripted"
    }

    fn default_dimension(&self) -> usize {
        2
    }

    async fn embed(&self, request: EmbeddingRequest) -> Result<EmbeddingResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let embedding = self
            .responses
            .get(&request.text)
            .cloned()
            .ok_or_else(|| EmbeddingError::Unavailable(format!("no script for {:?}", request.text)))?;
        Ok(EmbeddingResponse {
            dimension: embedding.len(),
            embedding,
            model: "scripted".to_string(),
        })
    }

    fn is_available(&self) -> bool {
        true
    }
}
