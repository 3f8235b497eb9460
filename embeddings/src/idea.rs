//! The idea entity as seen by the embedding engine.
//!
//! Ideas are owned by the surrounding content system. The engine only reads
//! them, through the [`IdeaSource`] trait.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::IdeaId;

/// Status given to ideas that don't specify one.
pub const DEFAULT_STATUS: &str = "seedling";

/// An idea with the fields that feed its embedding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Idea {
    /// Unique identifier.
    pub id: IdeaId,

    /// Title, expected to be non-empty.
    pub title: String,

    /// Short description.
    pub description: Option<String>,

    /// Free-text body.
    pub content: Option<String>,

    /// Category name.
    pub category: Option<String>,

    /// Workflow status.
    pub status: String,

    /// Names of attached tags.
    pub tags: Vec<String>,

    /// When the idea was created.
    pub created_at: DateTime<Utc>,

    /// When the idea was last modified.
    pub updated_at: DateTime<Utc>,
}

impl Idea {
    /// Create an idea with only a title.
    pub fn new(id: IdeaId, title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id,
            title: title.into(),
            description: None,
            content: None,
            category: None,
            status: DEFAULT_STATUS.to_string(),
            tags: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the content.
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    /// Set the category.
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Set the status.
    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = status.into();
        self
    }

    /// Attach a tag.
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// The summary shown next to a similarity match.
    pub fn summary(&self) -> IdeaSummary {
        IdeaSummary {
            title: self.title.clone(),
            description: self.description.clone(),
            category: self.category.clone(),
            status: self.status.clone(),
        }
    }
}

/// Display fields of an idea returned alongside similarity matches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdeaSummary {
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub status: String,
}

/// Read access to the ideas owned by the content system.
#[async_trait]
pub trait IdeaSource: Send + Sync {
    /// Look up one idea.
    async fn get_idea(&self, id: IdeaId) -> Option<Idea>;

    /// Every idea, in ascending id order.
    async fn list_ideas(&self) -> Vec<Idea>;
}

/// An [`IdeaSource`] held in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryIdeas {
    ideas: Arc<RwLock<BTreeMap<IdeaId, Idea>>>,
}

impl InMemoryIdeas {
    /// Create an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an idea.
    pub async fn insert(&self, idea: Idea) {
        self.ideas.write().await.insert(idea.id, idea);
    }

    /// Remove an idea, returning it if present.
    pub async fn remove(&self, id: IdeaId) -> Option<Idea> {
        self.ideas.write().await.remove(&id)
    }
}

impl FromIterator<Idea> for InMemoryIdeas {
    fn from_iter<T: IntoIterator<Item = Idea>>(iter: T) -> Self {
        let ideas = iter.into_iter().map(|idea| (idea.id, idea)).collect();
        Self {
            ideas: Arc::new(RwLock::new(ideas)),
        }
    }
}

#[async_trait]
impl IdeaSource for InMemoryIdeas {
    async fn get_idea(&self, id: IdeaId) -> Option<Idea> {
        self.ideas.read().await.get(&id).cloned()
    }

    async fn list_ideas(&self) -> Vec<Idea> {
        self.ideas.read().await.values().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_in_memory_ideas() {
        let source: InMemoryIdeas = [Idea::new(2, "b"), Idea::new(1, "a")].into_iter().collect();
        source.insert(Idea::new(3, "c")).await;

        let ids: Vec<IdeaId> = source.list_ideas().await.iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);

        assert_eq!(source.remove(2).await.map(|i| i.title), Some("b".to_string()));
        assert!(source.get_idea(2).await.is_none());
    }

    #[test]
    fn test_summary() {
        let idea = Idea::new(1, "Garden planner")
            .with_description("Plan beds")
            .with_category("home")
            .with_status("growing");

        assert_eq!(
            idea.summary(),
            IdeaSummary {
                title: "Garden planner".to_string(),
                description: Some("Plan beds".to_string()),
                category: Some("home".to_string()),
                status: "growing".to_string(),
            }
        );
    }
}
