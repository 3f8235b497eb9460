//! Persistence of one normalized embedding per idea.
//!
//! Records are keyed by idea id and replaced wholesale on every upsert. Both
//! stores refuse empty or zero-norm vectors so a stored record always has a
//! direction.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::error::{EmbeddingError, Result};
use crate::similarity::l2_norm;
use crate::{Embedding, IdeaId};

/// One idea's stored embedding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingRecord {
    /// The idea this vector describes.
    pub idea_id: IdeaId,

    /// Unit-length embedding vector.
    #[serde(rename = "embedding")]
    pub vector: Embedding,

    /// When the vector was last computed.
    pub updated_at: DateTime<Utc>,
}

/// Storage for embedding records.
#[async_trait]
pub trait EmbeddingStore: Send + Sync {
    /// Get the record for an idea.
    async fn get(&self, idea_id: IdeaId) -> Result<Option<EmbeddingRecord>>;

    /// Insert or replace the record for an idea.
    async fn upsert(&self, idea_id: IdeaId, vector: Embedding) -> Result<EmbeddingRecord>;

    /// Every record except the given idea's, in no particular order.
    async fn all_except(&self, idea_id: IdeaId) -> Result<Vec<EmbeddingRecord>>;

    /// Remove the record for an idea. Removing a missing record is a no-op.
    async fn delete(&self, idea_id: IdeaId) -> Result<()>;

    /// Number of stored records.
    async fn len(&self) -> usize;

    /// Whether the store holds no records.
    async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

fn validate(vector: &[f32]) -> Result<()> {
    let norm = l2_norm(vector);
    if vector.is_empty() || norm == 0.0 || !norm.is_finite() {
        return Err(EmbeddingError::DegenerateVector);
    }
    Ok(())
}

fn new_record(idea_id: IdeaId, vector: Embedding) -> Result<EmbeddingRecord> {
    validate(&vector)?;
    Ok(EmbeddingRecord {
        idea_id,
        vector,
        updated_at: Utc::now(),
    })
}

/// Embedding records held in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryEmbeddingStore {
    records: Arc<RwLock<HashMap<IdeaId, EmbeddingRecord>>>,
}

impl InMemoryEmbeddingStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EmbeddingStore for InMemoryEmbeddingStore {
    async fn get(&self, idea_id: IdeaId) -> Result<Option<EmbeddingRecord>> {
        Ok(self.records.read().await.get(&idea_id).cloned())
    }

    async fn upsert(&self, idea_id: IdeaId, vector: Embedding) -> Result<EmbeddingRecord> {
        let record = new_record(idea_id, vector)?;
        self.records.write().await.insert(idea_id, record.clone());
        debug!("Stored embedding for idea {idea_id}");
        Ok(record)
    }

    async fn all_except(&self, idea_id: IdeaId) -> Result<Vec<EmbeddingRecord>> {
        Ok(self
            .records
            .read()
            .await
            .values()
            .filter(|r| r.idea_id != idea_id)
            .cloned()
            .collect())
    }

    async fn delete(&self, idea_id: IdeaId) -> Result<()> {
        self.records.write().await.remove(&idea_id);
        Ok(())
    }

    async fn len(&self) -> usize {
        self.records.read().await.len()
    }
}

/// Embedding records persisted as one JSON file per idea.
///
/// All records are loaded into memory when the store is opened. Writes go to
/// a temp file that is then renamed over the record, so readers never see a
/// half-written vector.
pub struct FileEmbeddingStore {
    /// Directory holding `<idea_id>.json` files.
    root: PathBuf,

    /// In-memory copy of every record. The write guard is held for the
    /// duration of a file write, which serializes upserts.
    records: RwLock<HashMap<IdeaId, EmbeddingRecord>>,
}

impl FileEmbeddingStore {
    /// Open (or create) a store rooted at `root`.
    pub async fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();

        fs::create_dir_all(&root)
            .await
            .map_err(|e| EmbeddingError::Storage(format!("{}: {e}", root.display())))?;

        let records = Self::load_all(&root).await?;
        info!(
            "Loaded {} embedding records from {}",
            records.len(),
            root.display()
        );

        Ok(Self {
            root,
            records: RwLock::new(records),
        })
    }

    /// The directory this store writes to.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn record_path(&self, idea_id: IdeaId) -> PathBuf {
        self.root.join(format!("{idea_id}.json"))
    }

    async fn load_all(root: &Path) -> Result<HashMap<IdeaId, EmbeddingRecord>> {
        let mut records = HashMap::new();
        let mut entries = fs::read_dir(root)
            .await
            .map_err(|e| EmbeddingError::Storage(format!("{}: {e}", root.display())))?;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };

            // Left behind by a write that never reached its rename.
            if name.ends_with(".json.tmp") {
                match fs::remove_file(&path).await {
                    Ok(()) => debug!("Removed stale temp file {}", path.display()),
                    Err(e) => warn!("Failed to remove stale temp file {}: {e}", path.display()),
                }
                continue;
            }

            let Some(stem) = name.strip_suffix(".json") else {
                continue;
            };
            let Ok(file_id) = stem.parse::<IdeaId>() else {
                warn!("Skipping embedding file with non-numeric name {}", path.display());
                continue;
            };

            match Self::load_file(&path).await {
                Ok(record) if record.idea_id == file_id => {
                    records.insert(file_id, record);
                }
                Ok(record) => {
                    warn!(
                        "Skipping embedding record {}: file is for idea {file_id} but holds idea {}",
                        path.display(),
                        record.idea_id
                    );
                }
                Err(e) => {
                    warn!("Skipping unreadable embedding record {}: {e}", path.display());
                }
            }
        }

        Ok(records)
    }

    async fn load_file(path: &Path) -> Result<EmbeddingRecord> {
        let content = fs::read_to_string(path).await?;
        let record: EmbeddingRecord = serde_json::from_str(&content)?;
        validate(&record.vector)?;
        Ok(record)
    }

    async fn save_file(&self, record: &EmbeddingRecord) -> Result<()> {
        let path = self.record_path(record.idea_id);
        let content = serde_json::to_string(record)?;

        let temp_path = path.with_extension("json.tmp");
        fs::write(&temp_path, &content)
            .await
            .map_err(|e| EmbeddingError::Storage(format!("{}: {e}", temp_path.display())))?;

        if let Err(e) = fs::rename(&temp_path, &path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(EmbeddingError::Storage(format!("{}: {e}", path.display())));
        }

        Ok(())
    }
}

#[async_trait]
impl EmbeddingStore for FileEmbeddingStore {
    async fn get(&self, idea_id: IdeaId) -> Result<Option<EmbeddingRecord>> {
        Ok(self.records.read().await.get(&idea_id).cloned())
    }

    async fn upsert(&self, idea_id: IdeaId, vector: Embedding) -> Result<EmbeddingRecord> {
        let record = new_record(idea_id, vector)?;

        let mut records = self.records.write().await;
        self.save_file(&record).await?;
        records.insert(idea_id, record.clone());

        debug!("Saved embedding for idea {idea_id}");
        Ok(record)
    }

    async fn all_except(&self, idea_id: IdeaId) -> Result<Vec<EmbeddingRecord>> {
        Ok(self
            .records
            .read()
            .await
            .values()
            .filter(|r| r.idea_id != idea_id)
            .cloned()
            .collect())
    }

    async fn delete(&self, idea_id: IdeaId) -> Result<()> {
        let mut records = self.records.write().await;
        match fs::remove_file(self.record_path(idea_id)).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(EmbeddingError::Storage(format!("delete {idea_id}: {e}"))),
        }
        records.remove(&idea_id);
        Ok(())
    }

    async fn len(&self) -> usize {
        self.records.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_upsert_overwrites() {
        let store = InMemoryEmbeddingStore::new();
        store.upsert(1, vec![1.0, 0.0]).await.unwrap();
        store.upsert(1, vec![0.0, 1.0]).await.unwrap();

        assert_eq!(store.len().await, 1);
        assert_eq!(store.get(1).await.unwrap().unwrap().vector, vec![0.0, 1.0]);
    }

    #[tokio::test]
    async fn test_rejects_degenerate_vectors() {
        let store = InMemoryEmbeddingStore::new();
        assert!(matches!(
            store.upsert(1, vec![0.0, 0.0]).await,
            Err(EmbeddingError::DegenerateVector)
        ));
        assert!(matches!(
            store.upsert(1, Vec::new()).await,
            Err(EmbeddingError::DegenerateVector)
        ));
        assert!(store.get(1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_all_except_and_delete() {
        let store = InMemoryEmbeddingStore::new();
        for id in 1..=3 {
            store.upsert(id, vec![1.0, id as f32]).await.unwrap();
        }

        let mut others: Vec<IdeaId> = store
            .all_except(2)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.idea_id)
            .collect();
        others.sort_unstable();
        assert_eq!(others, vec![1, 3]);

        store.delete(2).await.unwrap();
        store.delete(2).await.unwrap();
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn test_file_store_persists_across_reopen() {
        let dir = TempDir::new().unwrap();
        let vector = vec![0.267_261_24, 0.534_522_5, 0.801_783_7];

        {
            let store = FileEmbeddingStore::open(dir.path()).await.unwrap();
            store.upsert(7, vector.clone()).await.unwrap();
            store.upsert(8, vec![1.0, 0.0, 0.0]).await.unwrap();
            store.delete(8).await.unwrap();
        }

        let store = FileEmbeddingStore::open(dir.path()).await.unwrap();
        assert_eq!(store.len().await, 1);
        assert_eq!(store.get(7).await.unwrap().unwrap().vector, vector);
        assert!(!dir.path().join("8.json").exists());
    }

    #[tokio::test]
    async fn test_file_store_layout() {
        let dir = TempDir::new().unwrap();
        let store = FileEmbeddingStore::open(dir.path()).await.unwrap();
        store.upsert(3, vec![0.6, 0.8]).await.unwrap();

        let raw = std::fs::read_to_string(dir.path().join("3.json")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["idea_id"], 3);
        assert_eq!(value["embedding"].as_array().map(Vec::len), Some(2));
        assert!(value["updated_at"].is_string());
        assert!(!dir.path().join("3.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_file_store_skips_corrupt_files() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("5.json"), "{not json").unwrap();
        std::fs::write(
            dir.path().join("6.json"),
            r#"{"idea_id":6,"embedding":[0.0,0.0],"updated_at":"2025-07-28T12:00:00Z"}"#,
        )
        .unwrap();

        let store = FileEmbeddingStore::open(dir.path()).await.unwrap();
        assert_eq!(store.len().await, 0);
    }

    #[tokio::test]
    async fn test_file_store_skips_record_under_wrong_name() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("5.json"),
            r#"{"idea_id":6,"embedding":[1.0,0.0],"updated_at":"2025-07-28T12:00:00Z"}"#,
        )
        .unwrap();
        std::fs::write(dir.path().join("notes.json"), "{}").unwrap();

        let store = FileEmbeddingStore::open(dir.path()).await.unwrap();
        assert_eq!(store.len().await, 0);
        assert!(store.get(5).await.unwrap().is_none());
        assert!(store.get(6).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_file_store_removes_stale_temp_files() {
        let dir = TempDir::new().unwrap();
        let stale = dir.path().join("4.json.tmp");
        std::fs::write(&stale, r#"{"idea_id":4,"embedding":[1.0"#).unwrap();

        let store = FileEmbeddingStore::open(dir.path()).await.unwrap();
        assert!(!stale.exists());
        assert!(store.is_empty().await);

        store.upsert(4, vec![0.0, 1.0]).await.unwrap();
        assert!(!stale.exists());
        assert!(dir.path().join("4.json").exists());
    }
}
