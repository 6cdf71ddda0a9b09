//! In-memory repository, optionally backed by a JSON snapshot file.
//!
//! Saves apply immediately; `commit()` writes the snapshot back when the
//! repository was loaded from a file. Used by the CLI and by tests.

use crate::domain::model::{Document, DocumentQuery, VocabularyEntry};
use crate::domain::ports::{DocumentRepository, VocabularyService};
use crate::utils::error::{RelationsError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RepositorySnapshot {
    #[serde(default)]
    pub documents: Vec<Document>,
    #[serde(default)]
    pub vocabularies: BTreeMap<String, Vec<VocabularyEntry>>,
}

pub struct InMemoryRepository {
    documents: RwLock<BTreeMap<String, Document>>,
    vocabularies: RwLock<BTreeMap<String, Vec<VocabularyEntry>>>,
    snapshot_path: Option<PathBuf>,
    commits: AtomicUsize,
    saves: AtomicUsize,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::from_snapshot(RepositorySnapshot::default())
    }

    pub fn from_snapshot(snapshot: RepositorySnapshot) -> Self {
        let repository = Self {
            documents: RwLock::new(BTreeMap::new()),
            vocabularies: RwLock::new(snapshot.vocabularies),
            snapshot_path: None,
            commits: AtomicUsize::new(0),
            saves: AtomicUsize::new(0),
        };
        if let Ok(mut docs) = repository.documents.write() {
            for mut doc in snapshot.documents {
                if doc.id.is_empty() {
                    doc.id = uuid::Uuid::new_v4().to_string();
                }
                docs.insert(doc.id.clone(), doc);
            }
        }
        repository
    }

    /// Loads a snapshot file; `commit()` writes back to the same file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let snapshot: RepositorySnapshot = serde_json::from_str(&content)?;
        tracing::debug!(
            "📂 Loaded {} documents from {}",
            snapshot.documents.len(),
            path.display()
        );

        let mut repository = Self::from_snapshot(snapshot);
        repository.snapshot_path = Some(path.to_path_buf());
        Ok(repository)
    }

    /// Stores a document as is, assigning an identifier when it has none.
    pub fn insert(&self, mut doc: Document) -> Result<Document> {
        if doc.id.is_empty() {
            doc.id = uuid::Uuid::new_v4().to_string();
        }
        self.write_documents()?.insert(doc.id.clone(), doc.clone());
        Ok(doc)
    }

    pub fn snapshot(&self) -> Result<RepositorySnapshot> {
        Ok(RepositorySnapshot {
            documents: self.read_documents()?.values().cloned().collect(),
            vocabularies: self.read_vocabularies()?.clone(),
        })
    }

    pub fn documents_of_type(&self, doc_type: &str) -> Result<Vec<Document>> {
        Ok(self
            .read_documents()?
            .values()
            .filter(|d| d.doc_type == doc_type)
            .cloned()
            .collect())
    }

    pub fn vocabulary_entries(&self, vocabulary: &str) -> Result<Vec<VocabularyEntry>> {
        Ok(self
            .read_vocabularies()?
            .get(vocabulary)
            .cloned()
            .unwrap_or_default())
    }

    pub fn commit_count(&self) -> usize {
        self.commits.load(Ordering::SeqCst)
    }

    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    fn read_documents(&self) -> Result<RwLockReadGuard<'_, BTreeMap<String, Document>>> {
        self.documents
            .read()
            .map_err(|_| RelationsError::repository("document store lock poisoned"))
    }

    fn write_documents(&self) -> Result<RwLockWriteGuard<'_, BTreeMap<String, Document>>> {
        self.documents
            .write()
            .map_err(|_| RelationsError::repository("document store lock poisoned"))
    }

    fn read_vocabularies(
        &self,
    ) -> Result<RwLockReadGuard<'_, BTreeMap<String, Vec<VocabularyEntry>>>> {
        self.vocabularies
            .read()
            .map_err(|_| RelationsError::repository("vocabulary store lock poisoned"))
    }

    fn write_vocabularies(
        &self,
    ) -> Result<RwLockWriteGuard<'_, BTreeMap<String, Vec<VocabularyEntry>>>> {
        self.vocabularies
            .write()
            .map_err(|_| RelationsError::repository("vocabulary store lock poisoned"))
    }
}

impl Default for InMemoryRepository {
    fn default() -> Self {
        Self::new()
    }
}

/// Path segment for a new document; '/' would otherwise start a new level.
fn path_segment(name: &str) -> String {
    let segment = name.trim().replace('/', "-");
    if segment.is_empty() {
        "untitled".to_string()
    } else {
        segment
    }
}

#[async_trait]
impl DocumentRepository for InMemoryRepository {
    async fn query_page(&self, query: &DocumentQuery, limit: usize) -> Result<Vec<Document>> {
        Ok(self
            .read_documents()?
            .values()
            .filter(|doc| query.matches(doc))
            .take(limit)
            .cloned()
            .collect())
    }

    async fn get_document(&self, id: &str) -> Result<Option<Document>> {
        Ok(self.read_documents()?.get(id).cloned())
    }

    async fn create_document(&self, mut model: Document) -> Result<Document> {
        let mut docs = self.write_documents()?;

        let base = format!(
            "{}/{}",
            model.path.trim_end_matches('/'),
            path_segment(&model.name)
        );
        let mut path = base.clone();
        let mut counter = 1;
        while docs.values().any(|d| d.path == path) {
            path = format!("{}.{}", base, counter);
            counter += 1;
        }

        model.id = uuid::Uuid::new_v4().to_string();
        model.path = path;
        docs.insert(model.id.clone(), model.clone());
        Ok(model)
    }

    async fn save_document(&self, doc: &Document) -> Result<Document> {
        let mut docs = self.write_documents()?;
        match docs.get_mut(&doc.id) {
            Some(stored) => {
                *stored = doc.clone();
                self.saves.fetch_add(1, Ordering::SeqCst);
                Ok(doc.clone())
            }
            None => Err(RelationsError::DocumentNotFound { id: doc.id.clone() }),
        }
    }

    async fn picture_view(&self, doc: &Document, view: &str) -> Result<Option<Vec<u8>>> {
        match doc.views.get(view) {
            Some(path) => Ok(Some(tokio::fs::read(path).await?)),
            None => Ok(None),
        }
    }

    async fn commit(&self) -> Result<()> {
        self.commits.fetch_add(1, Ordering::SeqCst);

        if let Some(path) = &self.snapshot_path {
            let json = serde_json::to_string_pretty(&self.snapshot()?)?;
            tokio::fs::write(path, json).await?;
            tracing::debug!("💾 Snapshot written to {}", path.display());
        }
        Ok(())
    }
}

#[async_trait]
impl VocabularyService for InMemoryRepository {
    async fn entry_ids(&self, vocabulary: &str) -> Result<Vec<String>> {
        Ok(self
            .read_vocabularies()?
            .get(vocabulary)
            .map(|entries| entries.iter().map(|e| e.id.clone()).collect())
            .unwrap_or_default())
    }

    async fn has_entry(&self, vocabulary: &str, id: &str) -> Result<bool> {
        Ok(self
            .read_vocabularies()?
            .get(vocabulary)
            .is_some_and(|entries| entries.iter().any(|e| e.id == id)))
    }

    async fn create_entry(&self, vocabulary: &str, entry: VocabularyEntry) -> Result<()> {
        let mut vocabularies = self.write_vocabularies()?;
        let entries = vocabularies.entry(vocabulary.to_string()).or_default();
        if entries.iter().any(|e| e.id == entry.id) {
            return Err(RelationsError::repository(format!(
                "entry '{}' already exists in vocabulary {}",
                entry.id, vocabulary
            )));
        }
        entries.push(entry);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_document_assigns_id_and_unique_path() {
        let repo = InMemoryRepository::new();
        let first = repo
            .create_document(Document::new_at("/licenses", "15BTMN BTMN", "IPcontract"))
            .await
            .unwrap();
        let second = repo
            .create_document(Document::new_at("/licenses/", "15BTMN BTMN", "IPcontract"))
            .await
            .unwrap();

        assert!(!first.id.is_empty());
        assert_ne!(first.id, second.id);
        assert_eq!(first.path, "/licenses/15BTMN BTMN");
        assert_eq!(second.path, "/licenses/15BTMN BTMN.1");
    }

    #[tokio::test]
    async fn test_save_unknown_document_fails() {
        let repo = InMemoryRepository::new();
        let mut doc = Document::new_at("/", "x", "Picture");
        doc.id = "missing".to_string();
        let err = repo.save_document(&doc).await.unwrap_err();
        assert!(matches!(err, RelationsError::DocumentNotFound { .. }));
    }

    #[tokio::test]
    async fn test_query_page_respects_limit_and_cursor() {
        let repo = InMemoryRepository::new();
        for id in ["a", "b", "c"] {
            let mut doc = Document::new_at("/", id, "Picture");
            doc.id = id.to_string();
            repo.insert(doc).unwrap();
        }

        let page = repo
            .query_page(&DocumentQuery::new("Picture"), 2)
            .await
            .unwrap();
        assert_eq!(
            page.iter().map(|d| d.id.as_str()).collect::<Vec<_>>(),
            vec!["a", "b"]
        );

        let rest = repo
            .query_page(&DocumentQuery::new("Picture").after(Some("b".to_string())), 2)
            .await
            .unwrap();
        assert_eq!(rest.len(), 1);
        assert_eq!(rest[0].id, "c");
    }

    #[tokio::test]
    async fn test_duplicate_vocabulary_entry_is_rejected() {
        let repo = InMemoryRepository::new();
        repo.create_entry("Department", VocabularyEntry::new("GR", 10000))
            .await
            .unwrap();
        assert!(repo.has_entry("Department", "GR").await.unwrap());
        assert!(repo
            .create_entry("Department", VocabularyEntry::new("GR", 10000))
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_commit_writes_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("repository.json");
        std::fs::write(&path, r#"{"documents": [{"id": "p1", "doc_type": "Picture"}]}"#).unwrap();

        let repo = InMemoryRepository::load(&path).unwrap();
        let mut doc = repo.get_document("p1").await.unwrap().unwrap();
        doc.set_property("dc:title", "15BTMN002 King.jpg");
        repo.save_document(&doc).await.unwrap();
        repo.commit().await.unwrap();

        let reloaded = InMemoryRepository::load(&path).unwrap();
        let doc = reloaded.get_document("p1").await.unwrap().unwrap();
        assert_eq!(doc.title(), Some("15BTMN002 King.jpg"));
        assert_eq!(repo.commit_count(), 1);
    }
}
