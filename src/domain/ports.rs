use crate::domain::model::{Document, DocumentQuery, ExecResult, VocabularyEntry};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::collections::BTreeMap;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
    fn remove_file(&self, path: &str) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// Access to the host content repository.
#[async_trait]
pub trait DocumentRepository: Send + Sync {
    /// One page of matches, ordered by identifier.
    async fn query_page(&self, query: &DocumentQuery, limit: usize) -> Result<Vec<Document>>;

    async fn query(&self, query: &DocumentQuery) -> Result<Vec<Document>> {
        self.query_page(query, usize::MAX).await
    }

    async fn get_document(&self, id: &str) -> Result<Option<Document>>;

    /// Creates `model` under `model.path` and returns it with its identifier and final path.
    async fn create_document(&self, model: Document) -> Result<Document>;

    async fn save_document(&self, doc: &Document) -> Result<Document>;

    /// Bytes of a picture rendition, `None` when the document has no such view.
    async fn picture_view(&self, doc: &Document, view: &str) -> Result<Option<Vec<u8>>>;

    /// Commits the current unit of work and starts a new one.
    async fn commit(&self) -> Result<()>;
}

#[async_trait]
pub trait VocabularyService: Send + Sync {
    async fn entry_ids(&self, vocabulary: &str) -> Result<Vec<String>>;
    async fn has_entry(&self, vocabulary: &str, id: &str) -> Result<bool>;
    async fn create_entry(&self, vocabulary: &str, entry: VocabularyEntry) -> Result<()>;
}

pub type CommandParameters = BTreeMap<String, String>;

#[async_trait]
pub trait CommandLineExecutor: Send + Sync {
    async fn exec_command(&self, command: &str, params: &CommandParameters) -> Result<ExecResult>;
}
