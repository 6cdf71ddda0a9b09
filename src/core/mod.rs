pub mod batch;
pub mod containers;
pub mod naming;
pub mod presentation;
pub mod relations;
pub mod vocabulary;
pub mod zipper;

pub use crate::domain::model::{Blob, Document, DocumentQuery, ExecResult, VocabularyEntry};
pub use crate::domain::ports::{CommandLineExecutor, DocumentRepository, Storage, VocabularyService};
pub use crate::utils::error::Result;
