//! Walks every Picture and (re)builds its relations, committing as it goes.
//!
//! Can take a long time on a large repository; run it from a background job.

use crate::config::cli::LocalStorage;
use crate::core::relations::{RelationBuilder, RelationContext};
use crate::domain::model::DocumentQuery;
use crate::domain::ports::Storage;
use crate::utils::error::{RelationsError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const COPY_FLAG_FIELD: &str = "admin:is_copy";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchSettings {
    pub page_size: usize,
    /// Commit after this many saved documents.
    pub commit_modulo: usize,
    /// Stop at the first failing document instead of tallying and going on.
    pub strict: bool,
    /// Start after the stored cursor when the previous walk did not complete.
    pub resume: bool,
    pub cursor_file: Option<String>,
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self {
            page_size: 1000,
            commit_modulo: 50,
            strict: false,
            resume: false,
            cursor_file: None,
        }
    }
}

/// Where a walk got to, as of its last commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchCursor {
    pub last_id: Option<String>,
    pub completed: bool,
    pub updated_at: DateTime<Utc>,
}

pub struct CursorStore<S: Storage> {
    storage: S,
    key: String,
}

impl<S: Storage> CursorStore<S> {
    pub fn new(storage: S, key: impl Into<String>) -> Self {
        Self {
            storage,
            key: key.into(),
        }
    }

    /// `None` when no cursor was stored yet.
    pub async fn load(&self) -> Result<Option<BatchCursor>> {
        match self.storage.read_file(&self.key).await {
            Ok(data) => Ok(Some(serde_json::from_slice(&data)?)),
            Err(RelationsError::IoError(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    pub async fn store(&self, cursor: &BatchCursor) -> Result<()> {
        let data = serde_json::to_vec_pretty(cursor)?;
        self.storage.write_file(&self.key, &data).await
    }

    pub async fn clear(&self) -> Result<()> {
        self.storage.remove_file(&self.key).await
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedDocument {
    pub id: String,
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub processed: usize,
    pub saved: usize,
    pub commits: usize,
    pub failed: Vec<FailedDocument>,
    pub last_id: Option<String>,
    pub resumed_after: Option<String>,
    /// Set when strict mode stopped the walk early.
    pub stopped: bool,
}

pub struct BatchUpdater<'a, S: Storage = LocalStorage> {
    ctx: &'a RelationContext,
    settings: &'a BatchSettings,
    cursor: Option<CursorStore<S>>,
}

impl<'a> BatchUpdater<'a> {
    pub fn new(ctx: &'a RelationContext, settings: &'a BatchSettings) -> Self {
        Self {
            ctx,
            settings,
            cursor: None,
        }
    }
}

impl<'a, S: Storage> BatchUpdater<'a, S> {
    pub fn with_cursor<T: Storage>(self, cursor: CursorStore<T>) -> BatchUpdater<'a, T> {
        BatchUpdater {
            ctx: self.ctx,
            settings: self.settings,
            cursor: Some(cursor),
        }
    }

    pub async fn update_all(&self) -> Result<BatchReport> {
        tracing::info!("🔄 Updating {} documents...", self.ctx.picture_type);
        let repository = self.ctx.repository.as_ref();
        let mut report = BatchReport::default();

        report.resumed_after = self.start_cursor().await?;
        // 還沒處理任何文件前，游標停在續跑點
        report.last_id = report.resumed_after.clone();
        if let Some(after) = &report.resumed_after {
            tracing::info!("⏩ Resuming after {}", after);
        }

        repository.commit().await?;
        report.commits += 1;

        let page_size = self.settings.page_size.max(1);
        let commit_modulo = self.settings.commit_modulo.max(1);
        let mut after = report.resumed_after.clone();

        'pages: loop {
            let query = DocumentQuery::new(&self.ctx.picture_type)
                .where_null_or_false(COPY_FLAG_FIELD)
                .after(after.clone());
            let page = repository.query_page(&query, page_size).await?;
            if page.is_empty() {
                break;
            }
            let page_len = page.len();

            for doc in page {
                let id = doc.id.clone();
                report.processed += 1;

                let mut builder = RelationBuilder::new(doc, self.ctx);
                match builder.run().await {
                    Ok(()) => {
                        tracing::debug!("{}: {}", id, builder.to_json_string());
                        if builder.doc_was_modified_and_saved() {
                            report.saved += 1;
                            if report.saved % commit_modulo == 0 {
                                tracing::info!("Updated: {}", report.saved);
                                repository.commit().await?;
                                report.commits += 1;
                                self.store_cursor(Some(id.clone()), false).await?;
                            }
                        }
                    }
                    Err(e) => {
                        tracing::error!("❌ Error while updating document {}: {}", id, e);
                        report.failed.push(FailedDocument {
                            id: id.clone(),
                            error: e.to_string(),
                        });
                        // the cursor stays before the failing document so a resume retries it
                        if self.settings.strict {
                            report.stopped = true;
                            break 'pages;
                        }
                    }
                }

                report.last_id = Some(id.clone());
                after = Some(id);
            }

            if page_len < page_size {
                break;
            }
        }

        repository.commit().await?;
        report.commits += 1;
        self.store_cursor(report.last_id.clone(), !report.stopped)
            .await?;

        tracing::info!(
            "✅ ...updating done: {} processed, {} saved, {} failed",
            report.processed,
            report.saved,
            report.failed.len()
        );
        Ok(report)
    }

    async fn start_cursor(&self) -> Result<Option<String>> {
        if !self.settings.resume {
            return Ok(None);
        }
        let Some(store) = &self.cursor else {
            return Ok(None);
        };

        Ok(match store.load().await? {
            Some(cursor) if !cursor.completed => cursor.last_id,
            _ => None,
        })
    }

    async fn store_cursor(&self, last_id: Option<String>, completed: bool) -> Result<()> {
        if let Some(store) = &self.cursor {
            store
                .store(&BatchCursor {
                    last_id,
                    completed,
                    updated_at: Utc::now(),
                })
                .await?;
        }
        Ok(())
    }
}
