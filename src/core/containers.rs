use crate::domain::model::DocumentQuery;
use crate::domain::ports::DocumentRepository;
use crate::utils::error::{RelationsError, Result};
use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;

/// Well-known folders new reference records are created in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerKind {
    LicenseRoot,
    ArtFileNumbers,
    StyleNumbers,
}

impl ContainerKind {
    pub fn doc_type(&self) -> &'static str {
        match self {
            ContainerKind::LicenseRoot => "IPcontractRoot",
            ContainerKind::ArtFileNumbers => "ArtFileNumberContainer",
            ContainerKind::StyleNumbers => "StyleNumberContainer",
        }
    }
}

/// Titles given to the containers by the repository structure template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerTitles {
    pub license_root: String,
    pub art_file_numbers: String,
    pub style_numbers: String,
}

impl Default for ContainerTitles {
    fn default() -> Self {
        Self {
            license_root: "02. Licenses".to_string(),
            art_file_numbers: "02. Art File Numbers".to_string(),
            style_numbers: "01. Style Numbers".to_string(),
        }
    }
}

impl ContainerTitles {
    pub fn title(&self, kind: ContainerKind) -> &str {
        match kind {
            ContainerKind::LicenseRoot => &self.license_root,
            ContainerKind::ArtFileNumbers => &self.art_file_numbers,
            ContainerKind::StyleNumbers => &self.style_numbers,
        }
    }
}

/// Container paths, each looked up on first use and then kept.
///
/// Nothing invalidates a cached path: moving a container in the repository
/// requires a new `ContainerPaths`.
#[derive(Debug, Default)]
pub struct ContainerPaths {
    titles: ContainerTitles,
    license_root: OnceCell<String>,
    art_file_numbers: OnceCell<String>,
    style_numbers: OnceCell<String>,
}

impl ContainerPaths {
    pub fn new(titles: ContainerTitles) -> Self {
        Self {
            titles,
            license_root: OnceCell::new(),
            art_file_numbers: OnceCell::new(),
            style_numbers: OnceCell::new(),
        }
    }

    pub fn titles(&self) -> &ContainerTitles {
        &self.titles
    }

    pub async fn path(&self, repository: &dyn DocumentRepository, kind: ContainerKind) -> Result<&str> {
        let cell = match kind {
            ContainerKind::LicenseRoot => &self.license_root,
            ContainerKind::ArtFileNumbers => &self.art_file_numbers,
            ContainerKind::StyleNumbers => &self.style_numbers,
        };
        let title = self.titles.title(kind);

        cell.get_or_try_init(|| resolve(repository, kind, title))
            .await
            .map(String::as_str)
    }
}

async fn resolve(repository: &dyn DocumentRepository, kind: ContainerKind, title: &str) -> Result<String> {
    let query = DocumentQuery::new(kind.doc_type()).where_eq("dc:title", title);
    tracing::debug!("Resolving container: {}", query.to_nxql());

    let docs = repository.query_page(&query, 1).await?;
    // 找不到就放棄，沒有替代路徑
    let container = docs
        .into_iter()
        .next()
        .ok_or_else(|| RelationsError::ContainerNotFound {
            container_type: kind.doc_type().to_string(),
            title: title.to_string(),
        })?;

    tracing::debug!("{} resolved to {}", kind.doc_type(), container.path);
    Ok(container.path)
}
