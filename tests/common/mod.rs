#![allow(dead_code)]

use asset_relations::core::containers::ContainerTitles;
use asset_relations::domain::model::Document;
use asset_relations::{InMemoryRepository, RelationContext};
use std::sync::Arc;

pub const LICENSE_ROOT_PATH: &str = "/domain/workspaces/licenses";
pub const ART_FILE_NUMBERS_PATH: &str = "/domain/workspaces/art-file-numbers";
pub const STYLE_NUMBERS_PATH: &str = "/domain/workspaces/style-numbers";

fn container(doc_type: &str, title: &str, path: &str) -> Document {
    let mut doc = Document::new_at("/domain/workspaces", title, doc_type);
    doc.path = path.to_string();
    doc.set_property("dc:title", title);
    doc
}

/// 建立含三個容器的儲存庫
pub fn repository_with_containers() -> Arc<InMemoryRepository> {
    let repo = InMemoryRepository::new();
    repo.insert(container("IPcontractRoot", "02. Licenses", LICENSE_ROOT_PATH))
        .unwrap();
    repo.insert(container(
        "ArtFileNumberContainer",
        "02. Art File Numbers",
        ART_FILE_NUMBERS_PATH,
    ))
    .unwrap();
    repo.insert(container(
        "StyleNumberContainer",
        "01. Style Numbers",
        STYLE_NUMBERS_PATH,
    ))
    .unwrap();
    Arc::new(repo)
}

/// Only the licensed containers; composition resources cannot be linked.
pub fn repository_without_style_numbers() -> Arc<InMemoryRepository> {
    let repo = InMemoryRepository::new();
    repo.insert(container("IPcontractRoot", "02. Licenses", LICENSE_ROOT_PATH))
        .unwrap();
    repo.insert(container(
        "ArtFileNumberContainer",
        "02. Art File Numbers",
        ART_FILE_NUMBERS_PATH,
    ))
    .unwrap();
    Arc::new(repo)
}

pub fn context(repo: &Arc<InMemoryRepository>) -> RelationContext {
    RelationContext::new(repo.clone(), repo.clone(), "Picture", ContainerTitles::default())
}

pub fn picture(id: &str, title: &str) -> Document {
    let mut doc = Document::new_at("/domain/workspaces/pictures", title, "Picture");
    doc.id = id.to_string();
    doc.schemas = vec!["picture".to_string()];
    doc.set_property("dc:title", title);
    doc
}

pub fn insert_picture(repo: &InMemoryRepository, id: &str, title: &str) -> Document {
    repo.insert(picture(id, title)).unwrap()
}
