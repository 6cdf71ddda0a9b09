use crate::domain::model::{Document, VocabularyEntry};
use crate::domain::ports::VocabularyService;
use crate::utils::error::Result;
use crate::utils::validation::is_blank;
use std::collections::HashSet;
use tokio::sync::Mutex;

pub const DEPARTMENT_VOCABULARY: &str = "Department";

/// Ordering given to departments discovered from filenames, after curated ones.
pub const DEPARTMENT_ORDERING: i64 = 10000;

/// Free-text asset fields backed by a vocabulary of the same values.
pub const ASSET_DATA_VOCABULARIES: [(&str, &str); 3] = [
    ("asset:body_type", "BodyType"),
    ("asset:body_color", "BodyColor"),
    ("asset:print_location", "PrintLocation"),
];

/// Vocabulary ids cannot contain '/'.
pub fn entry_id(value: &str) -> String {
    value.replace('/', "-")
}

/// Known department ids, loaded on first use and only ever appended to.
///
/// Entries added to the vocabulary by someone else after loading are not
/// seen; creating one again is left to the vocabulary service to reject.
#[derive(Debug, Default)]
pub struct DepartmentVocabulary {
    known: Mutex<Option<HashSet<String>>>,
}

impl DepartmentVocabulary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the department entry when it is not known yet. Returns whether it was created.
    pub async fn ensure(&self, vocabulary: &dyn VocabularyService, department: &str) -> Result<bool> {
        let id = entry_id(department);
        let mut known = self.known.lock().await;

        if known.is_none() {
            let ids = vocabulary.entry_ids(DEPARTMENT_VOCABULARY).await?;
            tracing::debug!("Loaded {} department values", ids.len());
            *known = Some(ids.into_iter().collect());
        }

        let values = known.get_or_insert_with(HashSet::new);
        if values.contains(&id) {
            return Ok(false);
        }

        vocabulary
            .create_entry(
                DEPARTMENT_VOCABULARY,
                VocabularyEntry::new(&id, DEPARTMENT_ORDERING),
            )
            .await?;
        tracing::info!("➕ Added department '{}' to vocabulary", id);
        values.insert(id);
        Ok(true)
    }

    pub async fn is_loaded(&self) -> bool {
        self.known.lock().await.is_some()
    }
}

/// Makes sure the free-text asset fields of a document exist in their vocabularies.
pub struct AssetDataChecker<'a> {
    vocabulary: &'a dyn VocabularyService,
}

impl<'a> AssetDataChecker<'a> {
    pub fn new(vocabulary: &'a dyn VocabularyService) -> Self {
        Self { vocabulary }
    }

    /// Returns the `vocabulary/id` pairs that had to be created.
    pub async fn check(&self, doc: &Document) -> Result<Vec<String>> {
        let mut created = Vec::new();

        for (field, vocabulary) in ASSET_DATA_VOCABULARIES {
            let Some(value) = doc.string_property(field) else {
                continue;
            };
            if is_blank(value) {
                continue;
            }

            let id = entry_id(value);
            if !self.vocabulary.has_entry(vocabulary, &id).await? {
                self.vocabulary
                    .create_entry(vocabulary, VocabularyEntry::new(&id, 0))
                    .await?;
                tracing::info!("➕ Added '{}' to vocabulary {}", id, vocabulary);
                created.push(format!("{}/{}", vocabulary, id));
            }
        }

        Ok(created)
    }
}
