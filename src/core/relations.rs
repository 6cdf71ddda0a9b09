//! Links Picture documents to the License, ArtFileNumber and StyleNumber
//! records their filename refers to, creating those records on first sight.
//!
//! Working assumptions about the repository:
//!
//! - There is exactly one License root, one ArtFileNumber container and one
//!   StyleNumber container, found by title.
//! - The document title is the filename of its main binary.

use crate::core::containers::{ContainerKind, ContainerPaths, ContainerTitles};
use crate::core::naming::{
    parse_licensed, parse_resource, TitleClass, TitleParts, MIN_TITLE_LENGTH,
};
use crate::core::vocabulary::DepartmentVocabulary;
use crate::domain::model::{Condition, Document, DocumentQuery};
use crate::domain::ports::{DocumentRepository, VocabularyService};
use crate::utils::error::Result;
use crate::utils::validation::is_blank;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

// "asset_nature" vocabulary
pub const NATURE_COMPOSITION: &str = "Comp";
pub const NATURE_COMPOSITION_RESOURCE: &str = "Comp Resource";
pub const NATURE_LICENSED_ART_RESOURCE: &str = "Licensed Art Resource";

// "LicenseStatus" vocabulary
pub const LICENSED: &str = "Licensed";

pub const LICENSE_TYPE: &str = "IPcontract";
pub const ART_FILE_NUMBER_TYPE: &str = "ArtFileNumber";
pub const STYLE_NUMBER_TYPE: &str = "StyleNumber";

pub mod fields {
    pub const NATURE: &str = "asset:nature";
    pub const LICENSING: &str = "asset:licensing";
    pub const VARIATION_LETTER: &str = "asset:variation_letter";
    pub const LICENSE_ID: &str = "linking:license_id";
    pub const ART_FILE_NUMBER_ID: &str = "linking:art_file_number_id";
    pub const STYLE_NUMBER_ID: &str = "linking:style_number_id";

    pub const LICENSE_YEAR: &str = "license:year";
    pub const PRODUCT_LINE_CODE: &str = "license:product_line_code";
    pub const PRODUCT_LINE: &str = "license:product_line";
    pub const HAS_DEFAULT_PRODUCT_LINE: &str = "license:has_default_product_line";

    pub const ART_FILE_NUMBER: &str = "art_file_number:number";
    pub const ART_FILE_SHORT_NAME: &str = "art_file_number:short_name";

    pub const STYLE_DEPARTMENT: &str = "style_number:department";
    pub const STYLE_NUMBER: &str = "style_number:number";
    pub const STYLE_SHORT_NAME: &str = "style_number:short_name";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssetType {
    Composition,
    CompositionResource,
    LicensedArtResource,
    Other,
}

/// Fields read from the title during the last `run()`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedFields {
    pub license_year: u32,
    pub license_code: String,
    pub department: String,
    pub seq_number_str: String,
    pub seq_number_suffix: String,
    pub name: String,
}

/// Everything a classification needs besides the document itself.
pub struct RelationContext {
    pub repository: Arc<dyn DocumentRepository>,
    pub vocabulary: Arc<dyn VocabularyService>,
    pub containers: ContainerPaths,
    pub departments: DepartmentVocabulary,
    pub picture_type: String,
}

impl RelationContext {
    pub fn new(
        repository: Arc<dyn DocumentRepository>,
        vocabulary: Arc<dyn VocabularyService>,
        picture_type: &str,
        titles: ContainerTitles,
    ) -> Self {
        Self {
            repository,
            vocabulary,
            containers: ContainerPaths::new(titles),
            departments: DepartmentVocabulary::new(),
            picture_type: picture_type.to_string(),
        }
    }
}

pub struct RelationBuilder<'a> {
    ctx: &'a RelationContext,
    doc: Document,
    fields: ExtractedFields,
    asset_type: AssetType,
    modified_and_saved: bool,
}

impl<'a> RelationBuilder<'a> {
    pub fn new(doc: Document, ctx: &'a RelationContext) -> Self {
        Self {
            ctx,
            doc,
            fields: ExtractedFields::default(),
            asset_type: AssetType::Other,
            modified_and_saved: false,
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        if self.doc.doc_type != self.ctx.picture_type {
            return Ok(());
        }

        let Some(title) = self.doc.title().map(str::to_string) else {
            return Ok(());
        };
        if title.chars().count() < MIN_TITLE_LENGTH {
            return Ok(());
        }

        let parts = TitleParts::parse(&title);
        let stem = parts.stem.unwrap_or_default();

        match parts.class() {
            TitleClass::LicensedComposition => {
                self.link_licensed_asset(stem, AssetType::Composition, NATURE_COMPOSITION)
                    .await
            }
            TitleClass::CompositionResource => self.link_composition_resource(stem).await,
            TitleClass::LicensedArtResource => {
                self.link_licensed_asset(
                    stem,
                    AssetType::LicensedArtResource,
                    NATURE_LICENSED_ART_RESOURCE,
                )
                .await
            }
            TitleClass::Unclassified => {
                self.reset();
                Ok(())
            }
        }
    }

    async fn link_licensed_asset(&mut self, stem: &str, asset_type: AssetType, nature: &str) -> Result<()> {
        self.reset();
        self.asset_type = asset_type;

        if let Some(parsed) = parse_licensed(stem) {
            self.fields.license_year = parsed.year;
            self.fields.license_code = parsed.code;
            self.fields.seq_number_str = parsed.sequence.number;
            self.fields.seq_number_suffix = parsed.sequence.suffix;
            self.fields.name = parsed.name;
        }

        if is_blank(&self.fields.license_code)
            || is_blank(&self.fields.seq_number_str)
            || is_blank(&self.fields.name)
        {
            tracing::debug!("Not enough information in '{}', skipping", stem);
            return Ok(());
        }

        let license_query = DocumentQuery::new(LICENSE_TYPE)
            .where_eq(fields::LICENSE_YEAR, self.fields.license_year)
            .where_eq(fields::PRODUCT_LINE_CODE, self.fields.license_code.as_str());
        let license_name = format!(
            "{}{} {}",
            self.fields.license_year, self.fields.license_code, self.fields.license_code
        );
        // 從檔名取不到 product line，先用代碼
        let license = self
            .find_or_create(
                license_query,
                ContainerKind::LicenseRoot,
                &license_name,
                vec![
                    (fields::PRODUCT_LINE, Value::from(self.fields.license_code.as_str())),
                    (fields::HAS_DEFAULT_PRODUCT_LINE, Value::Bool(true)),
                ],
            )
            .await?;
        self.doc.set_property(fields::LICENSE_ID, license.id.as_str());

        let afn_query = DocumentQuery::new(ART_FILE_NUMBER_TYPE)
            .where_eq(fields::LICENSE_ID, license.id.as_str())
            .where_eq(fields::ART_FILE_NUMBER, self.fields.seq_number_str.as_str());
        let afn_name = format!("{}{}", self.fields.seq_number_str, self.fields.name);
        let afn = self
            .find_or_create(
                afn_query,
                ContainerKind::ArtFileNumbers,
                &afn_name,
                vec![(fields::ART_FILE_SHORT_NAME, Value::from(self.fields.name.as_str()))],
            )
            .await?;
        self.doc.set_property(fields::ART_FILE_NUMBER_ID, afn.id.as_str());

        self.doc.set_property(fields::NATURE, nature);
        self.doc
            .set_property(fields::VARIATION_LETTER, self.fields.seq_number_suffix.as_str());
        self.doc.set_property(fields::LICENSING, LICENSED);

        self.save().await
    }

    async fn link_composition_resource(&mut self, stem: &str) -> Result<()> {
        self.reset();
        self.asset_type = AssetType::CompositionResource;

        if let Some(parsed) = parse_resource(stem) {
            self.fields.department = parsed.department;
            self.fields.seq_number_str = parsed.sequence.number;
            self.fields.seq_number_suffix = parsed.sequence.suffix;
            self.fields.name = parsed.name;
        }

        if is_blank(&self.fields.department)
            || is_blank(&self.fields.seq_number_str)
            || is_blank(&self.fields.name)
        {
            tracing::debug!("Not enough information in '{}', skipping", stem);
            return Ok(());
        }

        self.ctx
            .departments
            .ensure(self.ctx.vocabulary.as_ref(), &self.fields.department)
            .await?;

        let style_query = DocumentQuery::new(STYLE_NUMBER_TYPE)
            .where_eq(fields::STYLE_DEPARTMENT, self.fields.department.as_str())
            .where_eq(fields::STYLE_NUMBER, self.fields.seq_number_str.as_str())
            .where_eq(fields::STYLE_SHORT_NAME, self.fields.name.as_str());
        let style_name = format!(
            "{}{}{}",
            self.fields.department, self.fields.seq_number_str, self.fields.name
        );
        let style = self
            .find_or_create(style_query, ContainerKind::StyleNumbers, &style_name, Vec::new())
            .await?;
        self.doc.set_property(fields::STYLE_NUMBER_ID, style.id.as_str());

        // licensing is left as is for non-licensed resources
        self.doc.set_property(fields::NATURE, NATURE_COMPOSITION_RESOURCE);
        self.doc
            .set_property(fields::VARIATION_LETTER, self.fields.seq_number_suffix.as_str());

        self.save().await
    }

    /// First live match of `query`, or a new record holding the queried
    /// values plus `extra` under the given container.
    ///
    /// There is no uniqueness constraint behind this: two concurrent callers
    /// with the same key can both create a record.
    async fn find_or_create(
        &self,
        query: DocumentQuery,
        container: ContainerKind,
        name: &str,
        extra: Vec<(&str, Value)>,
    ) -> Result<Document> {
        let repository = self.ctx.repository.as_ref();
        tracing::debug!("Lookup: {}", query.to_nxql());

        if let Some(existing) = repository.query_page(&query, 1).await?.into_iter().next() {
            return Ok(existing);
        }

        let parent = self.ctx.containers.path(repository, container).await?;
        let mut model = Document::new_at(parent, name, &query.doc_type);
        for condition in &query.conditions {
            if let Condition::Equals { field, value } = condition {
                model.set_property(field, value.clone());
            }
        }
        for (field, value) in extra {
            model.set_property(field, value);
        }

        let created = repository.create_document(model).await?;
        let saved = repository.save_document(&created).await?;
        tracing::info!("🆕 Created {} '{}' ({})", saved.doc_type, saved.name, saved.id);
        Ok(saved)
    }

    async fn save(&mut self) -> Result<()> {
        self.doc = self.ctx.repository.save_document(&self.doc).await?;
        self.modified_and_saved = true;
        Ok(())
    }

    fn reset(&mut self) {
        self.fields = ExtractedFields::default();
        self.asset_type = AssetType::Other;
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    pub fn into_document(self) -> Document {
        self.doc
    }

    pub fn fields(&self) -> &ExtractedFields {
        &self.fields
    }

    pub fn asset_type(&self) -> AssetType {
        self.asset_type
    }

    pub fn doc_was_modified_and_saved(&self) -> bool {
        self.modified_and_saved
    }

    /// One-line summary for the logs.
    pub fn to_json_string(&self) -> String {
        serde_json::json!({
            "licenseYear": self.fields.license_year,
            "licenseCode": self.fields.license_code,
            "department": self.fields.department,
            "seqNumberStr": self.fields.seq_number_str,
            "seqNumberSuffix": self.fields.seq_number_suffix,
            "name": self.fields.name,
            "assetType": self.asset_type,
        })
        .to_string()
    }
}

/// Classifies one document, logs the outcome and returns the (possibly saved) document.
pub async fn build_asset_relations(doc: Document, ctx: &RelationContext) -> Result<Document> {
    let mut builder = RelationBuilder::new(doc, ctx);
    builder.run().await?;
    tracing::info!(
        saved = builder.doc_was_modified_and_saved(),
        "{}",
        builder.to_json_string()
    );
    Ok(builder.into_document())
}
