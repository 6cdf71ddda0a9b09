use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::PathBuf;

pub const LIFECYCLE_DELETED: &str = "deleted";

/// A document as stored by the content repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Empty until the repository has created the document.
    #[serde(default)]
    pub id: String,
    pub doc_type: String,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub schemas: Vec<String>,
    #[serde(default)]
    pub properties: BTreeMap<String, Value>,
    #[serde(default)]
    pub is_version: bool,
    #[serde(default)]
    pub is_proxy: bool,
    #[serde(default = "default_lifecycle_state")]
    pub lifecycle_state: String,
    /// Picture renditions by view title, pointing at the rendered files.
    #[serde(default)]
    pub views: BTreeMap<String, PathBuf>,
}

fn default_lifecycle_state() -> String {
    "project".to_string()
}

impl Document {
    /// Builds a document model to be created under `parent_path`.
    pub fn new_at(parent_path: &str, name: &str, doc_type: &str) -> Self {
        Self {
            id: String::new(),
            doc_type: doc_type.to_string(),
            path: parent_path.to_string(),
            name: name.to_string(),
            schemas: Vec::new(),
            properties: BTreeMap::new(),
            is_version: false,
            is_proxy: false,
            lifecycle_state: default_lifecycle_state(),
            views: BTreeMap::new(),
        }
    }

    pub fn title(&self) -> Option<&str> {
        self.string_property("dc:title")
    }

    pub fn property(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }

    pub fn string_property(&self, name: &str) -> Option<&str> {
        self.properties.get(name).and_then(|v| v.as_str())
    }

    pub fn set_property(&mut self, name: &str, value: impl Into<Value>) {
        self.properties.insert(name.to_string(), value.into());
    }

    pub fn has_schema(&self, schema: &str) -> bool {
        self.schemas.iter().any(|s| s == schema)
    }

    /// Not a version, not a proxy, not soft-deleted.
    pub fn is_live(&self) -> bool {
        !self.is_version && !self.is_proxy && self.lifecycle_state != LIFECYCLE_DELETED
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Condition {
    Equals { field: String, value: Value },
    /// Matches a missing/null property, `false` or `0`.
    IsNullOrFalse { field: String },
}

impl Condition {
    pub fn matches(&self, doc: &Document) -> bool {
        match self {
            Condition::Equals { field, value } => doc.property(field) == Some(value),
            Condition::IsNullOrFalse { field } => match doc.property(field) {
                None | Some(Value::Null) => true,
                Some(Value::Bool(b)) => !b,
                Some(Value::Number(n)) => n.as_f64() == Some(0.0),
                Some(_) => false,
            },
        }
    }

    fn to_nxql(&self) -> String {
        match self {
            Condition::Equals { field, value } => match value {
                Value::String(s) => format!("{} = '{}'", field, s.replace('\'', "\\'")),
                other => format!("{} = {}", field, other),
            },
            Condition::IsNullOrFalse { field } => {
                format!("({} IS NULL OR {} = 0)", field, field)
            }
        }
    }
}

/// Equality-conjunction query over one document type.
///
/// Results are ordered by identifier so that `after_id` can be used as a
/// keyset cursor. Versions, proxies and deleted documents are excluded
/// unless `live_only` is turned off.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentQuery {
    pub doc_type: String,
    pub conditions: Vec<Condition>,
    pub live_only: bool,
    pub after_id: Option<String>,
}

impl DocumentQuery {
    pub fn new(doc_type: &str) -> Self {
        Self {
            doc_type: doc_type.to_string(),
            conditions: Vec::new(),
            live_only: true,
            after_id: None,
        }
    }

    pub fn where_eq(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.conditions.push(Condition::Equals {
            field: field.to_string(),
            value: value.into(),
        });
        self
    }

    pub fn where_null_or_false(mut self, field: &str) -> Self {
        self.conditions.push(Condition::IsNullOrFalse {
            field: field.to_string(),
        });
        self
    }

    pub fn after(mut self, id: Option<String>) -> Self {
        self.after_id = id;
        self
    }

    pub fn matches(&self, doc: &Document) -> bool {
        if doc.doc_type != self.doc_type {
            return false;
        }
        if self.live_only && !doc.is_live() {
            return false;
        }
        if let Some(after) = &self.after_id {
            if doc.id.as_str() <= after.as_str() {
                return false;
            }
        }
        self.conditions.iter().all(|c| c.matches(doc))
    }

    /// NXQL rendering, used for logging and by NXQL-speaking adapters.
    pub fn to_nxql(&self) -> String {
        let mut clauses: Vec<String> = self.conditions.iter().map(Condition::to_nxql).collect();
        if let Some(after) = &self.after_id {
            clauses.push(format!("ecm:uuid > '{}'", after));
        }
        if self.live_only {
            clauses.push("ecm:isCheckedInVersion = 0".to_string());
            clauses.push("ecm:isProxy = 0".to_string());
            clauses.push(format!("ecm:currentLifeCycleState != '{}'", LIFECYCLE_DELETED));
        }

        let mut nxql = format!("SELECT * FROM {}", self.doc_type);
        if !clauses.is_empty() {
            nxql.push_str(" WHERE ");
            nxql.push_str(&clauses.join(" AND "));
        }
        nxql.push_str(" ORDER BY ecm:uuid");
        nxql
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VocabularyEntry {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub parent: String,
    #[serde(default)]
    pub obsolete: bool,
    #[serde(default)]
    pub ordering: i64,
}

impl VocabularyEntry {
    pub fn new(value: &str, ordering: i64) -> Self {
        Self {
            id: value.to_string(),
            label: value.to_string(),
            parent: String::new(),
            obsolete: false,
            ordering,
        }
    }
}

/// Outcome of an external command invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecResult {
    pub successful: bool,
    pub error: Option<String>,
    pub return_code: i32,
    pub command_line: String,
    pub output: Vec<String>,
}

/// In-memory binary output with the name and MIME type it is served under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    pub filename: String,
    pub mime_type: String,
    pub data: Vec<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn picture(id: &str) -> Document {
        let mut doc = Document::new_at("/default-domain/workspaces", id, "Picture");
        doc.id = id.to_string();
        doc
    }

    #[test]
    fn test_query_excludes_versions_proxies_and_deleted() {
        let query = DocumentQuery::new("Picture");
        let live = picture("a");
        let mut version = picture("b");
        version.is_version = true;
        let mut proxy = picture("c");
        proxy.is_proxy = true;
        let mut deleted = picture("d");
        deleted.lifecycle_state = LIFECYCLE_DELETED.to_string();

        assert!(query.matches(&live));
        assert!(!query.matches(&version));
        assert!(!query.matches(&proxy));
        assert!(!query.matches(&deleted));
    }

    #[test]
    fn test_null_or_false_condition() {
        let query = DocumentQuery::new("Picture").where_null_or_false("admin:is_copy");
        let mut doc = picture("a");
        assert!(query.matches(&doc));
        doc.set_property("admin:is_copy", 0);
        assert!(query.matches(&doc));
        doc.set_property("admin:is_copy", false);
        assert!(query.matches(&doc));
        doc.set_property("admin:is_copy", true);
        assert!(!query.matches(&doc));
        doc.set_property("admin:is_copy", 1);
        assert!(!query.matches(&doc));
    }

    #[test]
    fn test_equals_is_type_sensitive() {
        let mut doc = Document::new_at("/", "l", "IPcontract");
        doc.set_property("license:year", 15);
        assert!(DocumentQuery::new("IPcontract")
            .where_eq("license:year", 15)
            .matches(&doc));
        assert!(!DocumentQuery::new("IPcontract")
            .where_eq("license:year", "15")
            .matches(&doc));
    }

    #[test]
    fn test_to_nxql() {
        let query = DocumentQuery::new("IPcontract")
            .where_eq("license:year", json!(15))
            .where_eq("license:product_line_code", "BTMN");
        assert_eq!(
            query.to_nxql(),
            "SELECT * FROM IPcontract WHERE license:year = 15 AND license:product_line_code = 'BTMN' \
             AND ecm:isCheckedInVersion = 0 AND ecm:isProxy = 0 \
             AND ecm:currentLifeCycleState != 'deleted' ORDER BY ecm:uuid"
        );
    }
}
