use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Document identifier. Caller-supplied ids are taken verbatim; auto-assigned
/// ids follow `{indexName}-{ordinal}-{epoch-ms}` (spec §3).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DocId(pub String);

impl DocId {
    pub fn new(id: impl Into<String>) -> Self {
        DocId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for DocId {
    fn from(id: String) -> Self {
        DocId(id)
    }
}

impl From<&str> for DocId {
    fn from(id: &str) -> Self {
        DocId(id.to_string())
    }
}

impl std::fmt::Display for DocId {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Heterogeneously-typed field value (Design Notes §9: "Dynamic field
/// values"). `Map` uses `BTreeMap` so recursive normalisation to text and
/// snapshot serialisation are order-stable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
}

impl Value {
    /// Reduce any variant to the string used for tokenisation (spec §4.3).
    pub fn to_indexable_text(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Bool(b) => b.to_string(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => f.to_string(),
            Value::Text(s) => s.clone(),
            Value::List(items) => items
                .iter()
                .map(Value::to_indexable_text)
                .collect::<Vec<_>>()
                .join(" "),
            Value::Map(map) => map
                .values()
                .map(Value::to_indexable_text)
                .collect::<Vec<_>>()
                .join(" "),
        }
    }

    /// Dot-notation path lookup into a nested `Map` value (spec §3's
    /// "Indexable fields": dot-notation into `content`).
    pub fn get_path(&self, path: &str) -> Option<&Value> {
        let mut current = self;
        for segment in path.split('.') {
            match current {
                Value::Map(map) => current = map.get(segment)?,
                _ => return None,
            }
        }
        Some(current)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RelationKind {
    Reference,
    Parent,
    Child,
    Related,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relation {
    pub source_id: DocId,
    pub target_id: DocId,
    pub kind: RelationKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub indexed: i64,
    pub last_modified: i64,
    pub checksum: Option<String>,
    pub permissions: Option<Value>,
    pub workflow: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentVersion {
    pub version: u32,
    pub content: Value,
    pub modified: DateTime<Utc>,
    pub author: Option<String>,
}

/// Opaque caller payload (spec §3). `fields` is the mapping indexable-field
/// paths are resolved against; `content` is a conventional field name for
/// the distinguished nested `{text, ...}` mapping the spec calls out, but it
/// is not special-cased here — it is just another entry in `fields`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocId,
    pub fields: BTreeMap<String, Value>,
    pub metadata: Option<DocumentMetadata>,
    #[serde(default)]
    pub versions: Vec<DocumentVersion>,
    #[serde(default)]
    pub relations: Vec<Relation>,
}

impl Document {
    pub fn new(id: DocId) -> Self {
        Document {
            id,
            fields: BTreeMap::new(),
            metadata: None,
            versions: Vec::new(),
            relations: Vec::new(),
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, value: Value) -> Self {
        self.fields.insert(name.into(), value);
        self
    }

    /// Resolve a dot-notation field path, e.g. `content.text`.
    pub fn get_path(&self, path: &str) -> Option<&Value> {
        let mut parts = path.splitn(2, '.');
        let head = parts.next()?;
        let root = self.fields.get(head)?;
        match parts.next() {
            Some(rest) => root.get_path(rest),
            None => Some(root),
        }
    }
}
