//! Document bodies and single-write acknowledgements.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// A schema-less document body: field name to dynamically typed value.
pub type Document = Map<String, Value>;

/// The field holding the caller-supplied document identity.
pub const KEY_FIELD: &str = "key";

/// Returns the caller-supplied key of a document, if it carries a usable one.
///
/// Non-empty strings are used as-is and integers are rendered in decimal.
/// Anything else (absent, null, empty, floats, objects) means "no key".
pub fn document_key(document: &Document) -> Option<String> {
    match document.get(KEY_FIELD)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) if n.is_i64() || n.is_u64() => Some(n.to_string()),
        _ => None,
    }
}

/// Returns the backend id for a document: its key, or a fresh UUID when it has none.
pub fn resolve_document_id(document: &Document) -> String {
    document_key(document).unwrap_or_else(|| Uuid::new_v4().to_string())
}

/// Outcome reported by the engine for a single-document write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteOutcome {
    /// A new document was stored.
    Created,
    /// An existing document was changed.
    Updated,
    /// The document was removed.
    Deleted,
    /// The update left the document unchanged.
    Noop,
    /// The target document did not exist.
    NotFound,
}

/// Acknowledgement of a single-document write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteResult {
    /// Index the write landed in.
    #[serde(rename = "_index")]
    pub index: String,

    /// Backend document id.
    #[serde(rename = "_id")]
    pub id: String,

    /// Document version after the write, when the engine reports one.
    #[serde(rename = "_version", default)]
    pub version: Option<u64>,

    /// What the write did.
    pub result: WriteOutcome,
}

impl WriteResult {
    /// Creates a write acknowledgement.
    pub fn new(
        index: impl Into<String>,
        id: impl Into<String>,
        version: Option<u64>,
        result: WriteOutcome,
    ) -> Self {
        Self {
            index: index.into(),
            id: id.into(),
            version,
            result,
        }
    }
}
