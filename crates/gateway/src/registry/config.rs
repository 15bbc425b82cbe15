//! Per-index configuration: sort aliases, searchable fields and the index definition.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::error::ValidationError;
use crate::types::Document;

/// Configuration of a single index.
///
/// `settings` and `mappings` are passed to the engine unmodified when the index
/// is created. `mappings` is also used to check document shapes before writes.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct IndexConfiguration {
    /// Index name, the registry key.
    pub index_name: String,

    /// Public sort alias -> backend field.
    #[serde(default)]
    pub sort_fields: BTreeMap<String, String>,

    /// Backend field paths eligible for prefix search.
    #[serde(default)]
    pub searchable_fields: BTreeSet<String>,

    /// Index settings (analysis, shard counts...).
    #[serde(default)]
    pub settings: Value,

    /// Index mappings.
    #[serde(default)]
    pub mappings: Value,
}

impl IndexConfiguration {
    /// Creates an empty configuration: no sorting, no search, engine defaults.
    pub fn new(index_name: impl Into<String>) -> Self {
        Self {
            index_name: index_name.into(),
            ..Default::default()
        }
    }

    /// Registers a sort alias.
    pub fn with_sort_field(mut self, alias: impl Into<String>, field: impl Into<String>) -> Self {
        self.sort_fields.insert(alias.into(), field.into());
        self
    }

    /// Registers a searchable field path.
    pub fn with_searchable_field(mut self, field: impl Into<String>) -> Self {
        self.searchable_fields.insert(field.into());
        self
    }

    /// Sets the index settings.
    pub fn with_settings(mut self, settings: Value) -> Self {
        self.settings = settings;
        self
    }

    /// Sets the index mappings.
    pub fn with_mappings(mut self, mappings: Value) -> Self {
        self.mappings = mappings;
        self
    }

    /// Resolves a sort alias to its backend field.
    pub fn sort_field(&self, alias: &str) -> Option<&str> {
        self.sort_fields.get(alias).map(String::as_str)
    }

    /// Returns true if free-text search applies to this index.
    pub fn supports_search(&self) -> bool {
        !self.searchable_fields.is_empty()
    }

    /// Returns the create-index request body.
    pub fn creation_body(&self) -> Value {
        let mut body = Map::new();
        if !self.settings.is_null() {
            body.insert("settings".to_string(), self.settings.clone());
        }
        if !self.mappings.is_null() {
            body.insert("mappings".to_string(), self.mappings.clone());
        }
        Value::Object(body)
    }

    /// Checks the fields present in `document` against the mapped field types.
    ///
    /// Unmapped fields are accepted. Mapped fields must hold a value the engine
    /// would coerce into the mapped type.
    pub fn validate_document(&self, document: &Document) -> Result<(), ValidationError> {
        match self.mappings.get("properties").and_then(Value::as_object) {
            Some(properties) => validate_properties(properties, document, ""),
            None => Ok(()),
        }
    }
}

fn validate_properties(
    properties: &Map<String, Value>,
    document: &Map<String, Value>,
    prefix: &str,
) -> Result<(), ValidationError> {
    for (name, value) in document {
        let Some(mapping) = properties.get(name) else {
            continue;
        };
        let path = if prefix.is_empty() {
            name.clone()
        } else {
            format!("{}.{}", prefix, name)
        };
        validate_field(mapping, value, &path)?;
    }
    Ok(())
}

fn validate_field(mapping: &Value, value: &Value, path: &str) -> Result<(), ValidationError> {
    match value {
        Value::Null => return Ok(()),
        // Any mapped field may hold an array of values of its type
        Value::Array(values) => {
            for v in values {
                validate_field(mapping, v, path)?;
            }
            return Ok(());
        }
        _ => {}
    }

    if let Some(properties) = mapping.get("properties").and_then(Value::as_object) {
        return match value.as_object() {
            Some(nested) => validate_properties(properties, nested, path),
            None => Err(incompatible(path, "object", value)),
        };
    }

    let Some(field_type) = mapping.get("type").and_then(Value::as_str) else {
        return Ok(());
    };
    let has_custom_format = mapping.get("format").is_some();

    let compatible = match field_type {
        "text" | "keyword" | "wildcard" | "match_only_text" | "search_as_you_type" => {
            matches!(value, Value::String(_) | Value::Number(_) | Value::Bool(_))
        }
        "long" | "integer" | "short" | "byte" | "unsigned_long" => match value {
            Value::Number(n) => n.is_i64() || n.is_u64(),
            Value::String(s) => is_integer(s.trim()),
            _ => false,
        },
        "double" | "float" | "half_float" | "scaled_float" => match value {
            Value::Number(_) => true,
            Value::String(s) => s.trim().parse::<f64>().is_ok(),
            _ => false,
        },
        "boolean" => match value {
            Value::Bool(_) => true,
            Value::String(s) => matches!(s.as_str(), "true" | "false" | ""),
            _ => false,
        },
        "date" => match value {
            Value::Number(n) => n.is_i64() || n.is_u64(),
            Value::String(_) if has_custom_format => true,
            Value::String(s) => is_date(s),
            _ => false,
        },
        "object" | "nested" | "flattened" => value.is_object(),
        // Types we do not model (geo_point, ip, dense_vector...) are left to the engine
        _ => true,
    };

    if compatible {
        Ok(())
    } else {
        Err(incompatible(path, field_type, value))
    }
}

fn is_integer(s: &str) -> bool {
    s.parse::<i64>().is_ok() || s.parse::<u64>().is_ok()
}

/// Accepts the engine's default `strict_date_optional_time` shapes we see in practice.
fn is_date(s: &str) -> bool {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok()
        || DateTime::parse_from_rfc3339(s).is_ok()
        || NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f").is_ok()
        || NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M").is_ok()
}

fn incompatible(path: &str, expected: &str, value: &Value) -> ValidationError {
    ValidationError::IncompatibleField {
        field: path.to_string(),
        expected: expected.to_string(),
        found: json_type_name(value).to_string(),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// A text field with a `keyword` sub-field, the shape most string fields use.
pub fn text_with_keyword(ignore_above: Option<u32>) -> Value {
    let mut keyword = json!({ "type": "keyword" });
    if let Some(limit) = ignore_above {
        keyword["ignore_above"] = json!(limit);
    }
    json!({
        "type": "text",
        "fields": { "keyword": keyword }
    })
}
