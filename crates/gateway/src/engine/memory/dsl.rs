//! Evaluation of the query DSL subset understood by the in-memory engine.
//!
//! Supported clauses: `match_all`, `match_none`, `bool` (`must`, `filter`,
//! `should`, `must_not`, `minimum_should_match`), `term`, `terms`, `ids`,
//! `exists`, `range`, `prefix` and `wildcard`. Anything else is rejected the
//! way the engine rejects an unknown query.
//!
//! Text matching approximates the standard analyzer: field values are split on
//! non-alphanumeric characters and lowercased before `prefix`/`wildcard`
//! patterns are applied. Patterns themselves are not analyzed, so a mixed-case
//! pattern only matches with `case_insensitive: true`. Paths ending in
//! `.keyword` match the whole, unmodified value instead.

use std::cmp::Ordering;

use serde_json::{Map, Value};

use crate::types::Document;

/// Returns whether the document with `id` satisfies `query`.
pub(super) fn matches(query: &Value, id: &str, doc: &Document) -> Result<bool, String> {
    let clause = query
        .as_object()
        .ok_or_else(|| format!("query malformed, expected an object, found [{}]", query))?;

    let mut entries = clause.iter();
    let (name, body) = match (entries.next(), entries.next()) {
        (Some(entry), None) => entry,
        (None, _) => return Err("query malformed, empty clause".to_string()),
        (Some(_), Some(_)) => {
            return Err("query malformed, more than one clause in a query object".to_string());
        }
    };

    match name.as_str() {
        "match_all" => Ok(true),
        "match_none" => Ok(false),
        "bool" => matches_bool(body, id, doc),
        "term" => {
            let (field, expected) = single_field(name, body)?;
            let expected = value_param(expected);
            Ok(field_values(doc, field)
                .iter()
                .any(|v| values_equal(v, expected)))
        }
        "terms" => {
            let (field, expected) = single_field(name, body)?;
            let expected = expected
                .as_array()
                .ok_or_else(|| "[terms] query requires an array of values".to_string())?;
            let values = field_values(doc, field);
            Ok(expected
                .iter()
                .any(|e| values.iter().any(|v| values_equal(v, e))))
        }
        "ids" => {
            let ids = body
                .get("values")
                .and_then(Value::as_array)
                .ok_or_else(|| "[ids] query requires [values]".to_string())?;
            Ok(ids.iter().any(|v| v.as_str() == Some(id)))
        }
        "exists" => {
            let field = body
                .get("field")
                .and_then(Value::as_str)
                .ok_or_else(|| "[exists] query requires [field]".to_string())?;
            Ok(!field_values(doc, field).is_empty())
        }
        "range" => {
            let (field, bounds) = single_field(name, body)?;
            matches_range(field_values(doc, field), bounds)
        }
        "prefix" => {
            let (field, param) = single_field(name, body)?;
            let prefix = string_param(name, param)?;
            let pattern = format!("{}*", prefix);
            Ok(matches_pattern(doc, field, &pattern, case_insensitive(param)))
        }
        "wildcard" => {
            let (field, param) = single_field(name, body)?;
            let pattern = string_param(name, param)?;
            Ok(matches_pattern(doc, field, pattern, case_insensitive(param)))
        }
        other => Err(format!("unknown query [{}]", other)),
    }
}

fn matches_bool(body: &Value, id: &str, doc: &Document) -> Result<bool, String> {
    let body = body
        .as_object()
        .ok_or_else(|| "[bool] query malformed, expected an object".to_string())?;

    for key in body.keys() {
        if !matches!(
            key.as_str(),
            "must" | "filter" | "should" | "must_not" | "minimum_should_match" | "boost"
        ) {
            return Err(format!("[bool] query does not support [{}]", key));
        }
    }

    for key in ["must", "filter"] {
        for clause in clauses(body, key) {
            if !matches(clause, id, doc)? {
                return Ok(false);
            }
        }
    }

    for clause in clauses(body, "must_not") {
        if matches(clause, id, doc)? {
            return Ok(false);
        }
    }

    let should = clauses(body, "should");
    if should.is_empty() {
        return Ok(true);
    }

    let has_required = !clauses(body, "must").is_empty() || !clauses(body, "filter").is_empty();
    let minimum = match body.get("minimum_should_match") {
        Some(Value::Number(n)) => n.as_u64().unwrap_or(0) as usize,
        Some(Value::String(s)) => s
            .parse::<usize>()
            .map_err(|_| format!("unsupported minimum_should_match [{}]", s))?,
        Some(other) => return Err(format!("unsupported minimum_should_match [{}]", other)),
        None if has_required => 0,
        None => 1,
    };

    let mut satisfied = 0;
    for clause in should {
        if matches(clause, id, doc)? {
            satisfied += 1;
        }
    }
    Ok(satisfied >= minimum)
}

/// A bool occurrence may be a single clause or an array of clauses.
fn clauses<'a>(body: &'a Map<String, Value>, key: &str) -> Vec<&'a Value> {
    match body.get(key) {
        Some(Value::Array(items)) => items.iter().collect(),
        Some(clause @ Value::Object(_)) => vec![clause],
        _ => Vec::new(),
    }
}

fn single_field<'a>(query: &str, body: &'a Value) -> Result<(&'a str, &'a Value), String> {
    let body = body
        .as_object()
        .ok_or_else(|| format!("[{}] query malformed, expected an object", query))?;
    let mut fields = body.iter().filter(|(k, _)| k.as_str() != "boost");
    match (fields.next(), fields.next()) {
        (Some((field, param)), None) => Ok((field.as_str(), param)),
        _ => Err(format!("[{}] query requires exactly one field", query)),
    }
}

/// Long form `{"field": {"value": v}}` or short form `{"field": v}`.
fn value_param(param: &Value) -> &Value {
    param.get("value").unwrap_or(param)
}

fn case_insensitive(param: &Value) -> bool {
    param
        .get("case_insensitive")
        .and_then(Value::as_bool)
        .unwrap_or(false)
}

fn string_param<'a>(query: &str, param: &'a Value) -> Result<&'a str, String> {
    value_param(param)
        .as_str()
        .ok_or_else(|| format!("[{}] query requires a string value", query))
}

/// Collects the values at a dotted path, flattening arrays. Nulls are dropped.
pub(super) fn field_values<'a>(doc: &'a Document, path: &str) -> Vec<&'a Value> {
    let path = path.strip_suffix(".keyword").unwrap_or(path);
    let mut current: Vec<&Value> = Vec::new();
    let mut segments = path.split('.');

    if let Some(first) = segments.next() {
        if let Some(value) = doc.get(first) {
            current.push(value);
        }
    }

    for segment in segments {
        current = flatten(current)
            .into_iter()
            .filter_map(|v| v.as_object().and_then(|o| o.get(segment)))
            .collect();
    }

    flatten(current)
        .into_iter()
        .filter(|v| !v.is_null())
        .collect()
}

fn flatten(values: Vec<&Value>) -> Vec<&Value> {
    let mut out = Vec::with_capacity(values.len());
    for value in values {
        match value {
            Value::Array(items) => out.extend(flatten(items.iter().collect())),
            other => out.push(other),
        }
    }
    out
}

fn values_equal(actual: &Value, expected: &Value) -> bool {
    match (actual, expected) {
        (Value::Number(a), Value::Number(b)) => a.as_f64() == b.as_f64(),
        (Value::Number(a), Value::String(b)) | (Value::String(b), Value::Number(a)) => {
            b.parse::<f64>().ok() == a.as_f64()
        }
        _ => actual == expected,
    }
}

fn matches_range(values: Vec<&Value>, bounds: &Value) -> Result<bool, String> {
    let bounds = bounds
        .as_object()
        .ok_or_else(|| "[range] query malformed, expected an object".to_string())?;

    Ok(values.iter().any(|value| {
        bounds.iter().all(|(op, bound)| {
            let ord = compare_values(value, bound);
            match op.as_str() {
                "gt" => ord == Ordering::Greater,
                "gte" => ord != Ordering::Less,
                "lt" => ord == Ordering::Less,
                "lte" => ord != Ordering::Greater,
                _ => true,
            }
        })
    }))
}

fn matches_pattern(doc: &Document, field: &str, pattern: &str, case_insensitive: bool) -> bool {
    let exact = field.ends_with(".keyword");
    let pattern: Vec<char> = if case_insensitive {
        pattern.to_lowercase().chars().collect()
    } else {
        pattern.chars().collect()
    };

    field_values(doc, field).iter().any(|value| {
        let text = match value {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            _ => return false,
        };
        if exact {
            let text = if case_insensitive {
                text.to_lowercase()
            } else {
                text
            };
            let chars: Vec<char> = text.chars().collect();
            glob_match(&pattern, &chars)
        } else {
            tokenize(&text).iter().any(|token| {
                let chars: Vec<char> = token.chars().collect();
                glob_match(&pattern, &chars)
            })
        }
    })
}

fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Glob matching with `*` (any run) and `?` (any single character).
fn glob_match(pattern: &[char], text: &[char]) -> bool {
    let (mut p, mut t) = (0, 0);
    let mut backtrack: Option<(usize, usize)> = None;

    while t < text.len() {
        if p < pattern.len() && (pattern[p] == '?' || pattern[p] == text[t]) {
            p += 1;
            t += 1;
        } else if p < pattern.len() && pattern[p] == '*' {
            backtrack = Some((p, t));
            p += 1;
        } else if let Some((star, matched)) = backtrack {
            p = star + 1;
            t = matched + 1;
            backtrack = Some((star, matched + 1));
        } else {
            return false;
        }
    }

    pattern[p..].iter().all(|&c| c == '*')
}

/// Total order over JSON scalars used for sorting and ranges.
pub(super) fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Value::Number(x), Value::String(y)) => match y.parse::<f64>() {
            Ok(y) => x.as_f64().partial_cmp(&Some(y)).unwrap_or(Ordering::Equal),
            Err(_) => Ordering::Less,
        },
        (Value::String(x), Value::Number(y)) => match x.parse::<f64>() {
            Ok(x) => Some(x).partial_cmp(&y.as_f64()).unwrap_or(Ordering::Equal),
            Err(_) => Ordering::Greater,
        },
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn blog() -> Document {
        json!({
            "key": 4,
            "title": "Blog 4",
            "is_active": true,
            "created_at": "2021-04-03",
            "source": { "name": "Amazon Cloud", "id": 2 },
            "tags": ["serverless", "php"]
        })
        .as_object()
        .cloned()
        .unwrap()
    }

    fn check(query: Value) -> bool {
        matches(&query, "4", &blog()).unwrap()
    }

    #[test]
    fn test_match_all_and_none() {
        assert!(check(json!({"match_all": {}})));
        assert!(!check(json!({"match_none": {}})));
    }

    #[test]
    fn test_term_forms() {
        assert!(check(json!({"term": {"is_active": true}})));
        assert!(check(json!({"term": {"source.id": {"value": 2}}})));
        assert!(check(json!({"term": {"key": "4"}})));
        assert!(!check(json!({"term": {"key": 5}})));
        assert!(check(json!({"terms": {"tags": ["php", "go"]}})));
    }

    #[test]
    fn test_wildcard_matches_lowercased_tokens() {
        assert!(check(json!({"wildcard": {"source.name": "cloud*"}})));
        assert!(check(json!({"wildcard": {"title": {"value": "blo?"}}})));
        assert!(!check(json!({"wildcard": {"title": "cloud*"}})));
    }

    #[test]
    fn test_wildcard_pattern_case() {
        assert!(!check(json!({"wildcard": {"source.name": "Ama*"}})));
        assert!(check(json!({
            "wildcard": {"source.name": {"value": "AMA*", "case_insensitive": true}}
        })));
        assert!(check(json!({
            "wildcard": {"source.name.keyword": {"value": "amazon*", "case_insensitive": true}}
        })));
        assert!(!check(json!({"prefix": {"title": "Blo"}})));
        assert!(check(json!({"prefix": {"title": {"value": "Blo", "case_insensitive": true}}})));
    }

    #[test]
    fn test_keyword_subfield_matches_whole_value() {
        assert!(check(json!({"wildcard": {"source.name.keyword": "Amazon*"}})));
        assert!(!check(json!({"wildcard": {"source.name.keyword": "Cloud*"}})));
        assert!(!check(json!({"wildcard": {"source.name.keyword": "amazon*"}})));
    }

    #[test]
    fn test_prefix_and_exists() {
        assert!(check(json!({"prefix": {"tags": "server"}})));
        assert!(check(json!({"exists": {"field": "source.name"}})));
        assert!(!check(json!({"exists": {"field": "missing"}})));
    }

    #[test]
    fn test_range() {
        assert!(check(json!({"range": {"key": {"gte": 2, "lt": 5}}})));
        assert!(!check(json!({"range": {"key": {"gt": 4}}})));
        assert!(check(json!({"range": {"created_at": {"gte": "2021-04-01"}}})));
    }

    #[test]
    fn test_bool_should_with_must() {
        let query = json!({
            "bool": {
                "must": [
                    {"term": {"is_active": true}},
                    {"bool": {"should": [
                        {"wildcard": {"title": "nope*"}},
                        {"wildcard": {"source.name": "amaz*"}}
                    ], "minimum_should_match": 1}}
                ]
            }
        });
        assert!(check(query));
    }

    #[test]
    fn test_bool_should_without_required_needs_one() {
        assert!(!check(json!({"bool": {"should": [{"term": {"key": 9}}]}})));
        assert!(check(
            json!({"bool": {"filter": {"term": {"key": 4}}, "should": [{"term": {"key": 9}}]}})
        ));
        assert!(!check(json!({"bool": {"must_not": {"term": {"key": 4}}}})));
    }

    #[test]
    fn test_ids() {
        assert!(check(json!({"ids": {"values": ["1", "4"]}})));
        assert!(!check(json!({"ids": {"values": ["1"]}})));
    }

    #[test]
    fn test_malformed_queries_rejected() {
        let doc = blog();
        assert!(matches(&json!({"fuzzy_magic": {}}), "4", &doc).is_err());
        assert!(matches(&json!({}), "4", &doc).is_err());
        assert!(matches(&json!("match_all"), "4", &doc).is_err());
        assert!(matches(&json!({"bool": {"sometimes": []}}), "4", &doc).is_err());
        assert!(matches(&json!({"term": {"a": 1, "b": 2}}), "4", &doc).is_err());
    }

    #[test]
    fn test_glob_match() {
        let m = |p: &str, t: &str| {
            glob_match(
                &p.chars().collect::<Vec<_>>(),
                &t.chars().collect::<Vec<_>>(),
            )
        };
        assert!(m("clo*", "cloud"));
        assert!(m("*ud", "cloud"));
        assert!(m("c*o*d", "cloud"));
        assert!(m("*", ""));
        assert!(!m("cloud*", "clo"));
        assert!(!m("c?d", "cloud"));
    }

    #[test]
    fn test_compare_values() {
        assert_eq!(compare_values(&json!(2), &json!(10)), Ordering::Less);
        assert_eq!(compare_values(&json!("b"), &json!("a")), Ordering::Greater);
        assert_eq!(compare_values(&json!("3"), &json!(3)), Ordering::Equal);
    }
}
