//! Embedded search engine.
//!
//! [`InMemoryEngine`] keeps every index in process memory and answers the
//! subset of the Elasticsearch query DSL the gateway emits (see [`dsl`]).
//! Writes are visible to search immediately, so `refresh` only checks that the
//! index exists. Responses mirror the engine's JSON shapes so the gateway's
//! normalization runs unchanged against either backend.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use helios_search_gateway::engine::memory::InMemoryEngine;
//! use helios_search_gateway::{IndexRegistry, SearchGateway};
//!
//! # async fn example() -> Result<(), helios_search_gateway::GatewayError> {
//! let engine = Arc::new(InMemoryEngine::new());
//! let registry = Arc::new(IndexRegistry::builtin());
//! let gateway = SearchGateway::open(engine, registry, "blog-index", None).await?;
//! # Ok(())
//! # }
//! ```

mod dsl;

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering as AtomicOrdering};

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::{Map, Value, json};
use tracing::debug;

use crate::engine::{IndexCreation, SearchEngine};
use crate::error::{BackendError, DocumentError, GatewayResult, IndexError};
use crate::types::{
    BulkItem, BulkItemOutcome, BulkResult, Document, SortDirection, WriteOutcome, WriteResult,
};

const BACKEND_NAME: &str = "memory";
const DEFAULT_SEARCH_SIZE: usize = 10;

#[derive(Debug, Clone)]
struct StoredDocument {
    source: Document,
    version: u64,
    seq: u64,
}

#[derive(Debug, Default)]
struct MemoryIndex {
    definition: Value,
    documents: HashMap<String, StoredDocument>,
}

impl MemoryIndex {
    fn with_definition(definition: Value) -> Self {
        Self {
            definition,
            documents: HashMap::new(),
        }
    }

    /// Documents in insertion order.
    fn ordered(&self) -> Vec<(&String, &StoredDocument)> {
        let mut docs: Vec<_> = self.documents.iter().collect();
        docs.sort_by_key(|(_, doc)| doc.seq);
        docs
    }
}

/// In-process search engine.
#[derive(Debug, Default)]
pub struct InMemoryEngine {
    indices: RwLock<HashMap<String, MemoryIndex>>,
    next_seq: AtomicU64,
    unavailable: AtomicBool,
}

impl InMemoryEngine {
    /// Creates an empty engine.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent operation fail with `BackendError::Unavailable`
    /// (or restores normal operation).
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, AtomicOrdering::SeqCst);
    }

    /// Returns true if `index` exists.
    pub fn index_exists(&self, index: &str) -> bool {
        self.indices.read().contains_key(index)
    }

    /// Returns the body `index` was created with.
    pub fn index_definition(&self, index: &str) -> Option<Value> {
        self.indices
            .read()
            .get(index)
            .map(|idx| idx.definition.clone())
    }

    /// Returns the number of documents stored in `index`.
    pub fn document_count(&self, index: &str) -> usize {
        self.indices
            .read()
            .get(index)
            .map_or(0, |idx| idx.documents.len())
    }

    fn ensure_available(&self) -> GatewayResult<()> {
        if self.unavailable.load(AtomicOrdering::SeqCst) {
            return Err(BackendError::Unavailable {
                backend_name: BACKEND_NAME.to_string(),
                message: "engine marked unavailable".to_string(),
            }
            .into());
        }
        Ok(())
    }

    fn next_seq(&self) -> u64 {
        self.next_seq.fetch_add(1, AtomicOrdering::Relaxed)
    }

    /// Inserts a new document, auto-creating the index. Returns false on conflict.
    fn insert_new(&self, index: &str, id: &str, source: &Document) -> bool {
        let seq = self.next_seq();
        let mut indices = self.indices.write();
        let idx = indices
            .entry(index.to_string())
            .or_insert_with(|| MemoryIndex::with_definition(json!({})));
        if idx.documents.contains_key(id) {
            return false;
        }
        idx.documents.insert(
            id.to_string(),
            StoredDocument {
                source: source.clone(),
                version: 1,
                seq,
            },
        );
        true
    }
}

#[async_trait]
impl SearchEngine for InMemoryEngine {
    fn name(&self) -> &'static str {
        BACKEND_NAME
    }

    async fn create_index(&self, index: &str, body: &Value) -> GatewayResult<IndexCreation> {
        self.ensure_available()?;

        let sections = body.as_object().ok_or_else(|| IndexError::CreationFailed {
            index: index.to_string(),
            message: "request body must be an object".to_string(),
        })?;
        if let Some(unknown) = sections
            .keys()
            .find(|k| !matches!(k.as_str(), "settings" | "mappings" | "aliases"))
        {
            return Err(IndexError::CreationFailed {
                index: index.to_string(),
                message: format!("unknown key [{}] for create index", unknown),
            }
            .into());
        }

        let mut indices = self.indices.write();
        if indices.contains_key(index) {
            return Ok(IndexCreation::AlreadyExists);
        }
        indices.insert(index.to_string(), MemoryIndex::with_definition(body.clone()));
        debug!(index = %index, "Created in-memory index");
        Ok(IndexCreation::Created)
    }

    async fn get_document(&self, index: &str, id: &str) -> GatewayResult<Option<Document>> {
        self.ensure_available()?;
        Ok(self
            .indices
            .read()
            .get(index)
            .and_then(|idx| idx.documents.get(id))
            .map(|doc| doc.source.clone()))
    }

    async fn create_document(
        &self,
        index: &str,
        id: &str,
        document: &Document,
    ) -> GatewayResult<WriteResult> {
        self.ensure_available()?;
        if !self.insert_new(index, id, document) {
            return Err(DocumentError::AlreadyExists {
                index: index.to_string(),
                id: id.to_string(),
            }
            .into());
        }
        Ok(WriteResult::new(index, id, Some(1), WriteOutcome::Created))
    }

    async fn update_document(
        &self,
        index: &str,
        id: &str,
        partial: &Document,
    ) -> GatewayResult<WriteResult> {
        self.ensure_available()?;
        let mut indices = self.indices.write();
        let stored = indices
            .get_mut(index)
            .and_then(|idx| idx.documents.get_mut(id))
            .ok_or_else(|| DocumentError::NotFound {
                index: index.to_string(),
                id: id.to_string(),
            })?;

        let mut merged = stored.source.clone();
        merge_into(&mut merged, partial);
        if merged == stored.source {
            return Ok(WriteResult::new(
                index,
                id,
                Some(stored.version),
                WriteOutcome::Noop,
            ));
        }

        stored.source = merged;
        stored.version += 1;
        Ok(WriteResult::new(
            index,
            id,
            Some(stored.version),
            WriteOutcome::Updated,
        ))
    }

    async fn delete_document(&self, index: &str, id: &str) -> GatewayResult<WriteResult> {
        self.ensure_available()?;
        let mut indices = self.indices.write();
        let removed = indices
            .get_mut(index)
            .and_then(|idx| idx.documents.remove(id))
            .ok_or_else(|| DocumentError::NotFound {
                index: index.to_string(),
                id: id.to_string(),
            })?;
        Ok(WriteResult::new(
            index,
            id,
            Some(removed.version + 1),
            WriteOutcome::Deleted,
        ))
    }

    async fn bulk_create(&self, index: &str, items: &[BulkItem]) -> GatewayResult<BulkResult> {
        self.ensure_available()?;
        let outcomes = items
            .iter()
            .map(|item| {
                if self.insert_new(index, &item.id, &item.source) {
                    BulkItemOutcome::created(&item.id)
                } else {
                    BulkItemOutcome::failed(
                        &item.id,
                        409,
                        "version_conflict_engine_exception",
                        format!("[{}]: version conflict, document already exists", item.id),
                    )
                }
            })
            .collect();
        Ok(BulkResult::from_items(outcomes))
    }

    async fn search(&self, index: &str, body: &Value) -> GatewayResult<Value> {
        self.ensure_available()?;
        let request = SearchRequest::parse(body).map_err(query_error)?;

        let indices = self.indices.read();
        let idx = indices
            .get(index)
            .ok_or_else(|| query_error(format!("no such index [{}]", index)))?;

        let mut hits = Vec::new();
        for (id, doc) in idx.ordered() {
            if dsl::matches(&request.query, id, &doc.source).map_err(query_error)? {
                hits.push((id, doc));
            }
        }

        if !request.sort.is_empty() {
            hits.sort_by(|(_, a), (_, b)| compare_by(&request.sort, &a.source, &b.source));
        }

        let total = hits.len();
        let page: Vec<Value> = hits
            .into_iter()
            .skip(request.from)
            .take(request.size)
            .map(|(id, doc)| {
                json!({
                    "_index": index,
                    "_id": id,
                    "_score": 1.0,
                    "_source": doc.source,
                })
            })
            .collect();

        debug!(index = %index, total, returned = page.len(), "In-memory search");

        Ok(json!({
            "took": 0,
            "timed_out": false,
            "hits": {
                "total": { "value": total, "relation": "eq" },
                "max_score": null,
                "hits": page,
            }
        }))
    }

    async fn refresh(&self, index: &str) -> GatewayResult<()> {
        self.ensure_available()?;
        if !self.index_exists(index) {
            return Err(BackendError::Internal {
                backend_name: BACKEND_NAME.to_string(),
                message: format!("cannot refresh, no such index [{}]", index),
                source: None,
            }
            .into());
        }
        Ok(())
    }

    async fn health_check(&self) -> GatewayResult<()> {
        self.ensure_available()
    }
}

fn query_error(message: String) -> crate::error::GatewayError {
    BackendError::QueryError { message }.into()
}

/// Recursive merge of `partial` into `target`, as a partial-document update does.
fn merge_into(target: &mut Map<String, Value>, partial: &Map<String, Value>) {
    for (key, value) in partial {
        match (target.get_mut(key), value) {
            (Some(Value::Object(existing)), Value::Object(incoming)) => {
                merge_into(existing, incoming);
            }
            _ => {
                target.insert(key.clone(), value.clone());
            }
        }
    }
}

#[derive(Debug)]
struct SortKey {
    field: String,
    descending: bool,
}

#[derive(Debug)]
struct SearchRequest {
    query: Value,
    from: usize,
    size: usize,
    sort: Vec<SortKey>,
}

impl SearchRequest {
    fn parse(body: &Value) -> Result<Self, String> {
        let body = body
            .as_object()
            .ok_or_else(|| "search request body must be an object".to_string())?;

        for key in body.keys() {
            if !matches!(
                key.as_str(),
                "query" | "from" | "size" | "sort" | "track_total_hits" | "_source"
            ) {
                return Err(format!("unknown key [{}] in search request", key));
            }
        }

        let query = body
            .get("query")
            .cloned()
            .unwrap_or_else(|| json!({ "match_all": {} }));
        let from = usize_param(body, "from")?.unwrap_or(0);
        let size = usize_param(body, "size")?.unwrap_or(DEFAULT_SEARCH_SIZE);
        let sort = match body.get("sort") {
            None => Vec::new(),
            Some(Value::Array(clauses)) => clauses
                .iter()
                .map(parse_sort_clause)
                .collect::<Result<_, _>>()?,
            Some(clause) => vec![parse_sort_clause(clause)?],
        };

        Ok(Self {
            query,
            from,
            size,
            sort,
        })
    }
}

fn usize_param(body: &Map<String, Value>, key: &str) -> Result<Option<usize>, String> {
    match body.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value
            .as_u64()
            .map(|n| Some(n as usize))
            .ok_or_else(|| format!("[{}] must be a non-negative integer", key)),
    }
}

/// Accepts `"field"`, `{"field": "asc"}` and `{"field": {"order": "asc"}}`.
fn parse_sort_clause(clause: &Value) -> Result<SortKey, String> {
    let parse_order = |order: &str| match SortDirection::parse(order) {
        Some(direction) => Ok(direction == SortDirection::Descending),
        None => Err(format!("unknown sort order [{}]", order)),
    };

    match clause {
        Value::String(field) => Ok(SortKey {
            field: field.clone(),
            descending: false,
        }),
        Value::Object(map) if map.len() == 1 => {
            let (field, spec) = map
                .iter()
                .next()
                .ok_or_else(|| "empty sort clause".to_string())?;
            let descending = match spec {
                Value::String(order) => parse_order(order)?,
                Value::Object(opts) => match opts.get("order").and_then(Value::as_str) {
                    Some(order) => parse_order(order)?,
                    None => false,
                },
                other => return Err(format!("malformed sort clause [{}]", other)),
            };
            Ok(SortKey {
                field: field.clone(),
                descending,
            })
        }
        other => Err(format!("malformed sort clause [{}]", other)),
    }
}

/// Missing values sort last in either direction; ties keep insertion order.
fn compare_by(keys: &[SortKey], a: &Document, b: &Document) -> Ordering {
    for key in keys {
        let left = dsl::field_values(a, &key.field).into_iter().next();
        let right = dsl::field_values(b, &key.field).into_iter().next();
        let ord = match (left, right) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Greater,
            (Some(_), None) => Ordering::Less,
            (Some(l), Some(r)) => {
                let ord = dsl::compare_values(l, r);
                if key.descending { ord.reverse() } else { ord }
            }
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    Ordering::Equal
}
