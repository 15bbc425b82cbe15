//! The index-bound search gateway.
//!
//! A [`SearchGateway`] is bound to a single index for its whole life. Opening
//! it issues one idempotent create-index request; after that each operation
//! performs exactly one engine round trip and never retries.

mod query_builder;
mod response;

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::engine::{IndexCreation, SearchEngine};
use crate::error::{DocumentError, GatewayResult};
use crate::registry::{IndexConfiguration, IndexRegistry};
use crate::types::{
    BulkItem, BulkItemOutcome, BulkResult, Document, QueryRequest, QueryResult, WriteResult,
    resolve_document_id,
};

use query_builder::QueryBuilder;

/// Error type reported for bulk items rejected before submission.
pub const VALIDATION_ERROR_TYPE: &str = "validation_error";

/// Document gateway bound to one index.
///
/// Cheap to clone; clones share the engine handle and configuration.
#[derive(Debug, Clone)]
pub struct SearchGateway {
    index: String,
    engine: Arc<dyn SearchEngine>,
    config: Arc<IndexConfiguration>,
}

impl SearchGateway {
    /// Opens a gateway for `index`, creating the index if needed.
    ///
    /// `creation_body` is the `{"settings": ..., "mappings": ...}` body used to
    /// create the index; `None` uses the registry's configuration (an empty body
    /// for unregistered indices). An index that already exists is left as is.
    /// Any other creation failure is returned.
    pub async fn open(
        engine: Arc<dyn SearchEngine>,
        registry: Arc<IndexRegistry>,
        index: impl Into<String>,
        creation_body: Option<&Value>,
    ) -> GatewayResult<Self> {
        let index = index.into();
        let mut config = registry.resolve(&index).into_owned();

        let body = match creation_body {
            Some(body) => {
                if let Some(mappings) = body.get("mappings") {
                    config.mappings = mappings.clone();
                }
                body.clone()
            }
            None => config.creation_body(),
        };

        match engine.create_index(&index, &body).await? {
            IndexCreation::Created => {
                info!(index = %index, backend = engine.name(), "Created index");
            }
            IndexCreation::AlreadyExists => {
                debug!(index = %index, backend = engine.name(), "Index already exists");
            }
        }

        Ok(Self {
            index,
            engine,
            config: Arc::new(config),
        })
    }

    /// Returns the bound index name.
    pub fn index(&self) -> &str {
        &self.index
    }

    /// Returns the configuration queries and validation run against.
    pub fn config(&self) -> &IndexConfiguration {
        &self.config
    }

    /// Fetches a document by key. Returns `None` if it does not exist.
    pub async fn get(&self, key: &str) -> GatewayResult<Option<Document>> {
        self.engine.get_document(&self.index, key).await
    }

    /// Creates a document. Its id is its `key`, or a fresh UUID when it has none.
    ///
    /// Fails with `DocumentError::AlreadyExists` if the id is taken.
    pub async fn add(&self, document: Document) -> GatewayResult<WriteResult> {
        self.config.validate_document(&document)?;
        let id = resolve_document_id(&document);
        debug!(index = %self.index, id = %id, "Adding document");
        self.engine
            .create_document(&self.index, &id, &document)
            .await
    }

    /// Creates many documents in one round trip.
    ///
    /// Documents that fail validation are not sent; they are reported as failed
    /// items with status 400. Outcomes follow submission order.
    pub async fn bulk_create<I>(&self, documents: I) -> GatewayResult<BulkResult>
    where
        I: IntoIterator<Item = Document>,
    {
        let mut slots: Vec<Option<BulkItemOutcome>> = Vec::new();
        let mut batch: Vec<BulkItem> = Vec::new();

        for document in documents {
            let id = resolve_document_id(&document);
            match self.config.validate_document(&document) {
                Ok(()) => {
                    slots.push(None);
                    batch.push(BulkItem::new(id, document));
                }
                Err(err) => {
                    slots.push(Some(BulkItemOutcome::failed(
                        id,
                        400,
                        VALIDATION_ERROR_TYPE,
                        err.to_string(),
                    )));
                }
            }
        }

        if slots.is_empty() {
            return Ok(BulkResult::default());
        }

        let mut sent = if batch.is_empty() {
            Vec::new()
        } else {
            self.engine.bulk_create(&self.index, &batch).await?.items
        }
        .into_iter();
        let mut batch = batch.iter();

        let items: Vec<BulkItemOutcome> = slots
            .into_iter()
            .map(|slot| match slot {
                Some(rejected) => rejected,
                None => {
                    let id = batch.next().map(|item| item.id.as_str()).unwrap_or_default();
                    sent.next().unwrap_or_else(|| {
                        BulkItemOutcome::failed(
                            id,
                            500,
                            "missing_item",
                            "engine returned no outcome for this document",
                        )
                    })
                }
            })
            .collect();

        let result = BulkResult::from_items(items);
        if result.has_failures() {
            warn!(
                index = %self.index,
                successful = result.successful,
                failed = result.failed,
                "Bulk create had failures"
            );
        } else {
            debug!(index = %self.index, successful = result.successful, "Bulk create");
        }
        Ok(result)
    }

    /// Merges `partial` into the document with `key`.
    ///
    /// Fails with `DocumentError::NotFound` if it does not exist.
    pub async fn update(&self, key: &str, partial: Document) -> GatewayResult<WriteResult> {
        self.config.validate_document(&partial)?;
        self.engine
            .update_document(&self.index, key, &partial)
            .await
    }

    /// Deletes the document with `key`.
    ///
    /// Fails with `DocumentError::NotFound` if it does not exist; any other
    /// failure is reported as `DocumentError::DeleteFailed`.
    pub async fn delete(&self, key: &str) -> GatewayResult<WriteResult> {
        match self.engine.delete_document(&self.index, key).await {
            Ok(result) => Ok(result),
            Err(err) if err.is_not_found() => Err(err),
            Err(err) => {
                warn!(index = %self.index, id = %key, error = %err, "Delete failed");
                Err(DocumentError::DeleteFailed {
                    index: self.index.clone(),
                    id: key.to_string(),
                    source: Box::new(err),
                }
                .into())
            }
        }
    }

    /// Runs a paginated, optionally sorted and searched query.
    pub async fn query(&self, request: &QueryRequest) -> GatewayResult<QueryResult> {
        let body = QueryBuilder::new(&self.config).build(request);
        debug!(index = %self.index, body = %body, "Executing search");
        let raw = self.engine.search(&self.index, &body).await?;
        response::normalize(&raw, request)
    }

    /// Makes recent writes visible to search.
    pub async fn refresh(&self) -> GatewayResult<()> {
        self.engine.refresh(&self.index).await
    }
}
