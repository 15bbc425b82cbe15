//! Search engine capabilities.
//!
//! The gateway talks to its backend exclusively through [`SearchEngine`], which
//! exposes the handful of operations the gateway needs: index creation,
//! single-document reads and writes, bulk creation and search over a structured
//! query body. Implementations:
//!
//! - [`elasticsearch::ElasticsearchEngine`] (feature `elasticsearch`): the real
//!   backend over HTTP.
//! - [`memory::InMemoryEngine`]: an embedded engine evaluating the subset of the
//!   query DSL the gateway emits. Used for tests and local development.
//!
//! Search responses are returned in the engine's raw shape
//! (`{"hits": {"total": ..., "hits": [...]}}`); the gateway normalizes them.

#[cfg(feature = "elasticsearch")]
pub mod elasticsearch;
pub mod memory;

use std::fmt::Debug;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::GatewayResult;
use crate::types::{BulkItem, BulkResult, Document, WriteResult};

/// Outcome of an index creation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexCreation {
    /// The index was created.
    Created,
    /// An index with this name already existed; nothing was changed.
    AlreadyExists,
}

/// The operations a search backend provides to the gateway.
///
/// Error contract:
/// - `get_document` returns `Ok(None)` for a missing document.
/// - `create_document` fails with `DocumentError::AlreadyExists` on an existing id.
/// - `update_document` and `delete_document` fail with `DocumentError::NotFound`.
/// - `create_index` reports an existing index as [`IndexCreation::AlreadyExists`]
///   and any other rejection as `IndexError::CreationFailed`.
/// - `search` fails with `BackendError::QueryError` for malformed queries.
/// - `bulk_create` reports per-item failures in the [`BulkResult`] and only
///   fails as a whole when the request itself could not be executed.
#[async_trait]
pub trait SearchEngine: Send + Sync + Debug {
    /// Returns a short name for this backend, used in logs and errors.
    fn name(&self) -> &'static str;

    /// Creates an index from a `{"settings": ..., "mappings": ...}` body.
    async fn create_index(&self, index: &str, body: &Value) -> GatewayResult<IndexCreation>;

    /// Fetches a document body by id.
    async fn get_document(&self, index: &str, id: &str) -> GatewayResult<Option<Document>>;

    /// Creates a document; fails if the id is taken.
    async fn create_document(
        &self,
        index: &str,
        id: &str,
        document: &Document,
    ) -> GatewayResult<WriteResult>;

    /// Merges `partial` into an existing document.
    async fn update_document(
        &self,
        index: &str,
        id: &str,
        partial: &Document,
    ) -> GatewayResult<WriteResult>;

    /// Deletes a document by id.
    async fn delete_document(&self, index: &str, id: &str) -> GatewayResult<WriteResult>;

    /// Creates many documents in a single round trip.
    async fn bulk_create(&self, index: &str, items: &[BulkItem]) -> GatewayResult<BulkResult>;

    /// Executes a search request body and returns the raw response.
    async fn search(&self, index: &str, body: &Value) -> GatewayResult<Value>;

    /// Makes recent writes visible to search.
    async fn refresh(&self, index: &str) -> GatewayResult<()>;

    /// Checks that the backend is reachable and healthy.
    async fn health_check(&self) -> GatewayResult<()>;
}
