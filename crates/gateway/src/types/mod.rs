//! Core types for documents, queries and write results.

mod bulk;
mod document;
mod query;

pub use bulk::{BulkItem, BulkItemError, BulkItemOutcome, BulkResult};
pub use document::{
    Document, KEY_FIELD, WriteOutcome, WriteResult, document_key, resolve_document_id,
};
pub use query::{
    DEFAULT_PAGE, DEFAULT_PAGE_SIZE, QueryRequest, QueryResult, SortDirection,
};
