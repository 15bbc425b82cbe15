//! Helios Search Gateway
//!
//! An index-bound document gateway over a search engine. A gateway manages the
//! lifecycle of one index, performs single and bulk document writes, and turns
//! high-level query parameters (page, sort alias, free-text term) into a
//! structured engine query whose response is normalized into a small result
//! envelope.
//!
//! # Backend Features
//!
//! - `elasticsearch` (default) - the Elasticsearch engine over HTTP
//!
//! The embedded [`engine::memory::InMemoryEngine`] is always available.
//!
//! # Architecture
//!
//! - [`registry`] - per-index configuration: sort aliases, searchable fields,
//!   settings and mappings
//! - [`engine`] - the [`SearchEngine`] capability and its implementations
//! - [`gateway`] - the [`SearchGateway`]: CRUD, bulk writes and queries
//! - [`types`] - documents, query requests and write/bulk results
//! - [`error`] - error types for all operations
//!
//! # Quick Start
//!
//! ```
//! use std::sync::Arc;
//! use helios_search_gateway::engine::memory::InMemoryEngine;
//! use helios_search_gateway::registry::{BLOG_INDEX, sample_documents};
//! use helios_search_gateway::{IndexRegistry, QueryRequest, SearchGateway, SortDirection};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), helios_search_gateway::GatewayError> {
//! let gateway = SearchGateway::open(
//!     Arc::new(InMemoryEngine::new()),
//!     Arc::new(IndexRegistry::builtin()),
//!     BLOG_INDEX,
//!     None,
//! )
//! .await?;
//!
//! let bulk = gateway.bulk_create(sample_documents()).await?;
//! assert_eq!(bulk.successful, 5);
//!
//! let request = QueryRequest::new()
//!     .with_page(1, 2)
//!     .with_sort("key", SortDirection::Ascending);
//! let page = gateway.query(&request).await?;
//! assert_eq!(page.total_count, 5);
//! assert_eq!(page.items[0]["key"], 1);
//! assert_eq!(page.next_page, Some(2));
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod engine;
pub mod error;
pub mod gateway;
pub mod registry;
pub mod types;

// Re-export commonly used types at crate root
pub use engine::{IndexCreation, SearchEngine};
pub use error::{GatewayError, GatewayResult};
pub use gateway::SearchGateway;
pub use registry::{IndexConfiguration, IndexRegistry};
pub use types::{
    BulkResult, Document, QueryRequest, QueryResult, SortDirection, WriteOutcome, WriteResult,
};
