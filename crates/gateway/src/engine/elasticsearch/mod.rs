//! Elasticsearch engine.
//!
//! Talks to a single Elasticsearch node over HTTP using the official
//! `elasticsearch` client. Status codes are mapped onto the gateway's error
//! taxonomy:
//!
//! | Request | Status | Result |
//! |---------|--------|--------|
//! | `PUT /{index}` | 400 `resource_already_exists_exception` | `IndexCreation::AlreadyExists` |
//! | `GET /{index}/_doc/{id}` | 404 | `Ok(None)` |
//! | `PUT /{index}/_create/{id}` | 409 | `DocumentError::AlreadyExists` |
//! | `POST /{index}/_update/{id}` | 404 | `DocumentError::NotFound` |
//! | `DELETE /{index}/_doc/{id}` | 404 | `DocumentError::NotFound` |
//! | `POST /{index}/_search` | any error | `BackendError::QueryError` |
//!
//! # Example
//!
//! ```ignore
//! use helios_search_gateway::engine::elasticsearch::{ElasticsearchConfig, ElasticsearchEngine};
//!
//! let engine = ElasticsearchEngine::new(ElasticsearchConfig::with_host("http://localhost:9200"))?;
//! engine.health_check().await?;
//! ```

mod backend;
mod config;

pub use backend::ElasticsearchEngine;
pub use config::{
    ES_HOST_VAR, ES_PASSWORD_VAR, ES_REQUEST_TIMEOUT_VAR, ES_USERNAME_VAR, ElasticsearchAuth,
    ElasticsearchConfig,
};
