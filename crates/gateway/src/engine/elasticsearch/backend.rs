//! Elasticsearch engine implementation.

use std::fmt::Debug;
use std::time::Duration;

use async_trait::async_trait;
use elasticsearch::auth::Credentials;
use elasticsearch::cert::CertificateValidation;
use elasticsearch::cluster::ClusterHealthParts;
use elasticsearch::http::request::JsonBody;
use elasticsearch::http::response::Response;
use elasticsearch::http::transport::{SingleNodeConnectionPool, TransportBuilder};
use elasticsearch::indices::{IndicesCreateParts, IndicesRefreshParts};
use elasticsearch::{
    BulkParts, CreateParts, DeleteParts, Elasticsearch, GetParts, SearchParts, UpdateParts,
};
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::engine::{IndexCreation, SearchEngine};
use crate::error::{BackendError, DocumentError, GatewayError, GatewayResult, IndexError};
use crate::types::{BulkItem, BulkItemOutcome, BulkResult, Document, WriteResult};

use super::config::{ElasticsearchAuth, ElasticsearchConfig};

const BACKEND_NAME: &str = "elasticsearch";

fn internal_error(message: String) -> GatewayError {
    GatewayError::Backend(BackendError::Internal {
        backend_name: BACKEND_NAME.to_string(),
        message,
        source: None,
    })
}

fn transport_error(action: &str, err: elasticsearch::Error) -> GatewayError {
    GatewayError::Backend(BackendError::ConnectionFailed {
        backend_name: BACKEND_NAME.to_string(),
        message: format!("Failed to {}: {}", action, err),
    })
}

/// Extracts `error.type` and `error.reason` from an error response body.
fn error_details(body: &str) -> (String, String) {
    let parsed: Option<Value> = serde_json::from_str(body).ok();
    let error = parsed.as_ref().and_then(|v| v.get("error"));
    let error_type = error
        .and_then(|e| e.get("type"))
        .and_then(Value::as_str)
        .unwrap_or("unknown")
        .to_string();
    let reason = error
        .and_then(|e| e.get("reason"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| body.to_string());
    (error_type, reason)
}

/// Elasticsearch engine.
///
/// Each trait operation maps to exactly one HTTP request; there is no retry.
/// An engine built without a host logs a warning and fails every operation
/// with `BackendError::ConnectionFailed`.
pub struct ElasticsearchEngine {
    client: Option<Elasticsearch>,
    config: ElasticsearchConfig,
}

impl Debug for ElasticsearchEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ElasticsearchEngine")
            .field("host", &self.config.host)
            .field("request_timeout_ms", &self.config.request_timeout_ms)
            .field("connected", &self.client.is_some())
            .finish_non_exhaustive()
    }
}

impl ElasticsearchEngine {
    /// Creates an engine from the given configuration.
    ///
    /// Fails only when a configured host is not a valid URL or the transport
    /// cannot be built.
    pub fn new(config: ElasticsearchConfig) -> GatewayResult<Self> {
        let client = match config.host.as_deref() {
            Some(host) => Some(Self::build_client(host, &config)?),
            None => {
                warn!("No Elasticsearch host configured; operations will fail");
                None
            }
        };
        Ok(Self { client, config })
    }

    /// Creates an engine from the `ES_*` environment variables.
    pub fn from_env() -> GatewayResult<Self> {
        Self::new(ElasticsearchConfig::from_env())
    }

    fn build_client(host: &str, config: &ElasticsearchConfig) -> GatewayResult<Elasticsearch> {
        let parsed_url: elasticsearch::http::Url = host.parse().map_err(|e| {
            GatewayError::Backend(BackendError::ConnectionFailed {
                backend_name: BACKEND_NAME.to_string(),
                message: format!("Invalid URL '{}': {}", host, e),
            })
        })?;

        let conn_pool = SingleNodeConnectionPool::new(parsed_url);

        let mut builder = TransportBuilder::new(conn_pool)
            .timeout(Duration::from_millis(config.request_timeout_ms));

        if config.disable_certificate_validation {
            builder = builder.cert_validation(CertificateValidation::None);
        }

        if let Some(ref auth) = config.auth {
            builder = match auth {
                ElasticsearchAuth::Basic { username, password } => {
                    builder.auth(Credentials::Basic(username.clone(), password.clone()))
                }
                ElasticsearchAuth::Bearer { token } => {
                    builder.auth(Credentials::Bearer(token.clone()))
                }
            };
        }

        let transport = builder.build().map_err(|e| {
            GatewayError::Backend(BackendError::ConnectionFailed {
                backend_name: BACKEND_NAME.to_string(),
                message: format!("Failed to build transport: {}", e),
            })
        })?;

        Ok(Elasticsearch::new(transport))
    }

    /// Returns the engine configuration.
    pub fn config(&self) -> &ElasticsearchConfig {
        &self.config
    }

    /// Returns true if a host is configured.
    pub fn is_configured(&self) -> bool {
        self.client.is_some()
    }

    fn client(&self) -> GatewayResult<&Elasticsearch> {
        self.client.as_ref().ok_or_else(|| {
            GatewayError::Backend(BackendError::ConnectionFailed {
                backend_name: BACKEND_NAME.to_string(),
                message: "no Elasticsearch host configured (ES_HOST)".to_string(),
            })
        })
    }

    async fn write_result(response: Response, action: &str) -> GatewayResult<WriteResult> {
        response
            .json::<WriteResult>()
            .await
            .map_err(|e| internal_error(format!("Failed to parse {} response: {}", action, e)))
    }
}

#[async_trait]
impl SearchEngine for ElasticsearchEngine {
    fn name(&self) -> &'static str {
        BACKEND_NAME
    }

    async fn create_index(&self, index: &str, body: &Value) -> GatewayResult<IndexCreation> {
        let response = self
            .client()?
            .indices()
            .create(IndicesCreateParts::Index(index))
            .body(body.clone())
            .send()
            .await
            .map_err(|e| transport_error("create index", e))?;

        let status = response.status_code();
        if status.is_success() {
            debug!(index = %index, "Created Elasticsearch index");
            return Ok(IndexCreation::Created);
        }

        let body = response.text().await.unwrap_or_default();
        if body.contains("resource_already_exists_exception") {
            return Ok(IndexCreation::AlreadyExists);
        }
        let (error_type, reason) = error_details(&body);
        Err(IndexError::CreationFailed {
            index: index.to_string(),
            message: format!("status {} ({}): {}", status, error_type, reason),
        }
        .into())
    }

    async fn get_document(&self, index: &str, id: &str) -> GatewayResult<Option<Document>> {
        let response = self
            .client()?
            .get(GetParts::IndexId(index, id))
            .send()
            .await
            .map_err(|e| transport_error("get document", e))?;

        let status = response.status_code();
        if status.as_u16() == 404 {
            return Ok(None);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(internal_error(format!(
                "Failed to get document (status {}): {}",
                status, body
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| internal_error(format!("Failed to parse ES response: {}", e)))?;

        match body.get("_source") {
            Some(Value::Object(source)) => Ok(Some(source.clone())),
            _ => Ok(None),
        }
    }

    async fn create_document(
        &self,
        index: &str,
        id: &str,
        document: &Document,
    ) -> GatewayResult<WriteResult> {
        let response = self
            .client()?
            .create(CreateParts::IndexId(index, id))
            .body(document)
            .send()
            .await
            .map_err(|e| transport_error("create document", e))?;

        let status = response.status_code();
        if status.as_u16() == 409 {
            return Err(DocumentError::AlreadyExists {
                index: index.to_string(),
                id: id.to_string(),
            }
            .into());
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(internal_error(format!(
                "Failed to create document (status {}): {}",
                status, body
            )));
        }

        Self::write_result(response, "create").await
    }

    async fn update_document(
        &self,
        index: &str,
        id: &str,
        partial: &Document,
    ) -> GatewayResult<WriteResult> {
        let response = self
            .client()?
            .update(UpdateParts::IndexId(index, id))
            .body(json!({ "doc": partial }))
            .send()
            .await
            .map_err(|e| transport_error("update document", e))?;

        let status = response.status_code();
        if status.as_u16() == 404 {
            return Err(DocumentError::NotFound {
                index: index.to_string(),
                id: id.to_string(),
            }
            .into());
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(internal_error(format!(
                "Failed to update document (status {}): {}",
                status, body
            )));
        }

        Self::write_result(response, "update").await
    }

    async fn delete_document(&self, index: &str, id: &str) -> GatewayResult<WriteResult> {
        let response = self
            .client()?
            .delete(DeleteParts::IndexId(index, id))
            .send()
            .await
            .map_err(|e| transport_error("delete document", e))?;

        let status = response.status_code();
        if status.as_u16() == 404 {
            return Err(DocumentError::NotFound {
                index: index.to_string(),
                id: id.to_string(),
            }
            .into());
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(internal_error(format!(
                "Failed to delete document (status {}): {}",
                status, body
            )));
        }

        Self::write_result(response, "delete").await
    }

    async fn bulk_create(&self, index: &str, items: &[BulkItem]) -> GatewayResult<BulkResult> {
        let client = self.client()?;
        if items.is_empty() {
            return Ok(BulkResult::default());
        }

        let mut body: Vec<JsonBody<Value>> = Vec::with_capacity(items.len() * 2);
        for item in items {
            body.push(json!({ "create": { "_id": item.id } }).into());
            body.push(Value::Object(item.source.clone()).into());
        }

        let response = client
            .bulk(BulkParts::Index(index))
            .body(body)
            .send()
            .await
            .map_err(|e| transport_error("execute bulk request", e))?;

        let status = response.status_code();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(internal_error(format!(
                "Bulk request failed (status {}): {}",
                status, body
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| internal_error(format!("Failed to parse bulk response: {}", e)))?;

        Ok(parse_bulk_response(items, &body))
    }

    async fn search(&self, index: &str, body: &Value) -> GatewayResult<Value> {
        let response = self
            .client()?
            .search(SearchParts::Index(&[index]))
            .body(body.clone())
            .send()
            .await
            .map_err(|e| transport_error("execute search", e))?;

        if !response.status_code().is_success() {
            let status = response.status_code();
            let body = response.text().await.unwrap_or_default();
            let (error_type, reason) = error_details(&body);
            return Err(GatewayError::Backend(BackendError::QueryError {
                message: format!("status {} ({}): {}", status, error_type, reason),
            }));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| internal_error(format!("Failed to parse search response: {}", e)))
    }

    async fn refresh(&self, index: &str) -> GatewayResult<()> {
        let response = self
            .client()?
            .indices()
            .refresh(IndicesRefreshParts::Index(&[index]))
            .send()
            .await
            .map_err(|e| transport_error("refresh index", e))?;

        let status = response.status_code();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(internal_error(format!(
                "Failed to refresh index {} (status {}): {}",
                index, status, body
            )));
        }
        Ok(())
    }

    async fn health_check(&self) -> GatewayResult<()> {
        let response = self
            .client()?
            .cluster()
            .health(ClusterHealthParts::None)
            .send()
            .await
            .map_err(|e| BackendError::Unavailable {
                backend_name: BACKEND_NAME.to_string(),
                message: format!("Health check failed: {}", e),
            })?;

        let status = response.status_code();
        if !status.is_success() {
            return Err(BackendError::Unavailable {
                backend_name: BACKEND_NAME.to_string(),
                message: format!("Cluster health returned status {}", status),
            }
            .into());
        }

        let body = response
            .json::<Value>()
            .await
            .map_err(|e| internal_error(format!("Failed to parse health response: {}", e)))?;

        let cluster_status = body
            .get("status")
            .and_then(|s| s.as_str())
            .unwrap_or("unknown");

        if cluster_status == "red" {
            return Err(BackendError::Unavailable {
                backend_name: BACKEND_NAME.to_string(),
                message: format!("Cluster status is red: {:?}", body),
            }
            .into());
        }

        Ok(())
    }
}

/// Maps a `_bulk` response onto the submitted items, preserving their order.
///
/// Items the response does not account for are reported as failed.
pub(crate) fn parse_bulk_response(items: &[BulkItem], body: &Value) -> BulkResult {
    let results = body
        .get("items")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();

    let outcomes = items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let Some(result) = results.get(i).and_then(|r| r.get("create")) else {
                return BulkItemOutcome::failed(
                    &item.id,
                    500,
                    "missing_item",
                    "bulk response has no entry for this document",
                );
            };

            let id = result
                .get("_id")
                .and_then(Value::as_str)
                .unwrap_or(item.id.as_str());
            let status = result
                .get("status")
                .and_then(Value::as_u64)
                .and_then(|s| u16::try_from(s).ok())
                .unwrap_or(500);

            match result.get("error") {
                Some(error) => {
                    let error_type = error
                        .get("type")
                        .and_then(Value::as_str)
                        .unwrap_or("unknown");
                    let reason = error
                        .get("reason")
                        .and_then(Value::as_str)
                        .unwrap_or_default();
                    BulkItemOutcome::failed(id, status, error_type, reason)
                }
                None => {
                    let mut outcome = BulkItemOutcome::created(id);
                    outcome.status = status;
                    outcome
                }
            }
        })
        .collect();

    BulkResult::from_items(outcomes)
}
