//! Error types for the search gateway.
//!
//! Errors are grouped by category: document state, index lifecycle, document
//! validation and backend failures. [`GatewayError`] aggregates all of them so
//! callers can match on the category they care about and propagate the rest.

// Error enum variant fields are self-documenting via their #[error(...)] messages
#![allow(missing_docs)]

use thiserror::Error;

/// The primary error type for all gateway operations.
#[derive(Error, Debug)]
pub enum GatewayError {
    /// Document state errors
    #[error(transparent)]
    Document(#[from] DocumentError),

    /// Index lifecycle errors
    #[error(transparent)]
    Index(#[from] IndexError),

    /// Document shape errors
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Backend-specific errors
    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Errors related to the state of a single document.
#[derive(Error, Debug)]
pub enum DocumentError {
    /// The document does not exist.
    #[error("document not found: {index}/{id}")]
    NotFound { index: String, id: String },

    /// A document with this id already exists (create is not an upsert).
    #[error("document already exists: {index}/{id}")]
    AlreadyExists { index: String, id: String },

    /// Deleting the document failed for a reason other than absence.
    #[error("failed to delete document {index}/{id}")]
    DeleteFailed {
        index: String,
        id: String,
        #[source]
        source: Box<GatewayError>,
    },
}

/// Errors related to index lifecycle.
#[derive(Error, Debug)]
pub enum IndexError {
    /// The backend rejected the index definition or failed to create it.
    #[error("failed to create index {index}: {message}")]
    CreationFailed { index: String, message: String },
}

/// A document field is incompatible with the index mapping.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// The value of a mapped field cannot be coerced to the mapped type.
    #[error("field '{field}' expects {expected}, found {found}")]
    IncompatibleField {
        field: String,
        expected: String,
        found: String,
    },
}

/// Errors originating from the search engine backend.
#[derive(Error, Debug)]
pub enum BackendError {
    /// The backend is currently unavailable.
    #[error("backend unavailable: {backend_name}: {message}")]
    Unavailable {
        backend_name: String,
        message: String,
    },

    /// Connection to the backend failed or was never configured.
    #[error("connection failed to {backend_name}: {message}")]
    ConnectionFailed {
        backend_name: String,
        message: String,
    },

    /// Internal backend error.
    #[error("internal error in {backend_name}: {message}")]
    Internal {
        backend_name: String,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The backend rejected or failed to execute a query.
    #[error("query execution failed: {message}")]
    QueryError { message: String },

    /// Serialization/deserialization error.
    #[error("serialization error: {message}")]
    SerializationError { message: String },
}

/// Result type alias for gateway operations.
pub type GatewayResult<T> = Result<T, GatewayError>;

impl GatewayError {
    /// Returns true if this error reports a missing document.
    pub fn is_not_found(&self) -> bool {
        matches!(self, GatewayError::Document(DocumentError::NotFound { .. }))
    }

    /// Returns true if this error reports a create against an existing id.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            GatewayError::Document(DocumentError::AlreadyExists { .. })
        )
    }
}

impl From<serde_json::Error> for GatewayError {
    fn from(err: serde_json::Error) -> Self {
        GatewayError::Backend(BackendError::SerializationError {
            message: err.to_string(),
        })
    }
}
