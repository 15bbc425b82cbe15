//! Bulk write input and per-item outcomes.

use serde::{Deserialize, Serialize};

use super::document::Document;

/// A document queued for a bulk create, with its resolved id.
#[derive(Debug, Clone, PartialEq)]
pub struct BulkItem {
    /// Backend document id.
    pub id: String,
    /// Document body.
    pub source: Document,
}

impl BulkItem {
    /// Creates a bulk item.
    pub fn new(id: impl Into<String>, source: Document) -> Self {
        Self {
            id: id.into(),
            source,
        }
    }
}

/// Why a single bulk item failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkItemError {
    /// Engine error type (e.g. `version_conflict_engine_exception`).
    #[serde(rename = "type")]
    pub error_type: String,
    /// Human-readable reason.
    #[serde(default)]
    pub reason: String,
}

/// Outcome of one document in a bulk request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkItemOutcome {
    /// Backend document id.
    pub id: String,
    /// HTTP-style status for this item.
    pub status: u16,
    /// Failure details; `None` on success.
    #[serde(default)]
    pub error: Option<BulkItemError>,
}

impl BulkItemOutcome {
    /// A successful create.
    pub fn created(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            status: 201,
            error: None,
        }
    }

    /// A failed item.
    pub fn failed(
        id: impl Into<String>,
        status: u16,
        error_type: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            status,
            error: Some(BulkItemError {
                error_type: error_type.into(),
                reason: reason.into(),
            }),
        }
    }

    /// Returns true if the item was written.
    pub fn is_success(&self) -> bool {
        self.error.is_none() && (200..300).contains(&self.status)
    }
}

/// Result of a bulk create, one outcome per submitted document in submission order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BulkResult {
    /// Number of documents written.
    pub successful: usize,
    /// Number of documents rejected.
    pub failed: usize,
    /// Per-document outcomes.
    pub items: Vec<BulkItemOutcome>,
}

impl BulkResult {
    /// Builds a result from per-item outcomes, deriving the counts.
    pub fn from_items(items: Vec<BulkItemOutcome>) -> Self {
        let successful = items.iter().filter(|item| item.is_success()).count();
        Self {
            successful,
            failed: items.len() - successful,
            items,
        }
    }

    /// Returns true if some items failed.
    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }

    /// Iterates over the failed items.
    pub fn failures(&self) -> impl Iterator<Item = &BulkItemOutcome> {
        self.items.iter().filter(|item| !item.is_success())
    }
}
