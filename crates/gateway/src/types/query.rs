//! Query request and result envelope types.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::document::Document;

/// Default 1-based page number.
pub const DEFAULT_PAGE: u32 = 1;

/// Default number of documents per page.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Sort direction for an ordering request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SortDirection {
    /// Ascending order.
    #[serde(rename = "asc")]
    Ascending,
    /// Descending order.
    #[default]
    #[serde(rename = "desc")]
    Descending,
}

impl SortDirection {
    /// Returns the engine's name for this direction.
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Ascending => "asc",
            SortDirection::Descending => "desc",
        }
    }

    /// Parses the engine's `asc`/`desc` names, ignoring case.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Some(SortDirection::Ascending),
            "desc" => Some(SortDirection::Descending),
            _ => None,
        }
    }
}

/// High-level query parameters for a single gateway query.
///
/// With every optional field unset this describes an unfiltered, unsorted,
/// paginated listing of the whole index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryRequest {
    /// Structured query clause to start from; `None` matches everything.
    #[serde(default)]
    pub filter: Option<Value>,

    /// Whether to apply page/page_size.
    #[serde(default = "default_paginate")]
    pub paginate: bool,

    /// 1-based page number.
    #[serde(default = "default_page")]
    pub page: u32,

    /// Page size.
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Public sort alias, resolved through the index registry.
    #[serde(default)]
    pub sort_alias: Option<String>,

    /// Direction applied when the sort alias resolves.
    #[serde(default)]
    pub sort_direction: SortDirection,

    /// Free-text term matched as a prefix across searchable fields.
    #[serde(default)]
    pub search_term: Option<String>,
}

fn default_paginate() -> bool {
    true
}

fn default_page() -> u32 {
    DEFAULT_PAGE
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

impl Default for QueryRequest {
    fn default() -> Self {
        Self {
            filter: None,
            paginate: default_paginate(),
            page: default_page(),
            page_size: default_page_size(),
            sort_alias: None,
            sort_direction: SortDirection::default(),
            search_term: None,
        }
    }
}

impl QueryRequest {
    /// Creates a request for the first page with default size.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the base filter clause.
    pub fn with_filter(mut self, filter: Value) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Sets page and page size.
    pub fn with_page(mut self, page: u32, page_size: u32) -> Self {
        self.page = page;
        self.page_size = page_size;
        self
    }

    /// Disables pagination.
    pub fn unpaginated(mut self) -> Self {
        self.paginate = false;
        self
    }

    /// Sets the sort alias and direction.
    pub fn with_sort(mut self, alias: impl Into<String>, direction: SortDirection) -> Self {
        self.sort_alias = Some(alias.into());
        self.sort_direction = direction;
        self
    }

    /// Sets the free-text search term.
    pub fn with_search(mut self, term: impl Into<String>) -> Self {
        self.search_term = Some(term.into());
        self
    }

    /// Returns `(from, size)` when pagination applies to this request.
    pub fn window(&self) -> Option<(u64, u64)> {
        if !self.paginate || self.page == 0 || self.page_size == 0 {
            return None;
        }
        let size = u64::from(self.page_size);
        Some(((u64::from(self.page) - 1) * size, size))
    }
}

/// Normalized query response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    /// Total matching documents regardless of pagination.
    pub total_count: u64,

    /// Document bodies of the current page.
    pub items: Vec<Document>,

    /// Previous page number, if any.
    pub previous_page: Option<u32>,

    /// Next page number, if any.
    pub next_page: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let request = QueryRequest::default();
        assert!(request.paginate);
        assert_eq!(request.page, 1);
        assert_eq!(request.page_size, 10);
        assert_eq!(request.sort_direction, SortDirection::Descending);
        assert!(request.filter.is_none());
        assert!(request.search_term.is_none());
    }

    #[test]
    fn test_window_is_offset_and_limit() {
        assert_eq!(QueryRequest::new().with_page(1, 10).window(), Some((0, 10)));
        assert_eq!(QueryRequest::new().with_page(3, 2).window(), Some((4, 2)));
    }

    #[test]
    fn test_window_absent() {
        assert_eq!(QueryRequest::new().unpaginated().window(), None);
        assert_eq!(QueryRequest::new().with_page(0, 10).window(), None);
        assert_eq!(QueryRequest::new().with_page(2, 0).window(), None);
    }

    #[test]
    fn test_sort_direction_parse() {
        assert_eq!(SortDirection::parse("ASC"), Some(SortDirection::Ascending));
        assert_eq!(SortDirection::parse("desc"), Some(SortDirection::Descending));
        assert_eq!(SortDirection::parse("descending"), None);
        assert_eq!(SortDirection::parse("sideways"), None);
    }

    #[test]
    fn test_request_deserializes_with_defaults() {
        let request: QueryRequest =
            serde_json::from_value(json!({"search_term": "cloud", "sort_direction": "asc"}))
                .unwrap();
        assert_eq!(request.page, 1);
        assert_eq!(request.page_size, 10);
        assert_eq!(request.sort_direction, SortDirection::Ascending);
        assert_eq!(request.search_term.as_deref(), Some("cloud"));
    }
}
