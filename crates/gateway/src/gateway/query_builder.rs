//! Search request body construction.
//!
//! Translates a [`QueryRequest`] into an Elasticsearch search body, resolving
//! sort aliases and searchable fields through the index configuration.

use serde_json::{Value, json};

use crate::registry::IndexConfiguration;
use crate::types::QueryRequest;

/// Builds search bodies for one index.
#[derive(Debug, Clone, Copy)]
pub(crate) struct QueryBuilder<'a> {
    config: &'a IndexConfiguration,
}

impl<'a> QueryBuilder<'a> {
    pub(crate) fn new(config: &'a IndexConfiguration) -> Self {
        Self { config }
    }

    /// Builds the complete search body for `request`.
    pub(crate) fn build(&self, request: &QueryRequest) -> Value {
        let base = request
            .filter
            .clone()
            .unwrap_or_else(|| json!({ "match_all": {} }));

        let query = match self.build_search_clause(request.search_term.as_deref()) {
            Some(search) => json!({ "bool": { "must": [base, search] } }),
            None => base,
        };

        let mut body = json!({ "query": query });

        if let Some((from, size)) = request.window() {
            body["from"] = json!(from);
            body["size"] = json!(size);
        }

        if let Some(sort) = self.build_sort(request) {
            body["sort"] = sort;
        }

        body["track_total_hits"] = json!(true);
        body
    }

    /// Resolves the sort alias; unknown aliases mean no sort.
    fn build_sort(&self, request: &QueryRequest) -> Option<Value> {
        let alias = request.sort_alias.as_deref()?;
        let field = self.config.sort_field(alias)?;
        Some(json!([{ field: { "order": request.sort_direction.as_str() } }]))
    }

    /// Prefix match of `term` on any searchable field.
    fn build_search_clause(&self, term: Option<&str>) -> Option<Value> {
        let term = term.map(str::trim).filter(|t| !t.is_empty())?;
        if !self.config.supports_search() {
            return None;
        }

        let pattern = format!("{}*", term);
        let should: Vec<Value> = self
            .config
            .searchable_fields
            .iter()
            .map(|field| {
                json!({ "wildcard": { field: { "value": pattern, "case_insensitive": true } } })
            })
            .collect();

        Some(json!({
            "bool": {
                "should": should,
                "minimum_should_match": 1
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::blog_index;
    use crate::types::SortDirection;

    #[test]
    fn test_default_request() {
        let config = blog_index();
        let body = QueryBuilder::new(&config).build(&QueryRequest::new());
        assert_eq!(
            body,
            json!({
                "query": { "match_all": {} },
                "from": 0,
                "size": 10,
                "track_total_hits": true
            })
        );
    }

    #[test]
    fn test_pagination_is_offset_limit() {
        let config = blog_index();
        let body = QueryBuilder::new(&config).build(&QueryRequest::new().with_page(3, 2));
        assert_eq!(body["from"], 4);
        assert_eq!(body["size"], 2);
    }

    #[test]
    fn test_unpaginated_omits_window() {
        let config = blog_index();
        let builder = QueryBuilder::new(&config);
        let body = builder.build(&QueryRequest::new().unpaginated());
        assert!(body.get("from").is_none());
        assert!(body.get("size").is_none());

        let body = builder.build(&QueryRequest::new().with_page(0, 10));
        assert!(body.get("from").is_none());
    }

    #[test]
    fn test_sort_resolution() {
        let config = blog_index();
        let builder = QueryBuilder::new(&config);

        let body = builder.build(&QueryRequest::new().with_sort("key", SortDirection::Ascending));
        assert_eq!(body["sort"], json!([{ "key": { "order": "asc" } }]));

        let mut request = QueryRequest::new();
        request.sort_alias = Some("key".to_string());
        assert_eq!(
            builder.build(&request)["sort"],
            json!([{ "key": { "order": "desc" } }])
        );

        let body = builder.build(&QueryRequest::new().with_sort("rating", SortDirection::Ascending));
        assert!(body.get("sort").is_none());
    }

    #[test]
    fn test_search_composition() {
        let config = blog_index();
        let filter = json!({ "term": { "is_active": true } });
        let request = QueryRequest::new()
            .with_filter(filter.clone())
            .with_search("  cloud ");
        let body = QueryBuilder::new(&config).build(&request);

        assert_eq!(
            body["query"],
            json!({
                "bool": {
                    "must": [
                        filter,
                        {
                            "bool": {
                                "should": [
                                    {
                                        "wildcard": {
                                            "source.name": { "value": "cloud*", "case_insensitive": true }
                                        }
                                    },
                                    {
                                        "wildcard": {
                                            "title": { "value": "cloud*", "case_insensitive": true }
                                        }
                                    }
                                ],
                                "minimum_should_match": 1
                            }
                        }
                    ]
                }
            })
        );
    }

    #[test]
    fn test_search_pattern_keeps_case() {
        let config = blog_index();
        let body = QueryBuilder::new(&config).build(&QueryRequest::new().with_search("GOOG"));
        let clause = &body["query"]["bool"]["must"][1]["bool"]["should"][0]["wildcard"];
        assert_eq!(clause["source.name"]["value"], "GOOG*");
        assert_eq!(clause["source.name"]["case_insensitive"], true);
    }

    #[test]
    fn test_search_ignored_without_searchable_fields() {
        let config = IndexConfiguration::new("plain");
        let body = QueryBuilder::new(&config).build(&QueryRequest::new().with_search("cloud"));
        assert_eq!(body["query"], json!({ "match_all": {} }));
    }

    #[test]
    fn test_blank_search_term_ignored() {
        let config = blog_index();
        let body = QueryBuilder::new(&config).build(&QueryRequest::new().with_search("   "));
        assert_eq!(body["query"], json!({ "match_all": {} }));
    }
}
