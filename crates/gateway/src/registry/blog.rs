//! The built-in `blog-index` definition and its sample documents.
//!
//! The settings declare an ngram `autocomplete` analyzer (3 to 20 characters,
//! letters and digits). Text fields keep the standard analyzer; prefix search
//! goes through wildcard queries.

use serde_json::{Value, json};

use crate::types::Document;

use super::config::{IndexConfiguration, text_with_keyword};

/// Name of the blog index.
pub const BLOG_INDEX: &str = "blog-index";

/// Returns the configuration of the blog index.
pub fn blog_index() -> IndexConfiguration {
    IndexConfiguration::new(BLOG_INDEX)
        .with_sort_field("key", "key")
        .with_searchable_field("title")
        .with_searchable_field("source.name")
        .with_settings(blog_settings())
        .with_mappings(blog_mappings())
}

fn blog_settings() -> Value {
    let ngram = json!({
        "type": "ngram",
        "min_gram": 3,
        "max_gram": 20,
        "token_chars": ["letter", "digit"]
    });

    json!({
        "index": { "max_ngram_diff": 20 },
        "analysis": {
            "filter": {
                "autocomplete_filter": ngram.clone()
            },
            "analyzer": {
                "autocomplete": {
                    "type": "custom",
                    "tokenizer": "autocomplete",
                    "filter": ["lowercase", "autocomplete_filter"]
                },
                "autocomplete_search": {
                    "tokenizer": "standard",
                    "filter": ["lowercase"]
                }
            },
            "tokenizer": {
                "autocomplete": ngram
            }
        }
    })
}

fn blog_mappings() -> Value {
    json!({
        "properties": {
            "created_at": { "type": "date" },
            "modified_at": { "type": "date" },
            "is_active": { "type": "boolean" },
            "is_deleted": { "type": "boolean" },
            "key": { "type": "long" },
            "title": text_with_keyword(Some(256)),
            "description": text_with_keyword(None),
            "source": {
                "properties": {
                    "name": text_with_keyword(Some(256)),
                    "id": { "type": "long" }
                }
            },
            "url": text_with_keyword(None),
            "rating": { "type": "text" }
        }
    })
}

/// Sample blog documents, keys 1 to 5.
pub fn sample_documents() -> Vec<Document> {
    vec![
        sample(
            1,
            ("2021-04-01", "2021-04-02"),
            ("Google", 1),
            "http://google.com/1",
            "Google AI solves rare calculus problems in record time",
            5,
        ),
        sample(
            2,
            ("2021-04-04", "2021-04-04"),
            ("Amazon", 2),
            "http://amazon.com/1",
            "AWS lambda invocation using triggers",
            4,
        ),
        sample(
            3,
            ("2021-04-02", "2021-04-02"),
            ("Google", 1),
            "http://google.com/2",
            "Firebase SDK introduces new features for mobile testing",
            5,
        ),
        sample(
            4,
            ("2021-04-03", "2021-04-04"),
            ("Amazon", 2),
            "http://amazon.com/2",
            "Cloud functions now supports PHP for written procedures",
            4,
        ),
        sample(
            5,
            ("2021-04-01", "2021-04-01"),
            ("Google", 1),
            "http://google.com/3",
            "Mobile API have more stabilization for maps and navigation",
            3,
        ),
    ]
}

fn sample(
    key: u64,
    (created_at, modified_at): (&str, &str),
    (source_name, source_id): (&str, u64),
    url: &str,
    description: &str,
    rating: u8,
) -> Document {
    let mut doc = Document::new();
    doc.insert("key".to_string(), json!(key));
    doc.insert("title".to_string(), json!(format!("Blog {}", key)));
    doc.insert("created_at".to_string(), json!(created_at));
    doc.insert("modified_at".to_string(), json!(modified_at));
    doc.insert("is_active".to_string(), json!(true));
    doc.insert("is_deleted".to_string(), json!(false));
    doc.insert(
        "source".to_string(),
        json!({ "name": source_name, "id": source_id }),
    );
    doc.insert("url".to_string(), json!(url));
    doc.insert("description".to_string(), json!(description));
    doc.insert("rating".to_string(), json!(rating));
    doc
}
