//! Elasticsearch integration tests.
//!
//! These run the gateway against a real Elasticsearch node started with
//! testcontainers, so they require Docker.
//!
//! Run with:
//!   cargo test -p helios-search-gateway --features elasticsearch -- es_integration
//!
//! Skip if no Docker:
//!   cargo test -p helios-search-gateway --features elasticsearch -- --skip es_integration

#![cfg(feature = "elasticsearch")]

mod es_integration {
    use std::sync::Arc;

    use serde_json::{Value, json};
    use testcontainers::ImageExt;
    use testcontainers::runners::AsyncRunner;
    use testcontainers_modules::elastic_search::ElasticSearch;
    use tokio::sync::OnceCell;

    use helios_search_gateway::engine::elasticsearch::{ElasticsearchConfig, ElasticsearchEngine};
    use helios_search_gateway::error::{BackendError, GatewayError};
    use helios_search_gateway::registry::{BLOG_INDEX, blog_index, sample_documents};
    use helios_search_gateway::{
        Document, IndexRegistry, QueryRequest, SearchEngine, SearchGateway, SortDirection,
        WriteOutcome,
    };

    /// Shared Elasticsearch container reused across all tests in this module.
    struct SharedEs {
        url: String,
        /// Kept alive for the duration of the test binary; dropped at process exit.
        _container: testcontainers::ContainerAsync<ElasticSearch>,
    }

    static SHARED_ES: OnceCell<SharedEs> = OnceCell::const_new();

    async fn shared_es() -> &'static SharedEs {
        SHARED_ES
            .get_or_init(|| async {
                let container = ElasticSearch::default()
                    .with_env_var("ES_JAVA_OPTS", "-Xms256m -Xmx256m")
                    .with_startup_timeout(std::time::Duration::from_secs(120))
                    .start()
                    .await
                    .expect("Failed to start Elasticsearch container");

                let port = container
                    .get_host_port_ipv4(9200)
                    .await
                    .expect("Failed to get host port");

                let host = container
                    .get_host()
                    .await
                    .expect("Failed to get host")
                    .to_string();

                SharedEs {
                    url: format!("http://{}:{}", host, port),
                    _container: container,
                }
            })
            .await
    }

    /// Opens a gateway on a fresh index configured like the blog index.
    ///
    /// Each call uses a unique index name so tests are isolated without
    /// separate containers.
    async fn create_gateway() -> (Arc<ElasticsearchEngine>, SearchGateway) {
        let es = shared_es().await;
        let engine = Arc::new(
            ElasticsearchEngine::new(ElasticsearchConfig::with_host(es.url.clone()))
                .expect("Failed to create ElasticsearchEngine"),
        );

        let index = format!("blog-{}", uuid::Uuid::new_v4().simple());
        let mut config = blog_index();
        config.index_name = index.clone();
        let registry = Arc::new(IndexRegistry::new().with_index(config));

        let gateway = SearchGateway::open(engine.clone(), registry, index, None)
            .await
            .expect("Failed to open gateway");
        (engine, gateway)
    }

    async fn seeded_gateway() -> (Arc<ElasticsearchEngine>, SearchGateway) {
        let (engine, gateway) = create_gateway().await;
        let result = gateway
            .bulk_create(sample_documents())
            .await
            .expect("Failed to seed samples");
        assert_eq!(result.successful, 5, "bulk failures: {:?}", result.items);
        gateway.refresh().await.expect("Failed to refresh");
        (engine, gateway)
    }

    fn doc(value: Value) -> Document {
        value.as_object().cloned().expect("document must be an object")
    }

    fn keys(items: &[Document]) -> Vec<u64> {
        items.iter().filter_map(|d| d["key"].as_u64()).collect()
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    #[tokio::test]
    async fn es_integration_health() {
        let (engine, _gateway) = create_gateway().await;
        engine.health_check().await.unwrap();
    }

    #[tokio::test]
    async fn es_integration_open_twice() {
        let (engine, gateway) = seeded_gateway().await;
        let registry = Arc::new(IndexRegistry::new());
        let again = SearchGateway::open(engine, registry, gateway.index(), None)
            .await
            .expect("second open succeeds");
        assert_eq!(again.get("1").await.unwrap(), gateway.get("1").await.unwrap());
    }

    // ========================================================================
    // CRUD
    // ========================================================================

    #[tokio::test]
    async fn es_integration_crud_roundtrip() {
        let (_engine, gateway) = create_gateway().await;

        let created = gateway
            .add(doc(json!({"key": 10, "title": "Blog 10", "source": {"name": "Google", "id": 1}})))
            .await
            .unwrap();
        assert_eq!(created.id, "10");
        assert_eq!(created.result, WriteOutcome::Created);

        let conflict = gateway.add(doc(json!({"key": 10}))).await.unwrap_err();
        assert!(conflict.is_conflict());

        let updated = gateway
            .update("10", doc(json!({"source": {"name": "Alphabet"}})))
            .await
            .unwrap();
        assert_eq!(updated.result, WriteOutcome::Updated);

        let stored = gateway.get("10").await.unwrap().unwrap();
        assert_eq!(stored["source"], json!({"name": "Alphabet", "id": 1}));

        gateway.delete("10").await.unwrap();
        assert!(gateway.get("10").await.unwrap().is_none());
        assert!(gateway.delete("10").await.unwrap_err().is_not_found());
        assert!(
            gateway
                .update("10", doc(json!({"title": "gone"})))
                .await
                .unwrap_err()
                .is_not_found()
        );
    }

    #[tokio::test]
    async fn es_integration_add_without_key() {
        let (_engine, gateway) = create_gateway().await;
        let created = gateway.add(doc(json!({"title": "no key"}))).await.unwrap();
        assert!(uuid::Uuid::parse_str(&created.id).is_ok());
        assert!(gateway.get(&created.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn es_integration_bulk_partial_failure() {
        let (_engine, gateway) = seeded_gateway().await;
        let result = gateway
            .bulk_create(vec![doc(json!({"key": 6})), doc(json!({"key": 1}))])
            .await
            .unwrap();
        assert_eq!(result.successful, 1);
        assert_eq!(result.items[1].id, "1");
        assert_eq!(result.items[1].status, 409);
    }

    // ========================================================================
    // Query
    // ========================================================================

    #[tokio::test]
    async fn es_integration_pagination() {
        let (_engine, gateway) = seeded_gateway().await;

        let first = gateway
            .query(&QueryRequest::new().with_page(1, 2).with_sort("key", SortDirection::Ascending))
            .await
            .unwrap();
        assert_eq!(keys(&first.items), vec![1, 2]);
        assert_eq!(first.total_count, 5);
        assert_eq!(first.previous_page, None);
        assert_eq!(first.next_page, Some(2));

        let last = gateway
            .query(&QueryRequest::new().with_page(3, 2).with_sort("key", SortDirection::Ascending))
            .await
            .unwrap();
        assert_eq!(keys(&last.items), vec![5]);
        assert_eq!(last.next_page, None);
    }

    #[tokio::test]
    async fn es_integration_sort_descending_by_default() {
        let (_engine, gateway) = seeded_gateway().await;
        let mut request = QueryRequest::new();
        request.sort_alias = Some("key".to_string());
        let result = gateway.query(&request).await.unwrap();
        assert_eq!(keys(&result.items), vec![5, 4, 3, 2, 1]);
    }

    #[tokio::test]
    async fn es_integration_search_prefix() {
        let (_engine, gateway) = seeded_gateway().await;
        gateway
            .add(doc(json!({"key": 6, "title": "Cloud Run", "source": {"name": "Google", "id": 1}})))
            .await
            .unwrap();
        gateway.refresh().await.unwrap();

        let result = gateway
            .query(&QueryRequest::new().with_search("cloud"))
            .await
            .unwrap();
        assert_eq!(keys(&result.items), vec![6]);

        let filtered = gateway
            .query(
                &QueryRequest::new()
                    .with_filter(json!({"term": {"source.id": 2}}))
                    .with_search("amaz")
                    .with_sort("key", SortDirection::Ascending),
            )
            .await
            .unwrap();
        assert_eq!(keys(&filtered.items), vec![2, 4]);
    }

    #[tokio::test]
    async fn es_integration_search_mixed_case_term() {
        let (_engine, gateway) = seeded_gateway().await;
        let google = gateway
            .query(
                &QueryRequest::new()
                    .with_search("GOOG")
                    .with_sort("key", SortDirection::Ascending),
            )
            .await
            .unwrap();
        assert_eq!(keys(&google.items), vec![1, 3, 5]);

        let titles = gateway
            .query(&QueryRequest::new().with_search("Blo"))
            .await
            .unwrap();
        assert_eq!(titles.total_count, 5);
    }

    #[tokio::test]
    async fn es_integration_malformed_filter() {
        let (_engine, gateway) = seeded_gateway().await;
        let err = gateway
            .query(&QueryRequest::new().with_filter(json!({"no_such_query": {}})))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            GatewayError::Backend(BackendError::QueryError { .. })
        ));
    }

    #[tokio::test]
    async fn es_integration_blog_index_name() {
        let (engine, _gateway) = create_gateway().await;
        let registry = Arc::new(IndexRegistry::builtin());
        let gateway = SearchGateway::open(engine, registry, BLOG_INDEX, None)
            .await
            .unwrap();
        assert_eq!(gateway.config().searchable_fields.len(), 2);
    }
}
