//! Search index seed tool.
//!
//! Creates the configured index (idempotently) and bulk-loads the sample blog
//! documents, reporting every document the engine rejected.

mod config;

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use helios_search_gateway::engine::memory::InMemoryEngine;
use helios_search_gateway::registry::sample_documents;
use helios_search_gateway::{IndexRegistry, SearchEngine, SearchGateway};
use tracing::{info, warn};

use config::SeedConfig;

fn init_logging(level: &str) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "search_seed={level},helios_search_gateway={level},elasticsearch=warn"
        ))
    });

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();
}

#[cfg(feature = "elasticsearch")]
fn elasticsearch_engine(config: &SeedConfig) -> anyhow::Result<Arc<dyn SearchEngine>> {
    use helios_search_gateway::engine::elasticsearch::{
        ElasticsearchAuth, ElasticsearchConfig, ElasticsearchEngine,
    };

    if config.es_host.is_none() {
        warn!("ES_HOST variable not set");
    }

    let auth = match (&config.es_username, &config.es_password) {
        (Some(username), Some(password)) => Some(ElasticsearchAuth::Basic {
            username: username.clone(),
            password: password.clone(),
        }),
        _ => None,
    };

    let es_config = ElasticsearchConfig {
        host: config.es_host.clone(),
        request_timeout_ms: config.request_timeout_ms,
        auth,
        ..Default::default()
    };

    let engine = ElasticsearchEngine::new(es_config)
        .context("Invalid Elasticsearch configuration")?;
    Ok(Arc::new(engine))
}

#[cfg(not(feature = "elasticsearch"))]
fn elasticsearch_engine(_config: &SeedConfig) -> anyhow::Result<Arc<dyn SearchEngine>> {
    anyhow::bail!("built without the `elasticsearch` feature; use --dry-run")
}

fn build_engine(config: &SeedConfig) -> anyhow::Result<Arc<dyn SearchEngine>> {
    if config.dry_run {
        info!("Dry run: loading into an in-memory engine");
        return Ok(Arc::new(InMemoryEngine::new()));
    }
    elasticsearch_engine(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = SeedConfig::parse();
    init_logging(&config.log_level);

    let engine = build_engine(&config)?;
    engine
        .health_check()
        .await
        .with_context(|| format!("{} engine is not healthy", engine.name()))?;

    let gateway = SearchGateway::open(
        engine,
        Arc::new(IndexRegistry::builtin()),
        config.index.clone(),
        None,
    )
    .await
    .with_context(|| format!("Failed to open index {}", config.index))?;

    let result = gateway
        .bulk_create(sample_documents())
        .await
        .context("Bulk load failed")?;

    for failure in result.failures() {
        let (error_type, reason) = failure
            .error
            .as_ref()
            .map(|e| (e.error_type.as_str(), e.reason.as_str()))
            .unwrap_or(("unknown", ""));
        warn!(
            id = %failure.id,
            status = failure.status,
            error_type,
            reason,
            "Document rejected"
        );
    }

    gateway.refresh().await.context("Refresh failed")?;

    info!(
        index = %gateway.index(),
        successful = result.successful,
        failed = result.failed,
        "Seeding complete"
    );
    Ok(())
}
