//! Command-line configuration for the seed tool.

use clap::Parser;
use helios_search_gateway::registry::BLOG_INDEX;

/// Creates a search index and loads the sample blog documents into it.
#[derive(Debug, Clone, Parser)]
#[command(name = "search-seed")]
#[command(about = "Create the blog index and load its sample documents")]
pub struct SeedConfig {
    /// Elasticsearch node URL.
    #[arg(long, env = "ES_HOST")]
    pub es_host: Option<String>,

    /// Basic-auth username.
    #[arg(long, env = "ES_USERNAME")]
    pub es_username: Option<String>,

    /// Basic-auth password.
    #[arg(long, env = "ES_PASSWORD", hide_env_values = true)]
    pub es_password: Option<String>,

    /// Request timeout in milliseconds.
    #[arg(long, env = "ES_REQUEST_TIMEOUT_MS", default_value = "30000")]
    pub request_timeout_ms: u64,

    /// Index to create and seed.
    #[arg(long, env = "SEED_INDEX", default_value = BLOG_INDEX)]
    pub index: String,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long, env = "SEED_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Validate and load the documents into an in-memory engine instead.
    #[arg(long)]
    pub dry_run: bool,
}
